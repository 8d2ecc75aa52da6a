use crate::bus::{Notification, NotificationSource};
use crate::models::Annotation;
use std::fmt::Display;
use std::future::Future;

/// Wait for the widget's create round trip and announce the persisted note.
///
/// `AnnotationFullyCreated` is published only after `round_trip` resolves successfully
/// with a record carrying a server id. Failures are not retried and publish nothing.
pub async fn complete_creation<N, B, F, E>(bus: &B, round_trip: F) -> Option<Annotation<N>>
where
    N: Clone,
    B: NotificationSource<N> + ?Sized,
    F: Future<Output = Result<Annotation<N>, E>>,
    E: Display,
{
    match round_trip.await {
        Ok(annotation) if !annotation.is_new() => {
            tracing::debug!("annotation {:?} persisted", annotation.id);
            bus.publish(Notification::AnnotationFullyCreated(annotation.clone()));
            Some(annotation)
        }
        Ok(_) => {
            tracing::debug!("create round trip returned no id");
            None
        }
        Err(e) => {
            tracing::debug!("create round trip failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{EventBus, NotificationKind};
    use crate::config::PluginOptions;
    use crate::events::{EventDeriver, MemoryLogger};
    use crate::models::NoteId;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use futures::FutureExt;
    use std::rc::Rc;

    fn setup() -> (Rc<EventBus<()>>, Rc<MemoryLogger>, EventDeriver<(), EventBus<()>>) {
        let bus = Rc::new(EventBus::new());
        let logger = Rc::new(MemoryLogger::new());
        let deriver = EventDeriver::new(Rc::clone(&bus), logger.clone(), PluginOptions::default());
        deriver.initialize();
        (bus, logger, deriver)
    }

    fn persisted(id: i64, text: &str) -> Annotation {
        Annotation {
            id: Some(NoteId::Int(id)),
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolved_create_emits_one_added_event() {
        let (bus, logger, _d) = setup();
        let (tx, rx) = oneshot::channel::<Result<Annotation, String>>();

        let mut pending = Box::pin(complete_creation(&*bus, async move {
            rx.await.unwrap_or_else(|_| Err("dropped".to_string()))
        }));
        assert!(pending.as_mut().now_or_never().is_none());
        assert!(logger.records().is_empty());

        tx.send(Ok(persisted(42, "hello"))).expect("receiver alive");
        let created = block_on(pending).expect("persisted");
        assert_eq!(created.id, Some(NoteId::Int(42)));

        let records = logger.take();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "edx.course.student_notes.added");
        assert_eq!(records[0].1["note_id"], 42);
        assert_eq!(records[0].1["note_text"], "hello");
    }

    #[test]
    fn test_unresolved_create_emits_nothing() {
        let (bus, logger, _d) = setup();
        let (_tx, rx) = oneshot::channel::<Result<Annotation, String>>();

        let pending = complete_creation(&*bus, async move {
            rx.await.unwrap_or_else(|_| Err("dropped".to_string()))
        });
        assert!(pending.now_or_never().is_none());
        assert!(logger.records().is_empty());
    }

    #[test]
    fn test_failed_create_is_silently_dropped() {
        let (bus, logger, _d) = setup();
        let result = block_on(complete_creation(&*bus, async {
            Err::<Annotation, _>("500 Internal Server Error")
        }));
        assert!(result.is_none());
        assert!(logger.records().is_empty());
    }

    #[test]
    fn test_record_without_id_is_not_announced() {
        let bus: EventBus<()> = EventBus::new();
        let seen = Rc::new(std::cell::Cell::new(0));
        let s = Rc::clone(&seen);
        bus.subscribe(
            NotificationKind::AnnotationFullyCreated,
            Rc::new(move |_: &Notification<()>| s.set(s.get() + 1)),
        );

        let result = block_on(complete_creation(&bus, async {
            Ok::<_, String>(Annotation::default())
        }));
        assert!(result.is_none());
        assert_eq!(seen.get(), 0);
    }
}
