use crate::models::Annotation;
use std::cell::RefCell;
use std::rc::Rc;
use strum::{AsRefStr, Display, EnumIter};

/// Lifecycle notifications published by the annotation widget.
///
/// The string forms are the widget's own event names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum NotificationKind {
    AnnotationViewerTextField,
    AnnotationsLoaded,
    AnnotationCreated,
    /// Fired only after the create round trip resolved with a server id.
    AnnotationFullyCreated,
    AnnotationUpdated,
    AnnotationDeleted,
    AnnotationViewerShown,
    AnnotationEditorShown,
    AnnotationEditorHidden,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Notification<N> {
    ViewerTextField {
        field: N,
        annotation: Annotation<N>,
    },
    AnnotationsLoaded(Vec<Annotation<N>>),
    /// Optimistic: published before the server has assigned an id.
    AnnotationCreated(Annotation<N>),
    AnnotationFullyCreated(Annotation<N>),
    AnnotationUpdated(Annotation<N>),
    AnnotationDeleted(Annotation<N>),
    ViewerShown(Vec<Annotation<N>>),
    EditorShown(Annotation<N>),
    EditorHidden,
}

impl<N> Notification<N> {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::ViewerTextField { .. } => NotificationKind::AnnotationViewerTextField,
            Notification::AnnotationsLoaded(_) => NotificationKind::AnnotationsLoaded,
            Notification::AnnotationCreated(_) => NotificationKind::AnnotationCreated,
            Notification::AnnotationFullyCreated(_) => NotificationKind::AnnotationFullyCreated,
            Notification::AnnotationUpdated(_) => NotificationKind::AnnotationUpdated,
            Notification::AnnotationDeleted(_) => NotificationKind::AnnotationDeleted,
            Notification::ViewerShown(_) => NotificationKind::AnnotationViewerShown,
            Notification::EditorShown(_) => NotificationKind::AnnotationEditorShown,
            Notification::EditorHidden => NotificationKind::AnnotationEditorHidden,
        }
    }
}

pub type Listener<N> = Rc<dyn Fn(&Notification<N>)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Publish/subscribe capability of the annotation widget.
pub trait NotificationSource<N> {
    fn subscribe(&self, kind: NotificationKind, listener: Listener<N>) -> SubscriptionId;

    /// Returns `false` when the subscription was already gone.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    fn publish(&self, notification: Notification<N>);
}

struct Subscription<N> {
    id: SubscriptionId,
    kind: NotificationKind,
    listener: Listener<N>,
}

struct BusInner<N> {
    next_id: u64,
    subscriptions: Vec<Subscription<N>>,
}

/// In-process notification bus.
///
/// Listeners run synchronously in subscription order. A listener may subscribe or
/// unsubscribe while a notification is being delivered; the change applies to the next
/// publish.
pub struct EventBus<N> {
    inner: Rc<RefCell<BusInner<N>>>,
}

impl<N> Clone for EventBus<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<N> Default for EventBus<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> EventBus<N> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusInner {
                next_id: 1,
                subscriptions: Vec::new(),
            })),
        }
    }

    pub fn listener_count(&self, kind: NotificationKind) -> usize {
        self.inner
            .borrow()
            .subscriptions
            .iter()
            .filter(|s| s.kind == kind)
            .count()
    }
}

impl<N> NotificationSource<N> for EventBus<N> {
    fn subscribe(&self, kind: NotificationKind, listener: Listener<N>) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscriptions.push(Subscription { id, kind, listener });
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.subscriptions.len();
        inner.subscriptions.retain(|s| s.id != id);
        inner.subscriptions.len() != before
    }

    fn publish(&self, notification: Notification<N>) {
        let kind = notification.kind();
        // Snapshot first: listeners are free to touch the bus.
        let listeners: Vec<Listener<N>> = self
            .inner
            .borrow()
            .subscriptions
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| Rc::clone(&s.listener))
            .collect();

        tracing::trace!("publishing {} to {} listener(s)", kind, listeners.len());
        for listener in listeners {
            listener(&notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_kind_names_match_widget_events() {
        assert_eq!(NotificationKind::AnnotationsLoaded.as_ref(), "annotationsLoaded");
        assert_eq!(
            NotificationKind::AnnotationViewerTextField.to_string(),
            "annotationViewerTextField"
        );
        assert_eq!(
            NotificationKind::AnnotationEditorHidden.as_ref(),
            "annotationEditorHidden"
        );
    }

    #[test]
    fn test_publish_reaches_only_matching_kind() {
        let bus: EventBus<()> = EventBus::new();
        let hits = Rc::new(Cell::new(0));

        let h = Rc::clone(&hits);
        bus.subscribe(
            NotificationKind::AnnotationEditorHidden,
            Rc::new(move |_: &Notification<()>| h.set(h.get() + 1)),
        );

        bus.publish(Notification::EditorHidden);
        bus.publish(Notification::AnnotationsLoaded(vec![]));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_unsubscribe_twice_is_harmless() {
        let bus: EventBus<()> = EventBus::new();
        let id = bus.subscribe(
            NotificationKind::AnnotationEditorHidden,
            Rc::new(|_: &Notification<()>| {}),
        );
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.listener_count(NotificationKind::AnnotationEditorHidden), 0);
    }

    #[test]
    fn test_listener_may_subscribe_during_publish() {
        let bus: EventBus<()> = EventBus::new();
        let inner_hits = Rc::new(Cell::new(0));

        let bus2 = bus.clone();
        let hits = Rc::clone(&inner_hits);
        bus.subscribe(
            NotificationKind::AnnotationEditorHidden,
            Rc::new(move |_: &Notification<()>| {
                let hits = Rc::clone(&hits);
                bus2.subscribe(
                    NotificationKind::AnnotationEditorHidden,
                    Rc::new(move |_: &Notification<()>| hits.set(hits.get() + 1)),
                );
            }),
        );

        bus.publish(Notification::EditorHidden);
        assert_eq!(inner_hits.get(), 0);
        bus.publish(Notification::EditorHidden);
        assert_eq!(inner_hits.get(), 1);
    }
}
