//! Analytics records for note views, additions, edits and deletions.

pub mod logger;

pub use logger::{Logger, MemoryLogger, NoteEvent, TracingLogger};

use crate::bus::{Notification, NotificationKind, NotificationSource, SubscriptionId};
use crate::config::PluginOptions;
use crate::models::Annotation;
use serde_json::{json, Map, Value};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

/// Cut `text` down to `limit` characters.
///
/// Returns the (possibly shortened) text and whether anything was cut. A `None` limit
/// leaves the text alone.
///
/// The limit counts Unicode scalar values, so a cut never splits a character. This is
/// deliberately looser than a JS `length` limit, which counts UTF-16 code units: text
/// outside the Basic Multilingual Plane is cut later than a JS widget would cut it.
pub fn truncate(text: &str, limit: Option<usize>) -> (String, bool) {
    match limit {
        Some(limit) if text.chars().count() > limit => (text.chars().take(limit).collect(), true),
        _ => (text.to_string(), false),
    }
}

fn insert_text(
    data: &mut Map<String, Value>,
    field: &str,
    text: Option<&str>,
    limit: Option<usize>,
) {
    let (value, truncated) = match text {
        Some(t) => {
            let (t, truncated) = truncate(t, limit);
            (Value::String(t), truncated)
        }
        None => (Value::Null, false),
    };
    data.insert(field.to_string(), value);
    data.insert(format!("{field}_truncated"), Value::Bool(truncated));
}

struct DeriverInner<N, B> {
    bus: Rc<B>,
    logger: Rc<dyn Logger>,
    options: PluginOptions,
    /// Note text as it was when the editor opened.
    old_note_text: RefCell<Option<String>>,
    subscriptions: RefCell<Vec<SubscriptionId>>,
    _node: PhantomData<fn(N)>,
}

/// Turns widget lifecycle notifications into analytics records.
pub struct EventDeriver<N, B> {
    inner: Rc<DeriverInner<N, B>>,
}

impl<N, B> Clone for EventDeriver<N, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<N: 'static, B: NotificationSource<N> + 'static> EventDeriver<N, B> {
    pub fn new(bus: Rc<B>, logger: Rc<dyn Logger>, options: PluginOptions) -> Self {
        Self {
            inner: Rc::new(DeriverInner {
                bus,
                logger,
                options,
                old_note_text: RefCell::new(None),
                subscriptions: RefCell::new(Vec::new()),
                _node: PhantomData,
            }),
        }
    }

    pub fn old_note_text(&self) -> Option<String> {
        self.inner.old_note_text.borrow().clone()
    }

    pub fn is_initialized(&self) -> bool {
        !self.inner.subscriptions.borrow().is_empty()
    }

    fn from_weak(weak: &Weak<DeriverInner<N, B>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub fn initialize(&self) {
        if self.is_initialized() {
            return;
        }

        let kinds = [
            NotificationKind::AnnotationViewerShown,
            NotificationKind::AnnotationFullyCreated,
            NotificationKind::AnnotationEditorShown,
            NotificationKind::AnnotationEditorHidden,
            NotificationKind::AnnotationUpdated,
            NotificationKind::AnnotationDeleted,
        ];

        let subscriptions: Vec<SubscriptionId> = kinds
            .into_iter()
            .map(|kind| {
                let weak = Rc::downgrade(&self.inner);
                self.inner.bus.subscribe(
                    kind,
                    Rc::new(move |n: &Notification<N>| {
                        if let Some(d) = Self::from_weak(&weak) {
                            d.dispatch(n);
                        }
                    }),
                )
            })
            .collect();

        *self.inner.subscriptions.borrow_mut() = subscriptions;
        tracing::debug!("event deriver initialized");
    }

    pub fn teardown(&self) {
        let subscriptions = std::mem::take(&mut *self.inner.subscriptions.borrow_mut());
        for id in subscriptions {
            self.inner.bus.unsubscribe(id);
        }
        self.inner.old_note_text.borrow_mut().take();
    }

    fn dispatch(&self, notification: &Notification<N>) {
        match notification {
            Notification::ViewerShown(annotations) => self.on_viewer_shown(annotations),
            Notification::AnnotationFullyCreated(a) => self.on_fully_created(a),
            Notification::EditorShown(a) => self.on_editor_shown(a),
            Notification::EditorHidden => self.on_editor_hidden(),
            Notification::AnnotationUpdated(a) => self.on_updated(a),
            Notification::AnnotationDeleted(a) => self.on_deleted(a),
            _ => {}
        }
    }

    fn log(&self, event: NoteEvent, data: Value) {
        let name = event.name(&self.inner.options.event_prefix);
        tracing::debug!("emitting {}", name);
        self.inner.logger.emit(&name, data);
    }

    fn default_data(&self, annotation: &Annotation<N>) -> Map<String, Value> {
        let limit = self.inner.options.string_limit;
        let mut data = Map::new();
        data.insert("note_id".to_string(), json!(annotation.id));
        data.insert("component_usage_id".to_string(), json!(annotation.usage_id));
        insert_text(&mut data, "note_text", annotation.text.as_deref(), limit);
        insert_text(&mut data, "highlighted_content", annotation.quote.as_deref(), limit);
        data
    }

    /// Only notes that exist on the server count as viewed.
    pub fn on_viewer_shown(&self, annotations: &[Annotation<N>]) {
        let notes: Vec<Value> = annotations
            .iter()
            .filter(|a| !a.is_new())
            .map(|a| json!({ "note_id": a.id }))
            .collect();

        if !notes.is_empty() {
            self.log(NoteEvent::Viewed, json!({ "notes": notes }));
        }
    }

    pub fn on_fully_created(&self, annotation: &Annotation<N>) {
        self.log(NoteEvent::Added, Value::Object(self.default_data(annotation)));
    }

    pub fn on_editor_shown(&self, annotation: &Annotation<N>) {
        *self.inner.old_note_text.borrow_mut() = Some(annotation.text.clone().unwrap_or_default());
    }

    pub fn on_editor_hidden(&self) {
        self.inner.old_note_text.borrow_mut().take();
    }

    /// A new annotation being saved is a creation, reported once the server answers.
    pub fn on_updated(&self, annotation: &Annotation<N>) {
        if annotation.is_new() {
            return;
        }

        let mut data = self.default_data(annotation);
        let old_text = self.inner.old_note_text.borrow().clone();
        insert_text(
            &mut data,
            "old_note_text",
            old_text.as_deref(),
            self.inner.options.string_limit,
        );
        self.log(NoteEvent::Edited, Value::Object(data));
    }

    pub fn on_deleted(&self, annotation: &Annotation<N>) {
        if annotation.is_new() {
            return;
        }
        self.log(NoteEvent::Deleted, Value::Object(self.default_data(annotation)));
    }
}
