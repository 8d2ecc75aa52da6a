//! Keyboard access to the annotation viewer and editor.
//!
//! Focus is trapped inside whichever popup is open and TAB cycles through that popup's
//! controls. When a popup closes, focus goes back to the highlight the viewer was opened
//! from, so keyboard and screen-reader users keep their place in the text.

pub mod descriptions;
pub mod tab_cycle;

use crate::bus::{Notification, NotificationKind, NotificationSource, SubscriptionId};
use crate::dom::{Dom, Key, KeyEvent, KeyOutcome, NodeSpec, Part, Placement, Region};
use crate::models::Annotation;
use crate::widget::{AnnotationWidget, KeyListenerId};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tab_cycle::{next_index, Direction};

pub const FOCUS_GRABBER_CLASS: &str = "sr edx-notes-focus-grabber";
const FOCUS_GRABBER_LABEL: &str = "Focus grabber";

const VIEWER_TAB_CONTROLS: [Part; 4] = [
    Part::ViewerNote,
    Part::ViewerEdit,
    Part::ViewerDelete,
    Part::ViewerClose,
];

const EDITOR_TAB_CONTROLS: [Part; 3] = [Part::EditorTextarea, Part::EditorSave, Part::EditorCancel];

struct FocusState<N> {
    initialized: bool,
    subscriptions: Vec<SubscriptionId>,
    key_listeners: Vec<KeyListenerId>,
    focus_grabber: Option<N>,
    /// First highlight of the annotation whose viewer was opened last.
    saved_highlight: Option<N>,
    /// Sends focus to the grabber if the open annotation gets deleted.
    grabber_on_delete: Option<SubscriptionId>,
}

impl<N> Default for FocusState<N> {
    fn default() -> Self {
        Self {
            initialized: false,
            subscriptions: Vec::new(),
            key_listeners: Vec::new(),
            focus_grabber: None,
            saved_highlight: None,
            grabber_on_delete: None,
        }
    }
}

struct Inner<W: AnnotationWidget> {
    widget: Rc<W>,
    state: RefCell<FocusState<W::Node>>,
}

/// Keyboard focus controller for one widget instance.
///
/// Cloning is cheap and yields a handle to the same controller.
pub struct FocusController<W: AnnotationWidget> {
    inner: Rc<Inner<W>>,
}

impl<W: AnnotationWidget> Clone for FocusController<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<W: AnnotationWidget> FocusController<W> {
    pub fn new(widget: Rc<W>) -> Self {
        Self {
            inner: Rc::new(Inner {
                widget,
                state: RefCell::new(FocusState::default()),
            }),
        }
    }

    fn widget(&self) -> &W {
        &self.inner.widget
    }

    fn dom(&self) -> &W::Dom {
        self.inner.widget.dom()
    }

    fn weak(&self) -> Weak<Inner<W>> {
        Rc::downgrade(&self.inner)
    }

    fn from_weak(weak: &Weak<Inner<W>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.state.borrow().initialized
    }

    pub fn focus_grabber(&self) -> Option<W::Node> {
        self.inner.state.borrow().focus_grabber.clone()
    }

    pub fn saved_highlight(&self) -> Option<W::Node> {
        self.inner.state.borrow().saved_highlight.clone()
    }

    /// Hook into the widget. Calling it again on an initialized controller does nothing.
    pub fn initialize(&self) {
        if self.is_initialized() {
            return;
        }

        let widget = self.widget();
        let bus = widget.bus();
        let weak = self.weak();

        let mut subscriptions = Vec::with_capacity(4);
        {
            let weak = weak.clone();
            subscriptions.push(bus.subscribe(
                NotificationKind::AnnotationViewerTextField,
                Rc::new(move |n: &Notification<W::Node>| {
                    if let (Some(c), Notification::ViewerTextField { field, annotation }) =
                        (Self::from_weak(&weak), n)
                    {
                        c.add_aria_attributes(field, annotation);
                    }
                }),
            ));
        }
        {
            let weak = weak.clone();
            subscriptions.push(bus.subscribe(
                NotificationKind::AnnotationsLoaded,
                Rc::new(move |n: &Notification<W::Node>| {
                    if let (Some(c), Notification::AnnotationsLoaded(annotations)) =
                        (Self::from_weak(&weak), n)
                    {
                        c.add_descriptions(annotations);
                    }
                }),
            ));
        }
        {
            let weak = weak.clone();
            subscriptions.push(bus.subscribe(
                NotificationKind::AnnotationCreated,
                Rc::new(move |n: &Notification<W::Node>| {
                    if let (Some(c), Notification::AnnotationCreated(annotation)) =
                        (Self::from_weak(&weak), n)
                    {
                        c.add_descriptions(std::slice::from_ref(annotation));
                    }
                }),
            ));
        }
        {
            let weak = weak.clone();
            subscriptions.push(bus.subscribe(
                NotificationKind::AnnotationDeleted,
                Rc::new(move |n: &Notification<W::Node>| {
                    if let (Some(c), Notification::AnnotationDeleted(annotation)) =
                        (Self::from_weak(&weak), n)
                    {
                        c.remove_description(annotation);
                    }
                }),
            ));
        }

        let mut key_listeners = Vec::with_capacity(3);
        for region in [Region::Highlight, Region::Viewer, Region::Editor] {
            let weak = weak.clone();
            key_listeners.push(widget.listen_keydown(
                region,
                Rc::new(move |ev: &KeyEvent<W::Node>| {
                    let Some(c) = Self::from_weak(&weak) else {
                        return KeyOutcome::IGNORED;
                    };
                    match region {
                        Region::Highlight => c.on_highlight_keydown(ev),
                        Region::Viewer => c.on_viewer_keydown(ev),
                        Region::Editor => c.on_editor_keydown(ev),
                    }
                }),
            ));
        }

        let focus_grabber = self.add_focus_grabber();
        self.add_tab_index();

        let mut state = self.inner.state.borrow_mut();
        state.initialized = true;
        state.subscriptions = subscriptions;
        state.key_listeners = key_listeners;
        state.focus_grabber = focus_grabber;
        tracing::debug!("focus controller initialized");
    }

    /// Undo everything `initialize` did. Safe to call more than once.
    pub fn teardown(&self) {
        let state = std::mem::take(&mut *self.inner.state.borrow_mut());
        let widget = self.widget();

        for id in state.subscriptions.into_iter().chain(state.grabber_on_delete) {
            widget.bus().unsubscribe(id);
        }
        for id in state.key_listeners {
            widget.unlisten_keydown(id);
        }
        if let Some(grabber) = state.focus_grabber {
            self.dom().remove(&grabber);
        }
        if state.initialized {
            tracing::debug!("focus controller torn down");
        }
    }

    fn add_focus_grabber(&self) -> Option<W::Node> {
        let spec = NodeSpec {
            tag: "span",
            id: None,
            class: FOCUS_GRABBER_CLASS,
            tabindex: Some(-1),
            text: FOCUS_GRABBER_LABEL.to_string(),
        };
        self.dom().insert(&spec, Placement::BeforeWrapper)
    }

    fn add_tab_index(&self) {
        let dom = self.dom();
        for part in [Part::ViewerEdit, Part::ViewerDelete] {
            if let Some(node) = dom.find(part) {
                dom.set_attribute(&node, "tabindex", "0");
            }
        }
    }

    /// Link each annotation's highlights to a screen-reader description of its note.
    pub fn add_descriptions(&self, annotations: &[Annotation<W::Node>]) {
        for annotation in annotations {
            descriptions::add_description(self.dom(), annotation);
        }
    }

    pub fn remove_description(&self, annotation: &Annotation<W::Node>) {
        descriptions::remove_description(self.dom(), annotation);
    }

    /// Mark a rendered note body as a non-focusable note region.
    pub fn add_aria_attributes(&self, field: &W::Node, _annotation: &Annotation<W::Node>) {
        let dom = self.dom();
        dom.set_attribute(field, "tabindex", "-1");
        dom.set_attribute(field, "role", "note");
        dom.set_attribute(field, "class", "annotator-note");
    }

    fn focus_part(&self, part: Part) {
        let dom = self.dom();
        if let Some(node) = dom.find(part) {
            dom.focus(&node);
        }
    }

    fn focus_on_grabber(&self) {
        let grabber = self.inner.state.borrow().focus_grabber.clone();
        if let Some(grabber) = grabber {
            self.dom().focus(&grabber);
        }
    }

    fn focus_on_highlighted_text(&self) {
        let saved = self.inner.state.borrow_mut().saved_highlight.take();
        if let Some(highlight) = saved {
            tracing::debug!("restoring focus to highlight");
            self.dom().focus(&highlight);
        }
    }

    fn open_viewer(&self, highlight: &W::Node) {
        let widget = self.widget();
        let Some(annotation) = widget.annotation_for(highlight) else {
            tracing::debug!("highlight has no annotation attached");
            return;
        };

        let saved = annotation
            .first_highlight()
            .cloned()
            .unwrap_or_else(|| highlight.clone());
        self.inner.state.borrow_mut().saved_highlight = Some(saved);

        let position = self.dom().position(highlight);
        widget.show_viewer(std::slice::from_ref(&annotation), position);
        self.focus_part(Part::ViewerListing);

        if self.inner.state.borrow().grabber_on_delete.is_none() {
            let weak = self.weak();
            let id = widget.bus().subscribe(
                NotificationKind::AnnotationDeleted,
                Rc::new(move |_: &Notification<W::Node>| {
                    if let Some(c) = Self::from_weak(&weak) {
                        c.focus_on_grabber();
                    }
                }),
            );
            self.inner.state.borrow_mut().grabber_on_delete = Some(id);
        }
        tracing::debug!("viewer opened from highlight");
    }

    /// Called after a popup closed: hand focus back to where the user came from.
    fn on_close(&self) {
        self.focus_on_highlighted_text();
        let grabber_sub = self.inner.state.borrow_mut().grabber_on_delete.take();
        if let Some(id) = grabber_sub {
            self.widget().bus().unsubscribe(id);
        }
    }

    fn cycle(&self, controls: &[Part], event: &KeyEvent<W::Node>) {
        let dom = self.dom();
        // Rebuilt per keypress: the popups re-render their controls.
        let nodes: Vec<W::Node> = controls.iter().filter_map(|&p| dom.find(p)).collect();
        if let Some(i) = next_index(&nodes, &event.target, Direction::from_shift(event.shift)) {
            dom.focus(&nodes[i]);
        }
    }

    pub fn on_highlight_keydown(&self, event: &KeyEvent<W::Node>) -> KeyOutcome {
        let widget = self.widget();
        tracing::trace!("highlight keydown {:?}", event.key);

        match event.key {
            Key::Tab => {
                if widget.viewer_is_shown() {
                    self.focus_part(Part::ViewerListing);
                } else {
                    // Let the browser move on to the next highlight.
                    return KeyOutcome::IGNORED;
                }
            }
            Key::Enter | Key::Space => {
                if !widget.viewer_is_shown() {
                    self.open_viewer(&event.current_target);
                }
            }
            Key::Escape => widget.hide_viewer(),
            Key::Other => {}
        }
        KeyOutcome::CONSUMED
    }

    pub fn on_viewer_keydown(&self, event: &KeyEvent<W::Node>) -> KeyOutcome {
        let widget = self.widget();
        tracing::trace!("viewer keydown {:?}", event.key);

        match event.key {
            Key::Tab => {
                self.cycle(&VIEWER_TAB_CONTROLS, event);
                KeyOutcome::CONSUMED
            }
            Key::Enter | Key::Space => {
                if self.dom().matches(&event.target, Part::ViewerClose) {
                    widget.hide_viewer();
                    self.on_close();
                    KeyOutcome::CONSUMED
                } else {
                    KeyOutcome::IGNORED
                }
            }
            Key::Escape => {
                widget.hide_viewer();
                self.on_close();
                KeyOutcome::CONSUMED
            }
            Key::Other => KeyOutcome::IGNORED,
        }
    }

    pub fn on_editor_keydown(&self, event: &KeyEvent<W::Node>) -> KeyOutcome {
        let widget = self.widget();
        let dom = self.dom();
        tracing::trace!("editor keydown {:?}", event.key);

        let on_save = dom.matches(&event.target, Part::EditorSave);
        let on_cancel = dom.matches(&event.target, Part::EditorCancel);

        match event.key {
            Key::Tab => {
                self.cycle(&EDITOR_TAB_CONTROLS, event);
                return KeyOutcome::CONSUMED;
            }
            Key::Enter if on_save || event.meta || event.ctrl => widget.submit_editor(),
            Key::Space if on_save => widget.submit_editor(),
            Key::Enter | Key::Space if on_cancel => widget.hide_editor(),
            Key::Escape => widget.hide_editor(),
            _ => return KeyOutcome::IGNORED,
        }

        self.on_close();
        KeyOutcome::PREVENT_DEFAULT
    }
}
