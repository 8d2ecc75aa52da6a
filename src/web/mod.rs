//! Browser bindings for a live Annotator instance.
//!
//! The widget is reached through its JS object (`subscribe`, `showViewer`, `viewer`,
//! `editor`) and its root element; highlight spans keep their annotation in jQuery data.

mod convert;

use crate::bus::{EventBus, Notification, NotificationKind, NotificationSource};
use crate::config::PluginOptions;
use crate::dom::{Dom, Key, KeyEvent, NodeSpec, Part, Placement, Region};
use crate::events::{EventDeriver, Logger};
use crate::focus::FocusController;
use crate::models::{Annotation, Position};
use crate::store::complete_creation;
use crate::widget::{AnnotationWidget, KeyHandler, KeyListenerId};
use convert::{annotation_from_js, annotations_from_js, call_method, get, json_to_js};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use strum::IntoEnumIterator;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, KeyboardEvent};

type BridgeClosure = Closure<dyn FnMut(JsValue, JsValue)>;
type KeyClosure = Closure<dyn FnMut(KeyboardEvent)>;

pub struct JsWidget {
    annotator: JsValue,
    root: Element,
    bus: EventBus<Element>,
    next_listener: Cell<u64>,
    key_listeners: RefCell<Vec<(KeyListenerId, KeyClosure)>>,
    bridges: RefCell<Vec<(NotificationKind, BridgeClosure)>>,
}

impl JsWidget {
    pub fn new(annotator: JsValue) -> Result<Self, JsValue> {
        let root = get(&annotator, "element")
            .and_then(|jq| get(&jq, "0"))
            .and_then(|el| el.dyn_into::<Element>().ok())
            .ok_or_else(|| JsValue::from_str("annotator has no root element"))?;

        Ok(Self {
            annotator,
            root,
            bus: EventBus::new(),
            next_listener: Cell::new(1),
            key_listeners: RefCell::new(Vec::new()),
            bridges: RefCell::new(Vec::new()),
        })
    }

    /// Republish the widget's own notifications on the typed bus.
    fn bridge_notifications(&self) {
        for kind in NotificationKind::iter() {
            if kind == NotificationKind::AnnotationFullyCreated {
                // Published by `track_creation`, never by the widget itself.
                continue;
            }

            let bus = self.bus.clone();
            let closure: BridgeClosure = Closure::wrap(Box::new(move |a: JsValue, b: JsValue| {
                if let Some(n) = notification_from_js(kind, &a, &b) {
                    bus.publish(n);
                }
            }) as Box<dyn FnMut(JsValue, JsValue)>);

            let args = js_sys::Array::of2(&JsValue::from_str(kind.as_ref()), closure.as_ref());
            if let Err(e) = call_method(&self.annotator, "subscribe", &args) {
                tracing::warn!("subscribe {} failed: {:?}", kind, e);
                continue;
            }
            self.bridges.borrow_mut().push((kind, closure));
        }
    }

    fn unbridge_notifications(&self) {
        for (kind, closure) in self.bridges.borrow_mut().drain(..) {
            let args = js_sys::Array::of2(&JsValue::from_str(kind.as_ref()), closure.as_ref());
            let _ = call_method(&self.annotator, "unsubscribe", &args);
        }
    }

    fn raw_annotation(&self, highlight: &Element) -> Option<JsValue> {
        let jquery = get(&js_sys::global(), "jQuery")?.dyn_into::<js_sys::Function>().ok()?;
        let wrapped = jquery.call1(&JsValue::NULL, highlight).ok()?;
        let args = js_sys::Array::of1(&JsValue::from_str("annotation"));
        call_method(&wrapped, "data", &args)
            .ok()
            .filter(|v| !v.is_undefined() && !v.is_null())
    }

    fn popup_call(&self, popup: &str, method: &str) -> Option<JsValue> {
        let target = get(&self.annotator, popup)?;
        match call_method(&target, method, &js_sys::Array::new()) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}.{} failed: {:?}", popup, method, e);
                None
            }
        }
    }
}

fn notification_from_js(
    kind: NotificationKind,
    a: &JsValue,
    b: &JsValue,
) -> Option<Notification<Element>> {
    let n = match kind {
        NotificationKind::AnnotationViewerTextField => Notification::ViewerTextField {
            field: a.clone().dyn_into::<Element>().ok()?,
            annotation: annotation_from_js(b),
        },
        NotificationKind::AnnotationsLoaded => {
            Notification::AnnotationsLoaded(annotations_from_js(a))
        }
        NotificationKind::AnnotationCreated => {
            Notification::AnnotationCreated(annotation_from_js(a))
        }
        NotificationKind::AnnotationFullyCreated => {
            Notification::AnnotationFullyCreated(annotation_from_js(a))
        }
        NotificationKind::AnnotationUpdated => {
            Notification::AnnotationUpdated(annotation_from_js(a))
        }
        NotificationKind::AnnotationDeleted => {
            Notification::AnnotationDeleted(annotation_from_js(a))
        }
        // The widget passes itself (viewer/editor) first.
        NotificationKind::AnnotationViewerShown => {
            Notification::ViewerShown(annotations_from_js(b))
        }
        NotificationKind::AnnotationEditorShown => Notification::EditorShown(annotation_from_js(b)),
        NotificationKind::AnnotationEditorHidden => Notification::EditorHidden,
    };
    Some(n)
}

impl Dom for JsWidget {
    type Node = Element;

    fn find(&self, part: Part) -> Option<Element> {
        self.root.query_selector(part.selector()).ok().flatten()
    }

    fn matches(&self, node: &Element, part: Part) -> bool {
        node.matches(part.selector()).unwrap_or(false)
    }

    fn focus(&self, node: &Element) {
        if let Some(el) = node.dyn_ref::<HtmlElement>() {
            let _ = el.focus();
        }
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        let _ = node.set_attribute(name, value);
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
    }

    fn insert(&self, spec: &NodeSpec, placement: Placement) -> Option<Element> {
        let document = web_sys::window().and_then(|w| w.document())?;
        let wrapper = self.find(Part::Wrapper)?;
        let el = document.create_element(spec.tag).ok()?;

        el.set_class_name(spec.class);
        if let Some(id) = &spec.id {
            el.set_id(id);
        }
        if let Some(t) = spec.tabindex {
            let _ = el.set_attribute("tabindex", &t.to_string());
        }
        el.set_text_content(Some(&spec.text));

        let placed = match placement {
            Placement::BeforeWrapper => wrapper.before_with_node_1(&el),
            Placement::AfterWrapper => wrapper.after_with_node_1(&el),
        };
        placed.ok()?;
        Some(el)
    }

    fn remove(&self, node: &Element) {
        node.remove();
    }

    fn position(&self, node: &Element) -> Position {
        match node.dyn_ref::<HtmlElement>() {
            Some(el) => Position {
                top: el.offset_top() as f64,
                left: el.offset_left() as f64,
            },
            None => Position::default(),
        }
    }
}

impl AnnotationWidget for JsWidget {
    type Node = Element;
    type Dom = JsWidget;
    type Bus = EventBus<Element>;

    fn dom(&self) -> &JsWidget {
        self
    }

    fn bus(&self) -> &EventBus<Element> {
        &self.bus
    }

    fn viewer_is_shown(&self) -> bool {
        self.popup_call("viewer", "isShown")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    fn show_viewer(&self, annotations: &[Annotation<Element>], position: Position) {
        let raw = js_sys::Array::new();
        for a in annotations {
            if let Some(obj) = a.first_highlight().and_then(|h| self.raw_annotation(h)) {
                raw.push(&obj);
            }
        }
        let pos = match serde_json::to_value(position) {
            Ok(v) => json_to_js(&v),
            Err(_) => JsValue::UNDEFINED,
        };
        let args = js_sys::Array::of2(&raw, &pos);
        if let Err(e) = call_method(&self.annotator, "showViewer", &args) {
            tracing::warn!("showViewer failed: {:?}", e);
        }
    }

    fn hide_viewer(&self) {
        self.popup_call("viewer", "hide");
    }

    fn hide_editor(&self) {
        self.popup_call("editor", "hide");
    }

    fn submit_editor(&self) {
        self.popup_call("editor", "submit");
    }

    fn annotation_for(&self, highlight: &Element) -> Option<Annotation<Element>> {
        self.raw_annotation(highlight).map(|raw| annotation_from_js(&raw))
    }

    fn listen_keydown(&self, region: Region, handler: KeyHandler<Element>) -> KeyListenerId {
        let id = KeyListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);

        let closure: KeyClosure = Closure::wrap(Box::new(move |ev: KeyboardEvent| {
            let Some(target) = ev.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            let Some(current) = target.closest(region.selector()).ok().flatten() else {
                return;
            };

            let key = match Key::from_key_name(&ev.key()) {
                // Older engines leave `key` empty or nonstandard.
                Key::Other => Key::from_key_code(ev.key_code()),
                key => key,
            };
            let mut event = KeyEvent::new(key, target).with_current_target(current);
            event.shift = ev.shift_key();
            event.meta = ev.meta_key();
            event.ctrl = ev.ctrl_key();
            let outcome = handler(&event);
            if outcome.prevent_default {
                ev.prevent_default();
            }
            if outcome.stop_propagation {
                ev.stop_propagation();
            }
        }) as Box<dyn FnMut(KeyboardEvent)>);

        if let Err(e) = self
            .root
            .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())
        {
            tracing::warn!("keydown listener for {:?} not attached: {:?}", region, e);
        }
        self.key_listeners.borrow_mut().push((id, closure));
        id
    }

    fn unlisten_keydown(&self, id: KeyListenerId) {
        let mut listeners = self.key_listeners.borrow_mut();
        if let Some(pos) = listeners.iter().position(|(lid, _)| *lid == id) {
            let (_, closure) = listeners.remove(pos);
            let _ = self
                .root
                .remove_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        }
    }
}

/// Forwards analytics records to the widget's JS logger (`logger.emit(name, data)`).
pub struct JsLogger {
    target: JsValue,
}

impl Logger for JsLogger {
    fn emit(&self, event_name: &str, payload: serde_json::Value) {
        let args = js_sys::Array::of2(&JsValue::from_str(event_name), &json_to_js(&payload));
        if let Err(e) = call_method(&self.target, "emit", &args) {
            tracing::warn!("analytics logger rejected {}: {:?}", event_name, e);
        }
    }
}

fn options_from_js(options: &JsValue) -> Result<PluginOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(PluginOptions::default());
    }
    let json: String = js_sys::JSON::stringify(options)?.into();
    PluginOptions::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Both plugins installed on one widget.
#[wasm_bindgen]
pub struct NotesPlugins {
    widget: Rc<JsWidget>,
    focus: FocusController<JsWidget>,
    events: EventDeriver<Element, EventBus<Element>>,
}

#[wasm_bindgen]
impl NotesPlugins {
    /// Report the note once the create request behind `request` (a promise or jqXHR)
    /// resolves with a server id.
    pub fn track_creation(&self, request: JsValue) {
        let bus = self.widget.bus.clone();
        let promise = js_sys::Promise::resolve(&request);
        wasm_bindgen_futures::spawn_local(async move {
            let round_trip = async {
                wasm_bindgen_futures::JsFuture::from(promise)
                    .await
                    .map(|v| annotation_from_js(&v))
                    .map_err(|e| format!("{e:?}"))
            };
            complete_creation(&bus, round_trip).await;
        });
    }

    pub fn destroy(&self) {
        self.focus.teardown();
        self.events.teardown();
        self.widget.unbridge_notifications();
    }
}

/// Install keyboard access and analytics on an Annotator instance.
#[wasm_bindgen]
pub fn install(annotator: JsValue, options: JsValue) -> Result<NotesPlugins, JsValue> {
    console_error_panic_hook::set_once();

    let options = options_from_js(&options)?;
    let logger_target = get(&annotator, "logger")
        .ok_or_else(|| JsValue::from_str("annotator has no logger"))?;

    let widget = Rc::new(JsWidget::new(annotator)?);
    widget.bridge_notifications();

    let focus = FocusController::new(Rc::clone(&widget));
    focus.initialize();

    let events = EventDeriver::new(
        Rc::new(widget.bus.clone()),
        Rc::new(JsLogger {
            target: logger_target,
        }),
        options,
    );
    events.initialize();

    tracing::debug!("notes plugins installed");
    Ok(NotesPlugins {
        widget,
        focus,
        events,
    })
}
