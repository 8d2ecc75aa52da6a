use crate::models::{Annotation, NoteId};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Element;

/// Property lookup that treats `undefined` and `null` as absent.
pub(super) fn get(obj: &JsValue, key: &str) -> Option<JsValue> {
    js_sys::Reflect::get(obj, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

pub(super) fn call_method(
    obj: &JsValue,
    method: &str,
    args: &js_sys::Array,
) -> Result<JsValue, JsValue> {
    let f = get(obj, method)
        .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
        .ok_or_else(|| JsValue::from_str(&format!("no method {method}")))?;
    f.apply(obj, args)
}

fn get_string(obj: &JsValue, key: &str) -> Option<String> {
    get(obj, key).and_then(|v| v.as_string())
}

fn note_id(obj: &JsValue) -> Option<NoteId> {
    let v = get(obj, "id")?;
    if let Some(n) = v.as_f64() {
        return Some(NoteId::Int(n as i64));
    }
    v.as_string().map(NoteId::Str)
}

pub(super) fn annotation_from_js(obj: &JsValue) -> Annotation<Element> {
    let highlights = get(obj, "highlights")
        .map(|h| {
            js_sys::Array::from(&h)
                .iter()
                .filter_map(|n| n.dyn_into::<Element>().ok())
                .collect()
        })
        .unwrap_or_default();

    Annotation {
        id: note_id(obj),
        text: get_string(obj, "text"),
        quote: get_string(obj, "quote"),
        usage_id: get_string(obj, "usage_id"),
        highlights,
    }
}

/// Accepts a single annotation or an array of them.
pub(super) fn annotations_from_js(value: &JsValue) -> Vec<Annotation<Element>> {
    if js_sys::Array::is_array(value) {
        js_sys::Array::from(value)
            .iter()
            .map(|v| annotation_from_js(&v))
            .collect()
    } else if value.is_object() {
        vec![annotation_from_js(value)]
    } else {
        Vec::new()
    }
}

pub(super) fn json_to_js(value: &serde_json::Value) -> JsValue {
    js_sys::JSON::parse(&value.to_string()).unwrap_or(JsValue::UNDEFINED)
}
