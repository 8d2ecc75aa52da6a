use crate::dom::{Dom, NodeSpec, Placement};
use crate::models::Annotation;
use crate::util::unique_token;

pub const DESCRIPTION_ID_PREFIX: &str = "aria-note-description-";
pub const DESCRIBED_BY: &str = "aria-describedby";

const DESCRIPTION_CLASS: &str = "aria-note-description sr";

pub fn description_id<N>(annotation: &Annotation<N>) -> String {
    let id = annotation
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_else(unique_token);
    format!("{DESCRIPTION_ID_PREFIX}{id}")
}

/// Insert a screen-reader-only copy of the note text and point every highlight at it.
pub fn add_description<D: Dom>(dom: &D, annotation: &Annotation<D::Node>) -> Option<String> {
    let id = description_id(annotation);

    // Reloading the same persisted notes must not duplicate ids.
    if let Some(stale) = dom.element_by_id(&id) {
        dom.remove(&stale);
    }

    let spec = NodeSpec {
        tag: "div",
        id: Some(id.clone()),
        class: DESCRIPTION_CLASS,
        tabindex: None,
        text: annotation.text.clone().unwrap_or_default(),
    };
    dom.insert(&spec, Placement::AfterWrapper)?;

    for highlight in &annotation.highlights {
        dom.set_attribute(highlight, DESCRIBED_BY, &id);
    }
    Some(id)
}

pub fn remove_description<D: Dom>(dom: &D, annotation: &Annotation<D::Node>) -> bool {
    let Some(id) = annotation
        .first_highlight()
        .and_then(|h| dom.attribute(h, DESCRIBED_BY))
    else {
        return false;
    };

    let Some(node) = dom.element_by_id(&id) else {
        return false;
    };
    dom.remove(&node);
    true
}
