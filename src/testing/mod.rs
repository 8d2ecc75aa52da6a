//! In-memory page and widget used by the unit tests.

use crate::bus::EventBus;
use crate::dom::{Dom, Key, KeyEvent, KeyOutcome, NodeSpec, Part, Placement, Region};
use crate::models::{Annotation, NoteId, Position};
use crate::widget::{AnnotationWidget, KeyHandler, KeyListenerId};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct FakeNode(pub usize);

#[derive(Clone, Debug, Default)]
pub(crate) struct FakeElement {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    pub placement: Option<Placement>,
    pub removed: bool,
}

#[derive(Default)]
pub(crate) struct Page {
    pub elements: Vec<FakeElement>,
    pub parts: HashMap<Part, FakeNode>,
    pub focused: Option<FakeNode>,
    pub viewer_shown: bool,
    pub viewer_opened_with: Vec<Vec<Annotation<FakeNode>>>,
    pub viewer_position: Option<Position>,
    pub editor_shown: bool,
    pub submits: usize,
    pub editor_hides: usize,
    pub annotations: HashMap<FakeNode, Annotation<FakeNode>>,
    pub positions: HashMap<FakeNode, Position>,
    next_listener: u64,
    key_listeners: Vec<(KeyListenerId, Region, KeyHandler<FakeNode>)>,
}

/// Widget with the full viewer and editor markup present.
pub(crate) struct FakeWidget {
    pub bus: EventBus<FakeNode>,
    pub page: RefCell<Page>,
}

const ALL_PARTS: [Part; 10] = [
    Part::Wrapper,
    Part::ViewerListing,
    Part::ViewerNote,
    Part::ViewerEdit,
    Part::ViewerDelete,
    Part::ViewerClose,
    Part::EditorWidget,
    Part::EditorTextarea,
    Part::EditorSave,
    Part::EditorCancel,
];

impl FakeWidget {
    pub fn new() -> Self {
        let w = Self {
            bus: EventBus::new(),
            page: RefCell::new(Page::default()),
        };
        for part in ALL_PARTS {
            let node = w.create("div");
            w.page.borrow_mut().parts.insert(part, node);
        }
        w
    }

    pub fn create(&self, tag: &str) -> FakeNode {
        let mut page = self.page.borrow_mut();
        page.elements.push(FakeElement {
            tag: tag.to_string(),
            ..Default::default()
        });
        FakeNode(page.elements.len() - 1)
    }

    /// Another control of kind `part`, as rendered for a second listed note.
    pub fn add_control(&self, part: Part) -> FakeNode {
        let node = self.create("button");
        self.set_attribute(&node, "class", class_of(part));
        node
    }

    pub fn part(&self, part: Part) -> FakeNode {
        self.page.borrow().parts[&part]
    }

    pub fn drop_part(&self, part: Part) {
        self.page.borrow_mut().parts.remove(&part);
    }

    pub fn focused(&self) -> Option<FakeNode> {
        self.page.borrow().focused
    }

    pub fn set_focus(&self, node: FakeNode) {
        self.page.borrow_mut().focused = Some(node);
    }

    pub fn set_viewer_shown(&self, shown: bool) {
        self.page.borrow_mut().viewer_shown = shown;
    }

    pub fn attr(&self, node: FakeNode, name: &str) -> Option<String> {
        self.page.borrow().elements[node.0].attrs.get(name).cloned()
    }

    pub fn element(&self, node: FakeNode) -> FakeElement {
        self.page.borrow().elements[node.0].clone()
    }

    /// Live nodes inserted by the plugins at `placement`.
    pub fn inserted(&self, placement: Placement) -> Vec<FakeNode> {
        self.page
            .borrow()
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.removed && e.placement == Some(placement))
            .map(|(i, _)| FakeNode(i))
            .collect()
    }

    /// Create a highlight span owned by a new annotation.
    pub fn highlight(&self, id: Option<i64>, text: &str) -> (FakeNode, Annotation<FakeNode>) {
        let span = self.create("span");
        let annotation = Annotation {
            id: id.map(NoteId::Int),
            text: Some(text.to_string()),
            highlights: vec![span],
            ..Default::default()
        };
        self.page
            .borrow_mut()
            .annotations
            .insert(span, annotation.clone());
        (span, annotation)
    }

    pub fn key_listener_count(&self) -> usize {
        self.page.borrow().key_listeners.len()
    }

    /// Dispatch a key event to every handler listening on `region`.
    pub fn press(&self, region: Region, event: KeyEvent<FakeNode>) -> Option<KeyOutcome> {
        let handlers: Vec<KeyHandler<FakeNode>> = self
            .page
            .borrow()
            .key_listeners
            .iter()
            .filter(|(_, r, _)| *r == region)
            .map(|(_, _, h)| h.clone())
            .collect();

        let mut outcome = None;
        for h in handlers {
            outcome = Some(h(&event));
        }
        outcome
    }

    pub fn press_key(&self, region: Region, key: Key, target: FakeNode) -> Option<KeyOutcome> {
        self.press(region, KeyEvent::new(key, target))
    }
}

/// Innermost class of the part's selector, e.g. `annotator-close`.
fn class_of(part: Part) -> &'static str {
    let last = part.selector().rsplit(' ').next().unwrap_or_default();
    last.trim_start_matches('.')
}

impl Dom for FakeWidget {
    type Node = FakeNode;

    fn find(&self, part: Part) -> Option<FakeNode> {
        self.page.borrow().parts.get(&part).copied()
    }

    fn matches(&self, node: &FakeNode, part: Part) -> bool {
        if self.find(part) == Some(*node) {
            return true;
        }
        let page = self.page.borrow();
        let el = &page.elements[node.0];
        !el.removed
            && el
                .attrs
                .get("class")
                .is_some_and(|c| c.split_whitespace().any(|t| t == class_of(part)))
    }

    fn focus(&self, node: &FakeNode) {
        let mut page = self.page.borrow_mut();
        if !page.elements[node.0].removed {
            page.focused = Some(*node);
        }
    }

    fn attribute(&self, node: &FakeNode, name: &str) -> Option<String> {
        self.attr(*node, name)
    }

    fn set_attribute(&self, node: &FakeNode, name: &str, value: &str) {
        self.page.borrow_mut().elements[node.0]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    fn element_by_id(&self, id: &str) -> Option<FakeNode> {
        self.page
            .borrow()
            .elements
            .iter()
            .position(|e| !e.removed && e.attrs.get("id").map(String::as_str) == Some(id))
            .map(FakeNode)
    }

    fn insert(&self, spec: &NodeSpec, placement: Placement) -> Option<FakeNode> {
        let node = self.create(spec.tag);
        let mut page = self.page.borrow_mut();
        let el = &mut page.elements[node.0];
        el.text = spec.text.clone();
        el.placement = Some(placement);
        el.attrs.insert("class".to_string(), spec.class.to_string());
        if let Some(id) = &spec.id {
            el.attrs.insert("id".to_string(), id.clone());
        }
        if let Some(t) = spec.tabindex {
            el.attrs.insert("tabindex".to_string(), t.to_string());
        }
        Some(node)
    }

    fn remove(&self, node: &FakeNode) {
        let mut page = self.page.borrow_mut();
        page.elements[node.0].removed = true;
        if page.focused == Some(*node) {
            page.focused = None;
        }
    }

    fn position(&self, node: &FakeNode) -> Position {
        self.page
            .borrow()
            .positions
            .get(node)
            .copied()
            .unwrap_or_default()
    }
}

impl AnnotationWidget for FakeWidget {
    type Node = FakeNode;
    type Dom = FakeWidget;
    type Bus = EventBus<FakeNode>;

    fn dom(&self) -> &FakeWidget {
        self
    }

    fn bus(&self) -> &EventBus<FakeNode> {
        &self.bus
    }

    fn viewer_is_shown(&self) -> bool {
        self.page.borrow().viewer_shown
    }

    fn show_viewer(&self, annotations: &[Annotation<FakeNode>], position: Position) {
        let mut page = self.page.borrow_mut();
        page.viewer_shown = true;
        page.viewer_position = Some(position);
        page.viewer_opened_with.push(annotations.to_vec());
    }

    fn hide_viewer(&self) {
        self.page.borrow_mut().viewer_shown = false;
    }

    fn hide_editor(&self) {
        let mut page = self.page.borrow_mut();
        page.editor_shown = false;
        page.editor_hides += 1;
    }

    fn submit_editor(&self) {
        let mut page = self.page.borrow_mut();
        page.editor_shown = false;
        page.submits += 1;
    }

    fn annotation_for(&self, highlight: &FakeNode) -> Option<Annotation<FakeNode>> {
        self.page.borrow().annotations.get(highlight).cloned()
    }

    fn listen_keydown(&self, region: Region, handler: KeyHandler<FakeNode>) -> KeyListenerId {
        let mut page = self.page.borrow_mut();
        page.next_listener += 1;
        let id = KeyListenerId(page.next_listener);
        page.key_listeners.push((id, region, handler));
        id
    }

    fn unlisten_keydown(&self, id: KeyListenerId) {
        self.page
            .borrow_mut()
            .key_listeners
            .retain(|(lid, _, _)| *lid != id);
    }
}
