use crate::models::Position;
use std::fmt;

/// Elements of the widget's markup the plugins need to reach.
///
/// Lookups always go to the live page; nothing here is cached between events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Part {
    Wrapper,
    ViewerListing,
    ViewerNote,
    ViewerEdit,
    ViewerDelete,
    ViewerClose,
    /// Outer form of the editor; tabbing from it enters the editor controls.
    EditorWidget,
    EditorTextarea,
    EditorSave,
    EditorCancel,
}

impl Part {
    /// CSS selector relative to the widget's root element.
    pub fn selector(self) -> &'static str {
        match self {
            Part::Wrapper => ".annotator-wrapper",
            Part::ViewerListing => ".annotator-viewer .annotator-listing",
            Part::ViewerNote => ".annotator-viewer .annotator-note",
            Part::ViewerEdit => ".annotator-viewer .annotator-controls .annotator-edit",
            Part::ViewerDelete => ".annotator-viewer .annotator-controls .annotator-delete",
            Part::ViewerClose => ".annotator-viewer .annotator-controls .annotator-close",
            Part::EditorWidget => ".annotator-editor .annotator-widget",
            Part::EditorTextarea => {
                ".annotator-editor .annotator-listing .annotator-item:first-child > textarea"
            }
            Part::EditorSave => ".annotator-editor .annotator-controls .annotator-save",
            Part::EditorCancel => ".annotator-editor .annotator-controls .annotator-cancel",
        }
    }
}

/// DOM regions keyboard handlers are scoped to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    Highlight,
    Viewer,
    Editor,
}

impl Region {
    pub fn selector(self) -> &'static str {
        match self {
            Region::Highlight => ".annotator-hl",
            Region::Viewer => ".annotator-viewer",
            Region::Editor => ".annotator-editor",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Tab,
    Enter,
    Space,
    Escape,
    Other,
}

impl Key {
    pub fn from_key_code(code: u32) -> Self {
        match code {
            9 => Key::Tab,
            13 => Key::Enter,
            32 => Key::Space,
            27 => Key::Escape,
            _ => Key::Other,
        }
    }

    /// Maps `KeyboardEvent.key` values.
    pub fn from_key_name(name: &str) -> Self {
        match name {
            "Tab" => Key::Tab,
            "Enter" => Key::Enter,
            " " | "Spacebar" => Key::Space,
            "Escape" | "Esc" => Key::Escape,
            _ => Key::Other,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyEvent<N> {
    pub key: Key,
    pub shift: bool,
    pub meta: bool,
    pub ctrl: bool,
    /// Element that had focus when the key went down.
    pub target: N,
    /// Element matching the handler's region (e.g. the highlight span).
    pub current_target: N,
}

impl<N: Clone> KeyEvent<N> {
    pub fn new(key: Key, target: N) -> Self {
        Self {
            key,
            shift: false,
            meta: false,
            ctrl: false,
            current_target: target.clone(),
            target,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_current_target(mut self, current_target: N) -> Self {
        self.current_target = current_target;
        self
    }
}

/// What the host should do with the native event after a handler ran.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyOutcome {
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

impl KeyOutcome {
    pub const IGNORED: Self = Self {
        prevent_default: false,
        stop_propagation: false,
    };

    pub const CONSUMED: Self = Self {
        prevent_default: true,
        stop_propagation: true,
    };

    pub const PREVENT_DEFAULT: Self = Self {
        prevent_default: true,
        stop_propagation: false,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    BeforeWrapper,
    AfterWrapper,
}

/// Shape of a node the plugins insert next to the widget wrapper.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeSpec {
    pub tag: &'static str,
    pub id: Option<String>,
    pub class: &'static str,
    pub tabindex: Option<i32>,
    /// Inserted as text, never parsed as markup.
    pub text: String,
}

/// The slice of the page the plugins read and mutate.
///
/// All operations are best-effort: a node that vanished is simply ignored.
pub trait Dom {
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    fn find(&self, part: Part) -> Option<Self::Node>;

    /// Whether `node` is an element of kind `part`, not only the first one `find` returns.
    ///
    /// A viewer listing several overlapping notes renders one set of controls per note.
    fn matches(&self, node: &Self::Node, part: Part) -> bool;

    fn focus(&self, node: &Self::Node);

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    fn insert(&self, spec: &NodeSpec, placement: Placement) -> Option<Self::Node>;

    fn remove(&self, node: &Self::Node);

    fn position(&self, node: &Self::Node) -> Position;
}
