use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned note identifier.
///
/// The notes backend hands out either integers or opaque strings depending on the
/// deployment, so both shapes are kept as-is and serialized back unchanged.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum NoteId {
    Int(i64),
    Str(String),
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteId::Int(n) => write!(f, "{n}"),
            NoteId::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for NoteId {
    fn from(n: i64) -> Self {
        NoteId::Int(n)
    }
}

impl From<&str> for NoteId {
    fn from(s: &str) -> Self {
        NoteId::Str(s.to_string())
    }
}

/// One note attached to a highlighted range of the page.
///
/// `N` is the host's DOM node handle. Highlights are never serialized: they only
/// exist in the live page.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Annotation<N = ()> {
    /// Absent until the create round trip has completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NoteId>,

    #[serde(default)]
    pub text: Option<String>,

    /// The highlighted source text.
    #[serde(default)]
    pub quote: Option<String>,

    /// Component the note was taken in.
    #[serde(default)]
    pub usage_id: Option<String>,

    #[serde(skip)]
    pub highlights: Vec<N>,
}

impl<N> Default for Annotation<N> {
    fn default() -> Self {
        Self {
            id: None,
            text: None,
            quote: None,
            usage_id: None,
            highlights: Vec::new(),
        }
    }
}

impl<N> Annotation<N> {
    /// An annotation is new until the server has assigned it an id.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn first_highlight(&self) -> Option<&N> {
        self.highlights.first()
    }
}

/// Page coordinates used to place the viewer next to a highlight.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub top: f64,
    pub left: f64,
}
