use serde_json::Value;
use std::cell::RefCell;
use strum::{AsRefStr, Display};

/// Analytics events describing note-taking intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum NoteEvent {
    Viewed,
    Added,
    Edited,
    Deleted,
}

impl NoteEvent {
    pub fn name(self, prefix: &str) -> String {
        format!("{prefix}.{self}")
    }
}

/// Sink for analytics records. Transport and buffering are the sink's business.
pub trait Logger {
    fn emit(&self, event_name: &str, payload: Value);
}

/// Keeps every record in memory, in emission order.
#[derive(Default)]
pub struct MemoryLogger {
    records: RefCell<Vec<(String, Value)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(String, Value)> {
        self.records.borrow().clone()
    }

    pub fn take(&self) -> Vec<(String, Value)> {
        std::mem::take(&mut *self.records.borrow_mut())
    }
}

impl Logger for MemoryLogger {
    fn emit(&self, event_name: &str, payload: Value) {
        self.records
            .borrow_mut()
            .push((event_name.to_string(), payload));
    }
}

/// Forwards records to `tracing` at info level under the `notes_analytics` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn emit(&self, event_name: &str, payload: Value) {
        tracing::info!(target: "notes_analytics", event = event_name, payload = %payload);
    }
}
