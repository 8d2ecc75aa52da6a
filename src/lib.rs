//! Keyboard accessibility and note-taking analytics for an in-page annotation widget.
//!
//! Two independent listeners sit on the widget's notification bus:
//! - [`FocusController`] keeps keyboard focus inside the viewer/editor popups and returns
//!   it to the originating highlight when a popup closes.
//! - [`EventDeriver`] turns lifecycle notifications into `viewed`/`added`/`edited`/`deleted`
//!   analytics records.
//!
//! The host composes them; neither knows about the other.

pub mod bus;
pub mod config;
pub mod dom;
pub mod events;
pub mod focus;
pub mod models;
pub mod store;
pub mod util;
pub mod widget;

// Browser bindings only make sense on the wasm target.
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
mod testing;

pub use bus::{EventBus, Notification, NotificationKind, NotificationSource};
pub use config::PluginOptions;
pub use events::{EventDeriver, Logger, NoteEvent};
pub use focus::FocusController;
pub use models::{Annotation, NoteId};
pub use store::complete_creation;
pub use widget::AnnotationWidget;
