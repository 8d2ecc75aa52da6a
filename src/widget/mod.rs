use crate::bus::NotificationSource;
use crate::dom::{Dom, KeyEvent, KeyOutcome, Region};
use crate::models::{Annotation, Position};
use std::rc::Rc;

pub type KeyHandler<N> = Rc<dyn Fn(&KeyEvent<N>) -> KeyOutcome>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyListenerId(pub u64);

/// The third-party annotation widget, as seen by the plugins.
///
/// The widget owns rendering, highlighting and persistence; the plugins only observe
/// its notifications and drive its popups.
pub trait AnnotationWidget: 'static {
    type Node: Clone + PartialEq + std::fmt::Debug + 'static;
    type Dom: Dom<Node = Self::Node>;
    type Bus: NotificationSource<Self::Node>;

    fn dom(&self) -> &Self::Dom;

    fn bus(&self) -> &Self::Bus;

    fn viewer_is_shown(&self) -> bool;

    fn show_viewer(&self, annotations: &[Annotation<Self::Node>], position: Position);

    fn hide_viewer(&self);

    fn hide_editor(&self);

    fn submit_editor(&self);

    /// Annotation owning a highlight span, if the span still carries one.
    fn annotation_for(&self, highlight: &Self::Node) -> Option<Annotation<Self::Node>>;

    fn listen_keydown(&self, region: Region, handler: KeyHandler<Self::Node>) -> KeyListenerId;

    fn unlisten_keydown(&self, id: KeyListenerId);
}
