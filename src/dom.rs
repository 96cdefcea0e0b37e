//! The document the menu is rendered into.
//!
//! The menu never owns the tree; it drives it through [`Dom`]. [`MemoryDom`]
//! is the in-process implementation used by the `d3cm` driver and the tests.

mod memory;

pub use memory::MemoryDom;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn to_raw(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MouseDown,
    Click,
    ContextMenu,
}

impl EventKind {
    pub fn name(self) -> &'static str {
        match self {
            EventKind::MouseDown => "mousedown",
            EventKind::Click => "click",
            EventKind::ContextMenu => "contextmenu",
        }
    }
}

/// Handlers the context menu installs on the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listener {
    /// Mousedown outside the menu.
    Dismiss,
    /// Right-click on the menu itself.
    DismissFromMenu,
    /// Click on a rendered `<li>`.
    ClickItem,
}

pub trait Dom {
    /// Root of the document (`<html>`).
    fn document_element(&self) -> NodeId;
    fn body(&self) -> NodeId;

    /// Creates a `tag` element as the last child of `parent`.
    fn append(&mut self, parent: NodeId, tag: &str) -> NodeId;
    /// Detaches `node` (and its subtree) from the document.
    fn remove(&mut self, node: NodeId);

    /// Attached elements carrying `class`, in document order.
    fn select_all(&self, class: &str) -> Vec<NodeId>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);
    /// Adds or removes a single class.
    fn classed(&mut self, node: NodeId, class: &str, on: bool);
    fn set_html(&mut self, node: NodeId, html: &str);
    fn set_style(&mut self, node: NodeId, name: &str, value: &str);

    /// Registers `listener`, replacing whatever was registered for the same
    /// `(kind, namespace, capture)` on `node`.
    fn on(&mut self, node: NodeId, kind: EventKind, namespace: &str, capture: bool, listener: Listener);
    fn off(&mut self, node: NodeId, kind: EventKind, namespace: &str, capture: bool);

    /// Listeners an event of `kind` on `target` reaches, in delivery order:
    /// capturing listeners from the root down, then bubbling ones back up.
    fn propagation_path(&self, target: NodeId, kind: EventKind) -> Vec<(NodeId, Listener)>;
}
