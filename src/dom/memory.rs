use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::{Dom, EventKind, Listener, NodeId};

const ROOT: NodeId = NodeId(0);

#[derive(Debug)]
struct Registration {
    kind: EventKind,
    namespace: String,
    capture: bool,
    listener: Listener,
}

#[derive(Debug)]
struct Node {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    html: String,
    styles: Vec<(String, String)>,
    listeners: Vec<Registration>,
}

impl Node {
    fn new(tag: &str, parent: Option<NodeId>) -> Self {
        Self {
            tag: tag.to_string(),
            parent,
            children: Vec::new(),
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            html: String::new(),
            styles: Vec::new(),
            listeners: Vec::new(),
        }
    }

    fn listener(&self, kind: EventKind, capture: bool) -> impl Iterator<Item = Listener> + '_ {
        self.listeners
            .iter()
            .filter(move |r| r.kind == kind && r.capture == capture)
            .map(|r| r.listener)
    }
}

/// Arena-backed document: `<html>` with a single `<body>` to start with.
///
/// Removed nodes stay in the arena (ids are never reused) but are detached,
/// so they no longer show up in selections or serialized markup. Their
/// listeners are dropped on removal; the node records themselves are not, so
/// a document is meant to live for one page session rather than forever.
#[derive(Debug)]
pub struct MemoryDom {
    nodes: Vec<Node>,
    body: NodeId,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    pub fn new() -> Self {
        let mut nodes = vec![Node::new("html", None)];
        let body = NodeId(nodes.len());
        nodes.push(Node::new("body", Some(ROOT)));
        nodes[ROOT.0].children.push(body);
        Self { nodes, body }
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn tag(&self, node: NodeId) -> &str {
        &self.node(node).tag
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    /// Child elements of `node` with the given tag.
    pub fn children_by_tag(&self, node: NodeId, tag: &str) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|&c| self.tag(c) == tag)
            .collect()
    }

    pub fn classes(&self, node: NodeId) -> &[String] {
        &self.node(node).classes
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node).classes.iter().any(|c| c == class)
    }

    pub fn html(&self, node: NodeId) -> &str {
        &self.node(node).html
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        if name == "class" {
            let classes = &self.node(node).classes;
            return (!classes.is_empty()).then(|| classes.join(" "));
        }
        self.node(node).attributes.get(name).cloned()
    }

    pub fn style(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node)
            .styles
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == ROOT {
                return true;
            }
            match self.node(current).parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Number of listeners registered on `node`.
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.node(node).listeners.len()
    }

    /// Serializes `node` and its subtree. Inner html comes before child elements.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        out.push('<');
        out.push_str(&node.tag);
        if !node.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", node.classes.join(" "));
        }
        for (name, value) in &node.attributes {
            let _ = write!(out, " {name}=\"{value}\"");
        }
        if !node.styles.is_empty() {
            let style = node
                .styles
                .iter()
                .map(|(n, v)| format!("{n}: {v};"))
                .collect::<Vec<_>>()
                .join(" ");
            let _ = write!(out, " style=\"{style}\"");
        }
        out.push('>');
        out.push_str(&node.html);
        for &child in &node.children {
            self.write_html(child, out);
        }
        let _ = write!(out, "</{}>", node.tag);
    }

    fn collect_by_class(&self, id: NodeId, class: &str, out: &mut Vec<NodeId>) {
        if self.has_class(id, class) {
            out.push(id);
        }
        for &child in &self.node(id).children {
            self.collect_by_class(child, class, out);
        }
    }

    fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.node(node).parent;
        while let Some(id) = current {
            chain.push(id);
            current = self.node(id).parent;
        }
        chain
    }
}

impl Dom for MemoryDom {
    fn document_element(&self) -> NodeId {
        ROOT
    }

    fn body(&self) -> NodeId {
        self.body
    }

    fn append(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(tag, Some(parent)));
        self.node_mut(parent).children.push(id);
        id
    }

    fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.node_mut(node).parent.take() else {
            return;
        };
        self.node_mut(parent).children.retain(|&c| c != node);

        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            let detached = self.node_mut(id);
            detached.listeners.clear();
            pending.extend(detached.children.iter().copied());
        }
    }

    fn select_all(&self, class: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_by_class(ROOT, class, &mut out);
        out
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let node = self.node_mut(node);
        if name == "class" {
            node.classes = value.split_whitespace().map(str::to_string).collect();
        } else {
            node.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn classed(&mut self, node: NodeId, class: &str, on: bool) {
        let classes = &mut self.node_mut(node).classes;
        let present = classes.iter().any(|c| c == class);
        if on && !present {
            classes.push(class.to_string());
        } else if !on && present {
            classes.retain(|c| c != class);
        }
    }

    fn set_html(&mut self, node: NodeId, html: &str) {
        self.node_mut(node).html = html.to_string();
    }

    fn set_style(&mut self, node: NodeId, name: &str, value: &str) {
        let styles = &mut self.node_mut(node).styles;
        match styles.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => styles.push((name.to_string(), value.to_string())),
        }
    }

    fn on(&mut self, node: NodeId, kind: EventKind, namespace: &str, capture: bool, listener: Listener) {
        let listeners = &mut self.node_mut(node).listeners;
        let registration = Registration {
            kind,
            namespace: namespace.to_string(),
            capture,
            listener,
        };
        match listeners
            .iter_mut()
            .find(|r| r.kind == kind && r.namespace == namespace && r.capture == capture)
        {
            Some(existing) => *existing = registration,
            None => listeners.push(registration),
        }
    }

    fn off(&mut self, node: NodeId, kind: EventKind, namespace: &str, capture: bool) {
        self.node_mut(node)
            .listeners
            .retain(|r| !(r.kind == kind && r.namespace == namespace && r.capture == capture));
    }

    fn propagation_path(&self, target: NodeId, kind: EventKind) -> Vec<(NodeId, Listener)> {
        let ancestors = self.ancestors(target);
        let mut path = Vec::new();

        for &id in ancestors.iter().rev() {
            path.extend(self.node(id).listener(kind, true).map(|l| (id, l)));
        }
        path.extend(self.node(target).listener(kind, true).map(|l| (target, l)));
        path.extend(self.node(target).listener(kind, false).map(|l| (target, l)));
        for &id in &ancestors {
            path.extend(self.node(id).listener(kind, false).map(|l| (id, l)));
        }
        path
    }
}
