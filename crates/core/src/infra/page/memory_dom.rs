use std::collections::BTreeMap;

use tokio::sync::mpsc;

use super::dom::{MutationKind, MutationReceiver, MutationRecord, NodeId, PageDom};

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// プロセス内のドキュメントツリー
///
/// ノードは削除後もアリーナに残る（ブラウザの切り離された要素と同じ扱い）。
pub struct MemoryDom {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
    observer: Option<mpsc::UnboundedSender<MutationRecord>>,
    active: Option<NodeId>,
    selection: Option<NodeId>,
}

impl MemoryDom {
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            observer: None,
            active: None,
            selection: None,
        };
        let root = dom.alloc("html");
        let body = dom.alloc("body");
        dom.nodes[body.0].parent = Some(root);
        dom.nodes[root.0].children.push(body);
        dom.root = root;
        dom.body = body;
        dom
    }

    fn alloc(&mut self, tag: &str) -> NodeId {
        self.nodes.push(Node::new(tag));
        NodeId(self.nodes.len() - 1)
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    fn under_body(&self, node: NodeId) -> bool {
        self.contains(self.body, node)
    }

    fn notify(&mut self, kind: MutationKind, target: NodeId) {
        if !self.under_body(target) {
            return;
        }
        let closed = match &self.observer {
            Some(tx) => tx.send(MutationRecord { kind, target }).is_err(),
            None => false,
        };
        if closed {
            self.observer = None;
        }
    }

    fn detach(&mut self, node: NodeId) -> Option<NodeId> {
        let parent = self.node_mut(node)?.parent.take()?;
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != node);
        }
        Some(parent)
    }

    /// 要素を作って `parent` の末尾に追加する（テスト・デモのページ構築用）
    pub fn append_element(&mut self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let node = self.create_element(tag);
        for (name, value) in attributes {
            self.set_attribute(node, name, value);
        }
        self.append_child(parent, node);
        node
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl PageDom for MemoryDom {
    fn body(&self) -> NodeId {
        self.body
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(|n| n.tag.as_str())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node)?.attributes.get(name).map(String::as_str)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.node(self.parent(node)?)?;
        let idx = parent.children.iter().position(|c| *c == node)?;
        parent.children.get(idx + 1).copied()
    }

    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.node(root) {
            Some(n) => n.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(n) = self.node(id) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    fn inner_text(&self, node: NodeId) -> String {
        let Some(n) = self.node(node) else {
            return String::new();
        };
        let mut parts: Vec<String> = Vec::new();
        if !n.text.is_empty() {
            parts.push(n.text.clone());
        }
        for child in &n.children {
            let text = self.inner_text(*child);
            if !text.is_empty() {
                parts.push(text);
            }
        }
        parts.join("\n")
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.root, node)
    }

    fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.node(node)?.styles.get(property).map(String::as_str)
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(tag)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(n) = self.node_mut(node) {
            n.attributes.insert(name.to_string(), value.to_string());
            self.notify(MutationKind::Attributes, node);
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(n) = self.node_mut(node) {
            n.text = text.to_string();
            self.notify(MutationKind::CharacterData, node);
        }
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(n) = self.node_mut(node) {
            n.styles.insert(property.to_string(), value.to_string());
            self.notify(MutationKind::Attributes, node);
        }
    }

    fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        if node == parent || self.contains(node, parent) || self.node(parent).is_none() {
            log::warn!("不正な挿入を無視: parent={parent:?} node={node:?}");
            return;
        }
        self.detach(node);

        let Some(p) = self.node_mut(parent) else {
            return;
        };
        let idx = reference
            .and_then(|r| p.children.iter().position(|c| *c == r))
            .unwrap_or(p.children.len());
        p.children.insert(idx, node);
        if let Some(n) = self.node_mut(node) {
            n.parent = Some(parent);
        }
        self.notify(MutationKind::ChildList, parent);
    }

    fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.detach(node) {
            self.notify(MutationKind::ChildList, parent);
        }
        // 切り離された要素はフォーカスも選択も失う
        if self.active.is_some_and(|n| !self.is_connected(n)) {
            self.active = None;
        }
        if self.selection.is_some_and(|n| !self.is_connected(n)) {
            self.selection = None;
        }
    }

    fn observe(&mut self) -> MutationReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observer = Some(tx);
        rx
    }

    fn focus(&mut self, node: NodeId) {
        if self.is_connected(node) {
            self.active = Some(node);
        }
    }

    fn select_all(&mut self, node: NodeId) {
        if self.is_connected(node) {
            self.selection = Some(node);
        }
    }

    fn active_element(&self) -> Option<NodeId> {
        self.active
    }

    fn selection(&self) -> Option<NodeId> {
        self.selection
    }
}
