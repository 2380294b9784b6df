use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::selector::Selector;

/// ドキュメント内の要素ハンドル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attributes,
    CharacterData,
}

/// MutationObserver 相当の変更通知
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub target: NodeId,
}

pub type MutationReceiver = mpsc::UnboundedReceiver<MutationRecord>;

/// 複数のタスクから共有されるドキュメント
pub type SharedDom<D> = Arc<Mutex<D>>;

/// ホストページの DOM に対する最小限の操作
///
/// ホストページはこのクレートの管理外なので、探索系の操作はすべて
/// 失敗しうる（`None` / 空）ものとして扱う。
pub trait PageDom: Send + 'static {
    fn body(&self) -> NodeId;

    fn tag_name(&self, node: NodeId) -> Option<&str>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

    /// `root` の子孫を文書順で返す（`root` 自身は含まない）
    fn descendants(&self, root: NodeId) -> Vec<NodeId>;

    fn inner_text(&self, node: NodeId) -> String;

    fn is_connected(&self, node: NodeId) -> bool;

    fn style(&self, node: NodeId, property: &str) -> Option<&str>;

    fn create_element(&mut self, tag: &str) -> NodeId;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    fn set_text(&mut self, node: NodeId, text: &str);

    fn set_style(&mut self, node: NodeId, property: &str, value: &str);

    /// `reference` が None なら末尾に追加する
    fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>);

    fn remove(&mut self, node: NodeId);

    /// body 配下の変更通知を購読する（購読者は 1 つ）
    fn observe(&mut self) -> MutationReceiver;

    fn focus(&mut self, node: NodeId);

    /// `node` の中身を全選択する（execCommand('selectAll') 相当）
    fn select_all(&mut self, node: NodeId);

    fn active_element(&self) -> Option<NodeId>;

    /// 全選択されている要素
    fn selection(&self) -> Option<NodeId>;

    fn append_child(&mut self, parent: NodeId, node: NodeId) {
        self.insert_before(parent, node, None);
    }

    fn element_matches(&self, node: NodeId, selector: &Selector) -> bool {
        match self.tag_name(node) {
            Some(tag) => selector.matches(tag, |name| self.attribute(node, name)),
            None => false,
        }
    }

    fn query_selector(&self, selector: &Selector) -> Option<NodeId> {
        self.descendants(self.body())
            .into_iter()
            .find(|n| self.element_matches(*n, selector))
    }

    fn query_selector_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.descendants(self.body())
            .into_iter()
            .filter(|n| self.element_matches(*n, selector))
            .collect()
    }

    /// 自身を含む祖先方向で最初にマッチする要素
    fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.element_matches(n, selector) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.body())
            .into_iter()
            .find(|n| self.attribute(*n, "id") == Some(id))
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }
}
