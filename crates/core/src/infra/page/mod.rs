mod dom;
mod memory_dom;
pub mod selector;
pub mod shortcut;

pub use dom::{MutationKind, MutationReceiver, MutationRecord, NodeId, PageDom, SharedDom};
pub use memory_dom::MemoryDom;
pub use selector::{Selector, SelectorError};
pub use shortcut::{KeyEvent, Platform, Shortcut, ShortcutError};
