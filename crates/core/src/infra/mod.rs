pub mod messaging;
pub mod metrics;
pub mod output;
pub mod page;
pub mod rewriter;
pub mod storage;
