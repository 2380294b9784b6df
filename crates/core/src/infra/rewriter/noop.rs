use async_trait::async_trait;
use super::{RewriteError, Rewriter};

/// NoopRewriter: テキストを trim してそのまま返す。
/// API キーなしで配信経路を確認するための `--dry-run` 用。
pub struct NoopRewriter;

#[async_trait]
impl Rewriter for NoopRewriter {
    async fn rewrite(&self, text: &str) -> Result<String, RewriteError> {
        Ok(text.trim().to_string())
    }

    fn name(&self) -> &str {
        "noop"
    }
}
