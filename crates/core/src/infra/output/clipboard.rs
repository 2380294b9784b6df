use parking_lot::Mutex;

use crate::domain::error::AppError;
use super::OutputTarget;

/// システムクリップボード出力（arboard）
pub struct ClipboardOutput;

impl ClipboardOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClipboardOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputTarget for ClipboardOutput {
    fn deliver(&self, text: &str) -> Result<(), AppError> {
        let mut ctx = arboard::Clipboard::new()
            .map_err(|e| AppError::clipboard(format!("クリップボード初期化失敗: {e}")))?;
        ctx.set_text(text)
            .map_err(|e| AppError::clipboard(format!("クリップボード書き込み失敗: {e}")))?;
        log::info!("クリップボードに出力: {} 文字", text.len());
        Ok(())
    }

    fn name(&self) -> &str {
        "clipboard"
    }
}

/// プロセス内クリップボード（テスト・ヘッドレス実行用）
#[derive(Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
    writes: Mutex<u32>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }

    pub fn write_count(&self) -> u32 {
        *self.writes.lock()
    }
}

impl OutputTarget for MemoryClipboard {
    fn deliver(&self, text: &str) -> Result<(), AppError> {
        *self.contents.lock() = Some(text.to_string());
        *self.writes.lock() += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        "memory-clipboard"
    }
}
