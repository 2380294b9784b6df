mod clipboard;
mod toast;

pub use clipboard::{ClipboardOutput, MemoryClipboard};
pub use toast::{DomToast, LogNotifier, ToastConfig, TOAST_ID};

use crate::domain::error::AppError;

/// 出力先 trait（リライト結果の受け渡し先）
pub trait OutputTarget: Send + Sync {
    fn deliver(&self, text: &str) -> Result<(), AppError>;
    fn name(&self) -> &str;
}

/// ユーザーへの一時通知
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}
