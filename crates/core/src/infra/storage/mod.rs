mod memory;
mod sqlite;

pub use memory::MemorySettingsStore;
pub use sqlite::SqliteSettingsStore;

use crate::domain::error::AppError;
use crate::domain::settings::{
    ProviderSettings, KEY_GEMINI_API_KEY, KEY_GROQ_API_KEY, KEY_OPENAI_API_KEY,
    KEY_SELECTED_PROVIDER,
};

/// 永続化された key-value 設定ストア
///
/// ルーターはリクエストのたびに `load` を呼ぶ。キャッシュはしない。
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    fn remove(&self, key: &str) -> Result<(), AppError>;

    fn load(&self) -> Result<ProviderSettings, AppError> {
        Ok(ProviderSettings {
            selected_provider: self.get(KEY_SELECTED_PROVIDER)?,
            gemini_api_key: self.get(KEY_GEMINI_API_KEY)?,
            openai_api_key: self.get(KEY_OPENAI_API_KEY)?,
            groq_api_key: self.get(KEY_GROQ_API_KEY)?,
        })
    }

    /// 設定画面の保存処理: 各キーは trim して保存し、空ならキーごと削除する
    fn save(&self, settings: &ProviderSettings) -> Result<(), AppError> {
        let entries = [
            (KEY_SELECTED_PROVIDER, settings.selected_provider.as_deref()),
            (KEY_GEMINI_API_KEY, settings.gemini_api_key.as_deref()),
            (KEY_OPENAI_API_KEY, settings.openai_api_key.as_deref()),
            (KEY_GROQ_API_KEY, settings.groq_api_key.as_deref()),
        ];

        for (key, value) in entries {
            match value.map(str::trim) {
                Some(v) if !v.is_empty() => self.set(key, v)?,
                _ => self.remove(key)?,
            }
        }
        Ok(())
    }
}
