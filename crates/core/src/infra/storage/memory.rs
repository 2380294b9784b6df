use std::collections::HashMap;

use parking_lot::Mutex;

use super::SettingsStore;
use crate::domain::error::AppError;

/// プロセス内の設定ストア（テスト・一時実行用）
#[derive(Default)]
pub struct MemorySettingsStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::new();
        {
            let mut map = store.entries.lock();
            for (k, v) in entries {
                map.insert(k.to_string(), v.to_string());
            }
        }
        store
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::{ProviderSettings, KEY_GROQ_API_KEY};

    #[test]
    fn test_load_empty() {
        let store = MemorySettingsStore::new();
        assert_eq!(store.load().unwrap(), ProviderSettings::default());
    }

    #[test]
    fn test_save_removes_blank_keys() {
        let store = MemorySettingsStore::with_entries([(KEY_GROQ_API_KEY, "old")]);
        store
            .save(&ProviderSettings {
                selected_provider: Some("openai".into()),
                openai_api_key: Some("  sk-new  ".into()),
                groq_api_key: Some("   ".into()),
                ..Default::default()
            })
            .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.selected_provider.as_deref(), Some("openai"));
        assert_eq!(loaded.openai_api_key.as_deref(), Some("sk-new"));
        assert!(loaded.groq_api_key.is_none());
        assert!(loaded.gemini_api_key.is_none());
    }
}
