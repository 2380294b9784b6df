use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::SettingsStore;
use crate::domain::error::AppError;

/// SQLite の key-value テーブルに設定を保存するストア
pub struct SqliteSettingsStore {
    conn: Mutex<Connection>,
}

impl SqliteSettingsStore {
    /// 新規接続（ファイルパス指定）
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| AppError::storage(format!("DB接続に失敗: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// in-memory DB（テスト用）
    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::storage(format!("in-memory DB作成に失敗: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), AppError> {
        self.conn
            .lock()
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS settings (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );
                ",
            )
            .map_err(|e| AppError::storage(format!("マイグレーション失敗: {e}")))?;
        Ok(())
    }

    /// 保存済みキーの一覧（キー順）
    pub fn keys(&self) -> Result<Vec<String>, AppError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT key FROM settings ORDER BY key")
            .map_err(|e| AppError::storage(format!("クエリ準備失敗: {e}")))?;

        let keys = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e| AppError::storage(format!("クエリ実行失敗: {e}")))?
            .collect::<Result<Vec<String>, _>>()
            .map_err(|e| AppError::storage(format!("行読み取り失敗: {e}")))?;
        Ok(keys)
    }
}

impl SettingsStore for SqliteSettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.conn
            .lock()
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| AppError::storage(format!("設定読み込み失敗 [{key}]: {e}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(|e| AppError::storage(format!("設定保存失敗 [{key}]: {e}")))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        self.conn
            .lock()
            .execute("DELETE FROM settings WHERE key = ?1", params![key])
            .map_err(|e| AppError::storage(format!("設定削除失敗 [{key}]: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::{
        ProviderSettings, KEY_GEMINI_API_KEY, KEY_OPENAI_API_KEY, KEY_SELECTED_PROVIDER,
    };

    #[test]
    fn test_settings_default_when_empty() {
        let store = SqliteSettingsStore::open_in_memory().unwrap();
        let settings = store.load().unwrap();
        assert_eq!(settings, ProviderSettings::default());
        assert_eq!(settings.selection(), "groq");
    }

    #[test]
    fn test_set_get_overwrite() {
        let store = SqliteSettingsStore::open_in_memory().unwrap();
        store.set(KEY_SELECTED_PROVIDER, "gemini").unwrap();
        store.set(KEY_SELECTED_PROVIDER, "openai").unwrap();
        assert_eq!(
            store.get(KEY_SELECTED_PROVIDER).unwrap().as_deref(),
            Some("openai")
        );
        assert!(store.get(KEY_GEMINI_API_KEY).unwrap().is_none());
    }

    #[test]
    fn test_remove() {
        let store = SqliteSettingsStore::open_in_memory().unwrap();
        store.set(KEY_OPENAI_API_KEY, "sk-1").unwrap();
        store.remove(KEY_OPENAI_API_KEY).unwrap();
        store.remove(KEY_OPENAI_API_KEY).unwrap(); // 存在しなくてもエラーにしない
        assert!(store.get(KEY_OPENAI_API_KEY).unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_settings() {
        let store = SqliteSettingsStore::open_in_memory().unwrap();
        let settings = ProviderSettings {
            selected_provider: Some("gemini".into()),
            gemini_api_key: Some("AIza-test".into()),
            openai_api_key: None,
            groq_api_key: Some("".into()),
        };
        store.save(&settings).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.selection(), "gemini");
        assert_eq!(loaded.gemini_api_key.as_deref(), Some("AIza-test"));
        assert!(loaded.groq_api_key.is_none());
        assert_eq!(
            store.keys().unwrap(),
            vec![KEY_GEMINI_API_KEY.to_string(), KEY_SELECTED_PROVIDER.to_string()]
        );
    }

    #[test]
    fn test_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.db");

        SqliteSettingsStore::open(&path)
            .unwrap()
            .set(KEY_SELECTED_PROVIDER, "openai")
            .unwrap();

        let reopened = SqliteSettingsStore::open(path.as_path()).unwrap();
        assert_eq!(reopened.load().unwrap().selection(), "openai");
    }

    #[cfg(unix)]
    #[test]
    fn test_open_keeps_non_utf8_path() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OsStr::from_bytes(b"settings-\xff.db"));

        SqliteSettingsStore::open(&path)
            .unwrap()
            .set(KEY_SELECTED_PROVIDER, "gemini")
            .unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("settings-\u{FFFD}.db").exists());
        assert_eq!(
            SqliteSettingsStore::open(&path).unwrap().load().unwrap().selection(),
            "gemini"
        );
    }
}
