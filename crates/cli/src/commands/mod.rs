pub mod optimize;
pub mod providers;
pub mod settings;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use po_core::infra::storage::SqliteSettingsStore;

use crate::Cli;

const APP_DIR: &str = "prompt-optimizer";
const DB_FILE: &str = "settings.db";

/// `--db` / `PO_DB_PATH` がなければアプリデータディレクトリ配下
pub fn db_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    Ok(dir.join(DB_FILE))
}

pub fn open_store(cli: &Cli) -> Result<SqliteSettingsStore> {
    let path = db_path(cli.db.as_deref())?;
    log::debug!("設定 DB: {}", path.display());
    let store = SqliteSettingsStore::open(&path)?;
    Ok(store)
}

/// API キーを表示用に伏せる
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("gsk_1234567890abcd"), "gsk_…abcd");
        assert_eq!(mask_key("short"), "*****");
        assert_eq!(mask_key(""), "");
    }

    #[test]
    fn test_explicit_db_path_wins() {
        let path = db_path(Some(Path::new("/tmp/po-test.db"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/po-test.db"));
    }
}
