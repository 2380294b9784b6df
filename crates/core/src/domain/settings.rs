use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 永続化キー（options ページと background で共有）
pub const KEY_SELECTED_PROVIDER: &str = "selectedProvider";
pub const KEY_GEMINI_API_KEY: &str = "geminiApiKey";
pub const KEY_OPENAI_API_KEY: &str = "openaiApiKey";
pub const KEY_GROQ_API_KEY: &str = "groqApiKey";

/// リライトに使うプロバイダー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
    Groq,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::Gemini, Self::OpenAi, Self::Groq];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Groq => "groq",
        }
    }

    /// エラーメッセージ用の表示名
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
            Self::OpenAi => "OpenAI",
            Self::Groq => "Groq",
        }
    }

    /// このプロバイダーの API キーを保持する設定キー
    pub fn credential_key(&self) -> &'static str {
        match self {
            Self::Gemini => KEY_GEMINI_API_KEY,
            Self::OpenAi => KEY_OPENAI_API_KEY,
            Self::Groq => KEY_GROQ_API_KEY,
        }
    }
}

impl Default for ProviderKind {
    fn default() -> Self {
        Self::Groq
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "groq" => Ok(Self::Groq),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// 永続化された設定のスナップショット
///
/// `selected_provider` は生の文字列のまま保持する。未知の値はリクエスト時に
/// `UnknownProvider` として扱うため、ここでは検証しない。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    pub selected_provider: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub groq_api_key: Option<String>,
}

impl ProviderSettings {
    /// 選択中のプロバイダー名（未設定ならデフォルト）
    pub fn selection(&self) -> &str {
        match self.selected_provider.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => ProviderKind::default().as_str(),
        }
    }

    pub fn credential(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Gemini => self.gemini_api_key.as_deref(),
            ProviderKind::OpenAi => self.openai_api_key.as_deref(),
            ProviderKind::Groq => self.groq_api_key.as_deref(),
        }
    }

    /// 空白のみのキーは未設定として扱う
    pub fn usable_credential(&self, kind: ProviderKind) -> Option<&str> {
        self.credential(kind).filter(|k| !k.trim().is_empty())
    }

    pub fn set_credential(&mut self, kind: ProviderKind, key: Option<String>) {
        let slot = match kind {
            ProviderKind::Gemini => &mut self.gemini_api_key,
            ProviderKind::OpenAi => &mut self.openai_api_key,
            ProviderKind::Groq => &mut self.groq_api_key,
        };
        *slot = key;
    }
}
