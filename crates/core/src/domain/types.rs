use serde::{Deserialize, Serialize};

/// リライト要求（トリガーごとに 1 回だけ消費される）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRequest {
    pub raw_text: String,
}

impl RewriteRequest {
    /// 前後の空白を除いて保持する。空白のみのテキストからは要求を作らない
    pub fn new(raw_text: impl Into<String>) -> Option<Self> {
        let raw_text = raw_text.into();
        let trimmed = raw_text.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            raw_text: trimmed.to_string(),
        })
    }
}

/// ページ → background のメッセージ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum RuntimeMessage {
    #[serde(rename = "optimizePrompt")]
    OptimizePrompt { prompt: String },
}

/// background → ページの応答
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptimizeResponse {
    Success {
        #[serde(rename = "optimizedPrompt")]
        optimized_prompt: String,
    },
    Failure {
        error: String,
    },
}

impl OptimizeResponse {
    pub fn success(text: impl Into<String>) -> Self {
        Self::Success {
            optimized_prompt: text.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            error: message.into(),
        }
    }

    pub fn into_result(self) -> Result<String, String> {
        match self {
            Self::Success { optimized_prompt } => Ok(optimized_prompt),
            Self::Failure { error } => Err(error),
        }
    }
}

/// リライトのトリガー元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Button,
    Shortcut,
    Cli,
}
