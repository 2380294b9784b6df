pub mod gemini;
mod noop;
pub mod openai_compat;
pub mod prompts;
pub mod router;

pub use noop::NoopRewriter;
pub use router::ProviderRouter;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::error::ErrorCode;
use crate::domain::settings::ProviderKind;

/// 生成パラメータ（全プロバイダー共通）
pub const TEMPERATURE: f32 = 0.7;
pub const MAX_OUTPUT_TOKENS: u32 = 1000;

/// リライトエラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RewriteError {
    #[error("{} API key not found. Please set it in extension settings.", .0.display_name())]
    MissingCredential(ProviderKind),
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
    #[error("{message}")]
    ProviderHttp {
        provider: ProviderKind,
        status: u16,
        message: String,
    },
    #[error("No optimized prompt returned from {} API", .0.display_name())]
    EmptyResponse(ProviderKind),
    #[error("HTTP request failed: {0}")]
    Transport(String),
    #[error("Settings unavailable: {0}")]
    Settings(String),
}

impl RewriteError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingCredential(_) => ErrorCode::MissingCredential,
            Self::UnknownProvider(_) => ErrorCode::UnknownProvider,
            Self::ProviderHttp { .. } => ErrorCode::ProviderHttp,
            Self::EmptyResponse(_) => ErrorCode::EmptyResponse,
            Self::Transport(_) => ErrorCode::Transport,
            Self::Settings(_) => ErrorCode::Storage,
        }
    }
}

/// リライター trait（プロバイダーごとに 1 実装）
#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn rewrite(&self, text: &str) -> Result<String, RewriteError>;

    fn name(&self) -> &str;
}

/// 1 プロバイダーの接続先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub base_url: String,
    pub model: String,
}

impl EndpointConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}

/// プロバイダー接続設定
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub gemini: EndpointConfig,
    pub openai: EndpointConfig,
    pub groq: EndpointConfig,
    /// None ならタイムアウトなし
    pub timeout: Option<Duration>,
}

impl ProviderConfig {
    pub fn endpoint(&self, kind: ProviderKind) -> &EndpointConfig {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Groq => &self.groq,
        }
    }

    pub fn endpoint_mut(&mut self, kind: ProviderKind) -> &mut EndpointConfig {
        match kind {
            ProviderKind::Gemini => &mut self.gemini,
            ProviderKind::OpenAi => &mut self.openai,
            ProviderKind::Groq => &mut self.groq,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            gemini: EndpointConfig::new(
                "https://generativelanguage.googleapis.com/v1",
                "gemini-1.5-flash",
            ),
            openai: EndpointConfig::new("https://api.openai.com/v1", "gpt-4o-mini"),
            groq: EndpointConfig::new("https://api.groq.com/openai/v1", "llama-3.1-8b-instant"),
            timeout: None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// 非 2xx レスポンスを ProviderHttp に変換する
///
/// `{"error":{"message":...}}` が読めればその文言、読めなければステータスを含む汎用文言。
pub(crate) async fn http_failure(provider: ProviderKind, response: reqwest::Response) -> RewriteError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .ok()
        .and_then(|env| env.error)
        .and_then(|detail| detail.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            format!(
                "{} API error: {} {}",
                provider.display_name(),
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            )
            .trim_end()
            .to_string()
        });

    log::warn!("{provider} API が {status} を返しました: {message}");

    RewriteError::ProviderHttp {
        provider,
        status: status.as_u16(),
        message,
    }
}

pub(crate) fn transport_failure(provider: ProviderKind, e: reqwest::Error) -> RewriteError {
    if e.is_timeout() {
        RewriteError::Transport(format!("{} API request timed out", provider.display_name()))
    } else {
        RewriteError::Transport(e.to_string())
    }
}

/// 抽出結果を trim し、空なら EmptyResponse
pub(crate) fn non_empty(provider: ProviderKind, text: Option<String>) -> Result<String, RewriteError> {
    text.map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(RewriteError::EmptyResponse(provider))
}
