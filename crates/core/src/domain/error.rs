use serde::Serialize;

/// アプリケーション共通エラーコード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    #[serde(rename = "E_MISSING_CREDENTIAL")]
    MissingCredential,
    #[serde(rename = "E_UNKNOWN_PROVIDER")]
    UnknownProvider,
    #[serde(rename = "E_PROVIDER_HTTP")]
    ProviderHttp,
    #[serde(rename = "E_EMPTY_RESPONSE")]
    EmptyResponse,
    #[serde(rename = "E_TRANSPORT")]
    Transport,
    #[serde(rename = "E_NO_INPUT")]
    NoInput,
    #[serde(rename = "E_DELIVERY")]
    Delivery,
    #[serde(rename = "E_CLIPBOARD")]
    Clipboard,
    #[serde(rename = "E_STORAGE")]
    Storage,
    #[serde(rename = "E_INTERNAL")]
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCredential => "E_MISSING_CREDENTIAL",
            Self::UnknownProvider => "E_UNKNOWN_PROVIDER",
            Self::ProviderHttp => "E_PROVIDER_HTTP",
            Self::EmptyResponse => "E_EMPTY_RESPONSE",
            Self::Transport => "E_TRANSPORT",
            Self::NoInput => "E_NO_INPUT",
            Self::Delivery => "E_DELIVERY",
            Self::Clipboard => "E_CLIPBOARD",
            Self::Storage => "E_STORAGE",
            Self::Internal => "E_INTERNAL",
        }
    }
}

/// インフラ層のエラー（ストレージ・クリップボード等）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub recoverable: bool,
}

impl AppError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Internal,
            message: msg.into(),
            recoverable: false,
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Storage,
            message: msg.into(),
            recoverable: false,
        }
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Delivery,
            message: msg.into(),
            recoverable: true,
        }
    }

    pub fn clipboard(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Clipboard,
            message: msg.into(),
            recoverable: true,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {}
