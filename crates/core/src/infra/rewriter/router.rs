use std::sync::Arc;

use async_trait::async_trait;

use super::gemini::GeminiRewriter;
use super::openai_compat::OpenAiCompatRewriter;
use super::{ProviderConfig, RewriteError, Rewriter};
use crate::domain::error::AppError;
use crate::domain::settings::{ProviderKind, ProviderSettings};
use crate::infra::storage::SettingsStore;

/// プロバイダールーター
///
/// 呼び出しのたびに設定ストアから選択プロバイダーと API キーを読み、
/// 対応するアダプターを 1 つだけ組み立てて 1 回呼び出す。
pub struct ProviderRouter {
    store: Arc<dyn SettingsStore>,
    config: ProviderConfig,
    client: reqwest::Client,
}

impl ProviderRouter {
    pub fn new(store: Arc<dyn SettingsStore>, config: ProviderConfig) -> Result<Self, AppError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::internal(format!("HTTP クライアント作成失敗: {e}")))?;

        Ok(Self {
            store,
            config,
            client,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// 現在の設定からアダプターを選ぶ（ネットワークには触れない）
    pub fn resolve(&self) -> Result<Box<dyn Rewriter>, RewriteError> {
        let settings = self
            .store
            .load()
            .map_err(|e| RewriteError::Settings(e.to_string()))?;
        self.adapter_for(&settings)
    }

    fn adapter_for(&self, settings: &ProviderSettings) -> Result<Box<dyn Rewriter>, RewriteError> {
        let kind = settings
            .selection()
            .parse::<ProviderKind>()
            .map_err(|e| RewriteError::UnknownProvider(e.0))?;

        let api_key = settings
            .usable_credential(kind)
            .ok_or(RewriteError::MissingCredential(kind))?
            .to_string();

        let endpoint = self.config.endpoint(kind).clone();
        let client = self.client.clone();

        let rewriter: Box<dyn Rewriter> = match kind {
            ProviderKind::Gemini => Box::new(GeminiRewriter::new(client, endpoint, api_key)),
            ProviderKind::OpenAi | ProviderKind::Groq => {
                Box::new(OpenAiCompatRewriter::new(client, kind, endpoint, api_key))
            }
        };
        Ok(rewriter)
    }
}

#[async_trait]
impl Rewriter for ProviderRouter {
    async fn rewrite(&self, text: &str) -> Result<String, RewriteError> {
        let rewriter = self.resolve()?;
        log::debug!("プロバイダー {} でリライト: {} 文字", rewriter.name(), text.len());
        rewriter.rewrite(text).await
    }

    fn name(&self) -> &str {
        "router"
    }
}
