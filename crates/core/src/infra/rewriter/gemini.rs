use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::prompts;
use super::{
    http_failure, non_empty, transport_failure, EndpointConfig, RewriteError, Rewriter,
    MAX_OUTPUT_TOKENS, TEMPERATURE,
};
use crate::domain::settings::ProviderKind;

/// Gemini generateContent API を使用したリライター
///
/// API キーはクエリパラメータ、指示文はプロンプトのプレフィックスとして送る。
pub struct GeminiRewriter {
    client: reqwest::Client,
    endpoint: EndpointConfig,
    api_key: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// candidates[0].content.parts[0].text
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

impl GeminiRewriter {
    pub fn new(client: reqwest::Client, endpoint: EndpointConfig, api_key: String) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }

    pub fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.base_url.trim_end_matches('/'),
            self.endpoint.model
        )
    }

    pub(crate) fn build_request(text: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompts::build_prefixed_prompt(text),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        }
    }

    pub(crate) fn parse_response(body: &str) -> Result<String, RewriteError> {
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap_or_else(|e| {
            log::warn!("Gemini レスポンスの解析に失敗: {e}");
            GenerateContentResponse::default()
        });
        non_empty(ProviderKind::Gemini, parsed.into_text())
    }
}

#[async_trait]
impl Rewriter for GeminiRewriter {
    async fn rewrite(&self, text: &str) -> Result<String, RewriteError> {
        let request = Self::build_request(text);

        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_failure(ProviderKind::Gemini, e))?;

        if !response.status().is_success() {
            return Err(http_failure(ProviderKind::Gemini, response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_failure(ProviderKind::Gemini, e))?;

        Self::parse_response(&body)
    }

    fn name(&self) -> &str {
        ProviderKind::Gemini.as_str()
    }
}
