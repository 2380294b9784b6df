use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::prompts;
use super::{
    http_failure, non_empty, transport_failure, EndpointConfig, RewriteError, Rewriter,
    MAX_OUTPUT_TOKENS, TEMPERATURE,
};
use crate::domain::settings::ProviderKind;

/// OpenAI 互換 Chat Completions API を使用したリライター（OpenAI / Groq）
pub struct OpenAiCompatRewriter {
    client: reqwest::Client,
    kind: ProviderKind,
    endpoint: EndpointConfig,
    api_key: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiCompatRewriter {
    pub fn new(
        client: reqwest::Client,
        kind: ProviderKind,
        endpoint: EndpointConfig,
        api_key: String,
    ) -> Self {
        Self {
            client,
            kind,
            endpoint,
            api_key,
        }
    }

    pub fn url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.endpoint.base_url.trim_end_matches('/')
        )
    }

    pub(crate) fn build_request(&self, text: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.endpoint.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompts::OPTIMIZATION_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: text.to_string(),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_OUTPUT_TOKENS,
        }
    }

    /// choices[0].message.content
    pub(crate) fn parse_response(&self, body: &str) -> Result<String, RewriteError> {
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap_or_else(|e| {
            log::warn!("{} レスポンスの解析に失敗: {e}", self.kind);
            ChatCompletionResponse::default()
        });
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content);
        non_empty(self.kind, text)
    }
}

#[async_trait]
impl Rewriter for OpenAiCompatRewriter {
    async fn rewrite(&self, text: &str) -> Result<String, RewriteError> {
        let request = self.build_request(text);

        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_failure(self.kind, e))?;

        if !response.status().is_success() {
            return Err(http_failure(self.kind, response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_failure(self.kind, e))?;

        self.parse_response(&body)
    }

    fn name(&self) -> &str {
        self.kind.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groq() -> OpenAiCompatRewriter {
        OpenAiCompatRewriter::new(
            reqwest::Client::new(),
            ProviderKind::Groq,
            EndpointConfig::new("https://api.groq.com/openai/v1", "llama-3.1-8b-instant"),
            "gsk-test".into(),
        )
    }

    #[test]
    fn test_build_request_uses_system_role() {
        let request = groq().build_request("fix my bug");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "llama-3.1-8b-instant");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(
            json["messages"][0]["content"],
            prompts::OPTIMIZATION_SYSTEM_PROMPT
        );
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "fix my bug");
        assert_eq!(json["max_tokens"], 1000);
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"\n Clearer prompt  "}}]}"#;
        assert_eq!(groq().parse_response(body).unwrap(), "Clearer prompt");
    }

    #[test]
    fn test_parse_response_empty() {
        for body in [
            r#"{"choices":[]}"#,
            r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#,
            r#"{"choices":[{"message":{"role":"assistant","content":""}}]}"#,
            r#"{}"#,
        ] {
            assert_eq!(
                groq().parse_response(body),
                Err(RewriteError::EmptyResponse(ProviderKind::Groq)),
                "body: {body}"
            );
        }
    }

    #[test]
    fn test_url_and_name() {
        let rewriter = groq();
        assert_eq!(
            rewriter.url(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(rewriter.name(), "groq");
    }
}
