use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::sleep;

use crate::{
    retry::{is_retryable_http_error, parse_retry_after_ms, retry_delay_ms, should_retry_status},
    AiError, ChatRequest, ChatResponse, ChatUsage, LlmClient, Message, MessageRole,
};

#[derive(Debug, Clone)]
/// Configuration for the Gemini `generateContent` client.
pub struct GoogleConfig {
    pub api_base: String,
    pub api_key: String,
    pub request_timeout_ms: u64,
    pub max_retries: usize,
}

#[derive(Debug, Clone)]
/// Gemini REST client implementing [`LlmClient`].
pub struct GoogleClient {
    client: reqwest::Client,
    config: GoogleConfig,
}

impl GoogleClient {
    pub fn new(config: GoogleConfig) -> Result<Self, AiError> {
        if config.api_key.trim().is_empty() {
            return Err(AiError::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(
                config.request_timeout_ms.max(1),
            ))
            .build()?;

        Ok(Self { client, config })
    }

    fn generate_content_url(&self, model: &str) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        if base.contains(":generateContent") {
            return base.replace("{model}", model);
        }

        format!("{base}/models/{model}:generateContent")
    }
}

#[async_trait]
impl LlmClient for GoogleClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, AiError> {
        let body = build_generate_content_body(&request);
        let url = self.generate_content_url(&request.model);
        let max_retries = self.config.max_retries;

        for attempt in 0..=max_retries {
            let response = self
                .client
                .post(&url)
                .header("x-rho-retry-attempt", attempt.to_string())
                .query(&[("key", self.config.api_key.as_str())])
                .json(&body)
                .send()
                .await;

            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let raw = response.text().await?;
                        return parse_generate_content_response(&raw);
                    }

                    let retry_after_ms = parse_retry_after_ms(response.headers());
                    let raw = response.text().await?;
                    if attempt < max_retries && should_retry_status(status.as_u16()) {
                        let backoff_ms = retry_delay_ms(attempt, retry_after_ms);
                        sleep(std::time::Duration::from_millis(backoff_ms)).await;
                        continue;
                    }

                    return Err(AiError::HttpStatus {
                        status: status.as_u16(),
                        body: raw,
                    });
                }
                Err(error) => {
                    if attempt < max_retries && is_retryable_http_error(&error) {
                        let backoff_ms = retry_delay_ms(attempt, None);
                        sleep(std::time::Duration::from_millis(backoff_ms)).await;
                        continue;
                    }
                    return Err(AiError::Http(error));
                }
            }
        }

        Err(AiError::InvalidResponse(
            "request retry loop terminated unexpectedly".to_string(),
        ))
    }
}

fn build_generate_content_body(request: &ChatRequest) -> Value {
    let system = request
        .messages
        .iter()
        .filter(|message| message.role == MessageRole::System)
        .map(|message| message.content.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let contents = request
        .messages
        .iter()
        .filter(|message| message.role != MessageRole::System)
        .map(|message| {
            let role = match message.role {
                MessageRole::Assistant => "model",
                _ => "user",
            };
            json!({
                "role": role,
                "parts": [{ "text": message.content }],
            })
        })
        .collect::<Vec<_>>();

    let mut body = json!({ "contents": contents });

    if !system.is_empty() {
        body["systemInstruction"] = json!({
            "parts": [{ "text": system }],
        });
    }

    if request.temperature.is_some() || request.max_tokens.is_some() || request.json_mode {
        let mut generation_config = json!({});
        if request.json_mode {
            generation_config["responseMimeType"] = json!("application/json");
        }
        if let Some(temperature) = request.temperature {
            generation_config["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            generation_config["maxOutputTokens"] = json!(max_tokens);
        }
        body["generationConfig"] = generation_config;
    }

    body
}

fn parse_generate_content_response(raw: &str) -> Result<ChatResponse, AiError> {
    let value: Value = serde_json::from_str(raw)?;
    let candidate = value
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .ok_or_else(|| AiError::InvalidResponse("response contained no candidates".to_string()))?;

    let text = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let finish_reason = candidate
        .get("finishReason")
        .and_then(Value::as_str)
        .map(str::to_string);

    let usage = value
        .get("usageMetadata")
        .map(|usage| ChatUsage {
            input_tokens: usage
                .get("promptTokenCount")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            output_tokens: usage
                .get("candidatesTokenCount")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            total_tokens: usage
                .get("totalTokenCount")
                .and_then(Value::as_u64)
                .unwrap_or(0),
        })
        .unwrap_or_default();

    Ok(ChatResponse {
        message: Message::assistant(text),
        finish_reason,
        usage,
    })
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::{build_generate_content_body, GoogleClient, GoogleConfig};
    use crate::{ChatRequest, LlmClient, Message};

    fn request(json_mode: bool) -> ChatRequest {
        ChatRequest {
            model: "gemini-2.0-flash".to_string(),
            messages: vec![
                Message::system("You summarize logs."),
                Message::user("summarize this"),
            ],
            max_tokens: Some(512),
            temperature: None,
            json_mode,
        }
    }

    #[test]
    fn unit_generate_content_body_splits_system_instruction() {
        let body = build_generate_content_body(&request(true));
        assert_eq!(
            body.pointer("/systemInstruction/parts/0/text"),
            Some(&json!("You summarize logs."))
        );
        assert_eq!(body.pointer("/contents/0/role"), Some(&json!("user")));
        assert_eq!(
            body.pointer("/generationConfig/responseMimeType"),
            Some(&json!("application/json"))
        );
    }

    #[tokio::test]
    async fn integration_google_client_parses_candidates_and_usage() {
        let server = MockServer::start();
        let generate = server.mock(|when, then| {
            when.method(POST)
                .path("/models/gemini-2.0-flash:generateContent");
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "all quiet" }] },
                    "finishReason": "STOP"
                }],
                "usageMetadata": {
                    "promptTokenCount": 10,
                    "candidatesTokenCount": 4,
                    "totalTokenCount": 14
                }
            }));
        });

        let client = GoogleClient::new(GoogleConfig {
            api_base: server.base_url(),
            api_key: "test-key".to_string(),
            request_timeout_ms: 2_000,
            max_retries: 0,
        })
        .expect("client");

        let response = client.complete(request(false)).await.expect("completion");
        assert_eq!(response.message.content, "all quiet");
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
        assert_eq!(response.usage.total_tokens, 14);
        assert_eq!(generate.calls(), 1);
    }

    #[tokio::test]
    async fn integration_google_client_retries_rate_limited_requests() {
        let server = MockServer::start();
        let first = server.mock(|when, then| {
            when.method(POST)
                .path("/models/gemini-2.0-flash:generateContent")
                .header("x-rho-retry-attempt", "0");
            then.status(429).header("retry-after", "0").body("rate limit");
        });
        let second = server.mock(|when, then| {
            when.method(POST)
                .path("/models/gemini-2.0-flash:generateContent")
                .header("x-rho-retry-attempt", "1");
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "ok" }] }
                }]
            }));
        });

        let client = GoogleClient::new(GoogleConfig {
            api_base: server.base_url(),
            api_key: "test-key".to_string(),
            request_timeout_ms: 2_000,
            max_retries: 2,
        })
        .expect("client");

        let response = client.complete(request(false)).await.expect("completion");
        assert_eq!(response.message.content, "ok");
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
    }
}
