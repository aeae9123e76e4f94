use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::{AiError, ChatRequest, LlmClient, Message};

const SUMMARIZE_SYSTEM_PROMPT: &str = "You are an expert at summarizing deployment logs. \
Summarize the provided logs, highlighting the key events and problems.";

const INTERPRET_SYSTEM_PROMPT: &str = "You are an expert in debugging service deployments. \
Given an error message from the logs, provide a clear interpretation of the error and \
suggest possible solutions. Respond with a JSON object with exactly two string fields: \
\"interpretation\" and \"possibleSolutions\".";

const DERIVED_TEXT_MAX_TOKENS: u32 = 1_024;

#[derive(Debug, Clone, PartialEq)]
/// Derived summary of a log window.
pub struct LogSummary {
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq)]
/// Derived reading of a single error log line.
pub struct ErrorInterpretation {
    pub interpretation: String,
    pub possible_solutions: String,
}

#[derive(Debug, Error)]
/// Failure envelope for the derived-text operations.
pub enum DelegateError {
    #[error("No logs to summarize.")]
    EmptyLogs,
    #[error("No log message to interpret.")]
    EmptyMessage,
    #[error("AI summarization failed: {0}")]
    SummarizationFailed(String),
    #[error("AI interpretation failed: {0}")]
    InterpretationFailed(String),
}

#[derive(Clone)]
/// Wraps the model client behind the two derived-text operations the
/// pipeline needs. Empty input is rejected locally, before any network call.
pub struct AiDelegate {
    client: Arc<dyn LlmClient>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct InterpretationPayload {
    interpretation: String,
    #[serde(rename = "possibleSolutions")]
    possible_solutions: String,
}

impl AiDelegate {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub async fn summarize(&self, log_lines: &[String]) -> Result<LogSummary, DelegateError> {
        if log_lines.iter().all(|line| line.trim().is_empty()) {
            return Err(DelegateError::EmptyLogs);
        }

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(SUMMARIZE_SYSTEM_PROMPT),
                Message::user(format!("Logs:\n{}", log_lines.join("\n"))),
            ],
            max_tokens: Some(DERIVED_TEXT_MAX_TOKENS),
            temperature: None,
            json_mode: false,
        };

        let response = self
            .client
            .complete(request)
            .await
            .map_err(|error| DelegateError::SummarizationFailed(describe_ai_error(&error)))?;

        let summary = response.message.content.trim().to_string();
        if summary.is_empty() {
            return Err(DelegateError::SummarizationFailed(
                "model returned an empty summary".to_string(),
            ));
        }

        Ok(LogSummary { summary })
    }

    pub async fn interpret_error(
        &self,
        message: &str,
    ) -> Result<ErrorInterpretation, DelegateError> {
        if message.trim().is_empty() {
            return Err(DelegateError::EmptyMessage);
        }

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(INTERPRET_SYSTEM_PROMPT),
                Message::user(format!("Error Message: {message}")),
            ],
            max_tokens: Some(DERIVED_TEXT_MAX_TOKENS),
            temperature: None,
            json_mode: true,
        };

        let response = self
            .client
            .complete(request)
            .await
            .map_err(|error| DelegateError::InterpretationFailed(describe_ai_error(&error)))?;

        let payload: InterpretationPayload =
            serde_json::from_str(unwrap_code_fence(&response.message.content)).map_err(
                |error| {
                    DelegateError::InterpretationFailed(format!(
                        "model returned undecodable output: {error}"
                    ))
                },
            )?;

        Ok(ErrorInterpretation {
            interpretation: payload.interpretation,
            possible_solutions: payload.possible_solutions,
        })
    }
}

fn describe_ai_error(error: &AiError) -> String {
    match error {
        AiError::HttpStatus { status, .. } => format!("provider returned status {status}"),
        other => other.to_string(),
    }
}

/// Strips a surrounding markdown code fence, which some models emit even in
/// JSON response mode.
fn unwrap_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
