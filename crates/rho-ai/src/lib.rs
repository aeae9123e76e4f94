//! LLM client surface and derived-text operations for Rho.
mod delegate;
mod google;
mod retry;
mod types;

pub use delegate::{AiDelegate, DelegateError, ErrorInterpretation, LogSummary};
pub use google::{GoogleClient, GoogleConfig};
pub use types::{AiError, ChatRequest, ChatResponse, ChatUsage, LlmClient, Message, MessageRole};
