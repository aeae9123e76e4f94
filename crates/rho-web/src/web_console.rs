//! HTTP endpoint backing the browser log console form.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use rho_railway::{
    LogEntry, LogFetcher, LogKind, RailwayClient, RailwayClientConfig,
};

/// Fetch window used when the form does not request a specific count.
const WEB_FETCH_LIMIT: u32 = 100;

#[derive(Debug, Clone)]
/// Configuration for the web console service.
pub struct WebConsoleConfig {
    pub bind_addr: SocketAddr,
    pub access_password: String,
    pub railway_api_base: String,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

/// Shared state handed to the axum handlers.
pub struct WebConsoleState {
    config: WebConsoleConfig,
}

impl WebConsoleState {
    pub fn new(config: WebConsoleConfig) -> Self {
        Self { config }
    }
}

#[derive(Debug, Deserialize)]
/// The browser form submission. Credentials travel per request; nothing is
/// retained server-side.
pub struct FetchLogsRequest {
    pub api_token: String,
    pub service_id: String,
    pub password: String,
    #[serde(default)]
    pub log_kind: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
/// Exactly one arm is ever populated.
pub enum FetchLogsResponse {
    Success { logs: Vec<LogEntry>, title: String },
    Failure { error: String },
}

pub fn web_console_router(state: Arc<WebConsoleState>) -> Router {
    Router::new()
        .route("/api/logs", post(handle_fetch_logs))
        .with_state(state)
}

async fn handle_fetch_logs(
    State(state): State<Arc<WebConsoleState>>,
    Json(request): Json<FetchLogsRequest>,
) -> Json<FetchLogsResponse> {
    Json(fetch_logs_for_request(&state, request).await)
}

/// Validation order matters: required-field and password checks both resolve
/// locally, before any upstream call is made.
async fn fetch_logs_for_request(
    state: &WebConsoleState,
    request: FetchLogsRequest,
) -> FetchLogsResponse {
    if request.api_token.trim().is_empty()
        || request.service_id.trim().is_empty()
        || request.password.is_empty()
    {
        return FetchLogsResponse::Failure {
            error: "Invalid input.".to_string(),
        };
    }

    if request.password != state.config.access_password {
        return FetchLogsResponse::Failure {
            error: "Invalid password.".to_string(),
        };
    }

    let client = match RailwayClient::new(RailwayClientConfig {
        api_base: state.config.railway_api_base.clone(),
        api_token: request.api_token.clone(),
        request_timeout_ms: state.config.request_timeout_ms,
        retry_max_attempts: state.config.retry_max_attempts,
        retry_base_delay_ms: state.config.retry_base_delay_ms,
    }) {
        Ok(client) => client,
        Err(error) => {
            return FetchLogsResponse::Failure {
                error: error.to_string(),
            }
        }
    };

    let kind = LogKind::from_arg(request.log_kind.as_deref());
    let limit = request.limit.unwrap_or(WEB_FETCH_LIMIT);
    match LogFetcher::new(client)
        .fetch(&request.service_id, kind, limit)
        .await
    {
        Ok(fetched) => FetchLogsResponse::Success {
            logs: fetched.logs,
            title: fetched.title,
        },
        Err(error) => FetchLogsResponse::Failure {
            error: error.to_string(),
        },
    }
}

/// Binds and serves the console until the server terminates.
pub async fn run_web_console(config: WebConsoleConfig) -> Result<()> {
    let bind_addr = config.bind_addr;
    let state = Arc::new(WebConsoleState::new(config));
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, "web console listening");
    axum::serve(listener, web_console_router(state))
        .await
        .context("web console server terminated")
}
