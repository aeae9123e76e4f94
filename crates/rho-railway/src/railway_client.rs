//! GraphQL client for the Railway public API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{Deployment, FetchError, LogEntry, LogKind, LogSeverity};

/// Production endpoint of the Railway GraphQL API.
pub const RAILWAY_API_ENDPOINT: &str = "https://backboard.railway.app/graphql/v2";

const LATEST_DEPLOYMENT_QUERY: &str = r"
query LatestDeployment($serviceId: String!) {
  deployments(first: 1, input: { serviceId: $serviceId }) {
    edges {
      node {
        id
        status
      }
    }
  }
}";

const DEPLOYMENT_LOGS_QUERY: &str = r"
query DeploymentLogs($deploymentId: String!, $limit: Int) {
  deploymentLogs(deploymentId: $deploymentId, limit: $limit) {
    message
    severity
    timestamp
  }
}";

const BUILD_LOGS_QUERY: &str = r"
query BuildLogs($deploymentId: String!, $limit: Int) {
  buildLogs(deploymentId: $deploymentId, limit: $limit) {
    message
    severity
    timestamp
  }
}";

#[derive(Debug, Clone)]
/// Connection and retry policy for the Railway client.
pub struct RailwayClientConfig {
    pub api_base: String,
    pub api_token: String,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

#[derive(Clone)]
/// reqwest-backed Railway GraphQL client. All failures convert into
/// [`FetchError`]; nothing escapes this boundary as a raw transport error.
pub struct RailwayClient {
    http: reqwest::Client,
    config: RailwayClientConfig,
}

#[derive(Debug, Deserialize)]
struct GraphQlEnvelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DeploymentsData {
    deployments: DeploymentConnection,
}

#[derive(Debug, Deserialize)]
struct DeploymentConnection {
    edges: Vec<DeploymentEdge>,
}

#[derive(Debug, Deserialize)]
struct DeploymentEdge {
    node: Deployment,
}

#[derive(Debug, Deserialize)]
struct RawLogEntry {
    message: String,
    severity: String,
    timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
struct DeploymentLogsData {
    #[serde(rename = "deploymentLogs")]
    deployment_logs: Vec<RawLogEntry>,
}

#[derive(Debug, Deserialize)]
struct BuildLogsData {
    #[serde(rename = "buildLogs")]
    build_logs: Vec<RawLogEntry>,
}

impl RailwayClient {
    pub fn new(config: RailwayClientConfig) -> Result<Self, FetchError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("Rho-log-relay"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .map_err(|error| FetchError::Transport(error.to_string()))?;

        Ok(Self {
            http,
            config: RailwayClientConfig {
                api_base: config.api_base.trim_end_matches('/').to_string(),
                api_token: config.api_token.trim().to_string(),
                request_timeout_ms: config.request_timeout_ms,
                retry_max_attempts: config.retry_max_attempts.max(1),
                retry_base_delay_ms: config.retry_base_delay_ms.max(1),
            },
        })
    }

    /// Resolves the most recent deployment of `service_id`, or `None` when
    /// the service has never deployed.
    pub async fn latest_deployment(
        &self,
        service_id: &str,
    ) -> Result<Option<Deployment>, FetchError> {
        let data: DeploymentsData = self
            .execute(
                "latest deployment",
                LATEST_DEPLOYMENT_QUERY,
                json!({ "serviceId": service_id }),
            )
            .await?;

        Ok(data
            .deployments
            .edges
            .into_iter()
            .next()
            .map(|edge| edge.node))
    }

    /// Fetches up to `limit` entries of the requested log stream. Severity
    /// strings are parsed leniently; messages are returned as-is (the
    /// fetcher owns normalization).
    pub async fn deployment_logs(
        &self,
        deployment_id: &str,
        kind: LogKind,
        limit: u32,
    ) -> Result<Vec<LogEntry>, FetchError> {
        let variables = json!({ "deploymentId": deployment_id, "limit": limit });
        let raw = match kind {
            LogKind::Runtime => {
                let data: DeploymentLogsData = self
                    .execute("deployment logs", DEPLOYMENT_LOGS_QUERY, variables)
                    .await?;
                data.deployment_logs
            }
            LogKind::Build => {
                let data: BuildLogsData =
                    self.execute("build logs", BUILD_LOGS_QUERY, variables).await?;
                data.build_logs
            }
        };

        Ok(raw
            .into_iter()
            .map(|entry| LogEntry {
                severity: LogSeverity::parse(&entry.severity),
                message: entry.message,
                timestamp: entry.timestamp,
            })
            .collect())
    }

    async fn execute<T>(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let payload = json!({ "query": query, "variables": variables });
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let response = self
                .http
                .post(&self.config.api_base)
                .bearer_auth(&self.config.api_token)
                .header("x-rho-retry-attempt", attempt.saturating_sub(1).to_string())
                .json(&payload)
                .send()
                .await;

            let response = match response {
                Ok(response) => response,
                Err(error) => {
                    if attempt < self.config.retry_max_attempts
                        && is_retryable_transport_error(&error)
                    {
                        tokio::time::sleep(retry_delay(
                            self.config.retry_base_delay_ms,
                            attempt,
                            None,
                        ))
                        .await;
                        continue;
                    }
                    return Err(FetchError::Transport(format!(
                        "{operation} request failed: {error}"
                    )));
                }
            };

            let status = response.status();
            if !status.is_success() {
                let retry_after = parse_retry_after(response.headers());
                if attempt < self.config.retry_max_attempts && is_retryable_status(status.as_u16())
                {
                    tokio::time::sleep(retry_delay(
                        self.config.retry_base_delay_ms,
                        attempt,
                        retry_after,
                    ))
                    .await;
                    continue;
                }
                return Err(FetchError::Transport(format!(
                    "{operation} failed with status {}",
                    status.as_u16()
                )));
            }

            let envelope = response.json::<GraphQlEnvelope>().await.map_err(|error| {
                FetchError::Transport(format!("failed to decode {operation} response: {error}"))
            })?;

            if let Some(error) = envelope.errors.into_iter().next() {
                return Err(FetchError::GraphQl(error.message));
            }

            let data = envelope.data.ok_or_else(|| {
                FetchError::Transport(format!("{operation} response carried no data"))
            })?;

            return serde_json::from_value(data).map_err(|error| {
                FetchError::Transport(format!("failed to decode {operation} data: {error}"))
            });
        }
    }
}

fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

fn is_retryable_transport_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request() || error.is_body()
}

fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}

fn retry_delay(base_delay_ms: u64, attempt: usize, retry_after_seconds: Option<u64>) -> Duration {
    if let Some(retry_after_seconds) = retry_after_seconds {
        return Duration::from_secs(retry_after_seconds);
    }
    let exponent = attempt.saturating_sub(1).min(6) as u32;
    Duration::from_millis(base_delay_ms.max(1).saturating_mul(2_u64.pow(exponent)))
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::{retry_delay, RailwayClient, RailwayClientConfig};
    use crate::types::{FetchError, LogKind, LogSeverity};
    use std::time::Duration;

    fn test_client(base_url: &str) -> RailwayClient {
        RailwayClient::new(RailwayClientConfig {
            api_base: base_url.to_string(),
            api_token: "rw-test-token".to_string(),
            request_timeout_ms: 2_000,
            retry_max_attempts: 3,
            retry_base_delay_ms: 1,
        })
        .expect("client")
    }

    #[test]
    fn unit_retry_delay_prefers_retry_after_and_backs_off_exponentially() {
        assert_eq!(retry_delay(50, 1, Some(2)), Duration::from_secs(2));
        assert_eq!(retry_delay(100, 1, None), Duration::from_millis(100));
        assert_eq!(retry_delay(100, 2, None), Duration::from_millis(200));
        assert_eq!(retry_delay(100, 3, None), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn integration_latest_deployment_resolves_first_edge() {
        let server = MockServer::start();
        let deployments = server.mock(|when, then| {
            when.method(POST).body_includes("LatestDeployment");
            then.status(200).json_body(json!({
                "data": {
                    "deployments": {
                        "edges": [
                            { "node": { "id": "dep-1234567890", "status": "SUCCESS" } }
                        ]
                    }
                }
            }));
        });

        let deployment = test_client(&server.base_url())
            .latest_deployment("svc-1")
            .await
            .expect("query")
            .expect("deployment present");
        assert_eq!(deployment.id, "dep-1234567890");
        assert_eq!(deployment.status, "SUCCESS");
        assert_eq!(deployments.calls(), 1);
    }

    #[tokio::test]
    async fn integration_latest_deployment_reports_absence_as_none() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).body_includes("LatestDeployment");
            then.status(200)
                .json_body(json!({ "data": { "deployments": { "edges": [] } } }));
        });

        let deployment = test_client(&server.base_url())
            .latest_deployment("svc-1")
            .await
            .expect("query");
        assert!(deployment.is_none());
    }

    #[tokio::test]
    async fn integration_deployment_logs_parse_severity_leniently() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).body_includes("DeploymentLogs");
            then.status(200).json_body(json!({
                "data": {
                    "deploymentLogs": [
                        {
                            "message": "listening on :8080",
                            "severity": "info",
                            "timestamp": "2026-08-01T10:00:00Z"
                        },
                        {
                            "message": "panic: boom",
                            "severity": "SEVERE",
                            "timestamp": "2026-08-01T10:00:01Z"
                        }
                    ]
                }
            }));
        });

        let logs = test_client(&server.base_url())
            .deployment_logs("dep-1", LogKind::Runtime, 2)
            .await
            .expect("logs");
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].severity, LogSeverity::Info);
        assert_eq!(logs[1].severity, LogSeverity::Info);
        assert_eq!(logs[1].message, "panic: boom");
    }

    #[tokio::test]
    async fn integration_graphql_errors_surface_first_message_without_retry() {
        let server = MockServer::start();
        let errored = server.mock(|when, then| {
            when.method(POST).body_includes("BuildLogs");
            then.status(200).json_body(json!({
                "data": null,
                "errors": [
                    { "message": "Not Authorized" },
                    { "message": "secondary" }
                ]
            }));
        });

        let error = test_client(&server.base_url())
            .deployment_logs("dep-1", LogKind::Build, 10)
            .await
            .expect_err("graphql errors must fail");
        assert_eq!(error.to_string(), "GraphQL Error: Not Authorized");
        assert_eq!(errored.calls(), 1);
    }

    #[tokio::test]
    async fn integration_transport_retries_rate_limits_then_succeeds() {
        let server = MockServer::start();
        let first = server.mock(|when, then| {
            when.method(POST).header("x-rho-retry-attempt", "0");
            then.status(429).header("retry-after", "0").body("slow down");
        });
        let second = server.mock(|when, then| {
            when.method(POST).header("x-rho-retry-attempt", "1");
            then.status(200)
                .json_body(json!({ "data": { "deployments": { "edges": [] } } }));
        });

        let deployment = test_client(&server.base_url())
            .latest_deployment("svc-1")
            .await
            .expect("query eventually succeeds");
        assert!(deployment.is_none());
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
    }

    #[tokio::test]
    async fn regression_non_retryable_status_becomes_transport_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(401).body("bad token");
        });

        let error = test_client(&server.base_url())
            .latest_deployment("svc-1")
            .await
            .expect_err("401 must fail");
        assert!(matches!(error, FetchError::Transport(_)));
        assert!(error.to_string().starts_with("Failed to fetch logs:"));
    }
}
