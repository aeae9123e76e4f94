//! Deployment resolution and log retrieval composed into one fetch.

use tracing::debug;

use crate::ansi::strip_ansi;
use crate::railway_client::RailwayClient;
use crate::types::{Deployment, FetchError, LogEntry, LogKind, MAX_LOG_LIMIT};

#[derive(Debug, Clone)]
/// Successful fetch: an ordered log window plus the rendered title.
pub struct FetchedLogs {
    pub deployment: Deployment,
    pub logs: Vec<LogEntry>,
    pub title: String,
}

#[derive(Clone)]
/// Fetches a window of logs for a service. Each call re-resolves the latest
/// deployment, so results always reflect the deployment current at call
/// time.
pub struct LogFetcher {
    client: RailwayClient,
}

impl LogFetcher {
    pub fn new(client: RailwayClient) -> Self {
        Self { client }
    }

    pub async fn fetch(
        &self,
        service_id: &str,
        kind: LogKind,
        limit: u32,
    ) -> Result<FetchedLogs, FetchError> {
        if limit == 0 || limit > MAX_LOG_LIMIT {
            return Err(FetchError::InvalidLimit(limit));
        }

        let deployment = self
            .client
            .latest_deployment(service_id)
            .await?
            .ok_or(FetchError::NoActiveDeployments)?;
        debug!(
            deployment_id = %deployment.id,
            status = %deployment.status,
            "resolved latest deployment"
        );

        let mut logs = self
            .client
            .deployment_logs(&deployment.id, kind, limit)
            .await?;
        for entry in &mut logs {
            entry.message = strip_ansi(&entry.message);
        }
        // The upstream is assumed chronological but does not guarantee it;
        // the interpret scan relies on ordering, so sort defensively.
        logs.sort_by_key(|entry| entry.timestamp);

        let title = format!("{} Logs for {}", kind.title_label(), deployment.short_id());

        Ok(FetchedLogs {
            deployment,
            logs,
            title,
        })
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::LogFetcher;
    use crate::railway_client::{RailwayClient, RailwayClientConfig};
    use crate::types::{FetchError, LogKind, LogSeverity};

    fn fetcher(base_url: &str) -> LogFetcher {
        LogFetcher::new(
            RailwayClient::new(RailwayClientConfig {
                api_base: base_url.to_string(),
                api_token: "rw-test-token".to_string(),
                request_timeout_ms: 2_000,
                retry_max_attempts: 1,
                retry_base_delay_ms: 1,
            })
            .expect("client"),
        )
    }

    fn mock_latest_deployment(server: &MockServer, deployment_id: &str) {
        let body = json!({
            "data": {
                "deployments": {
                    "edges": [
                        { "node": { "id": deployment_id, "status": "SUCCESS" } }
                    ]
                }
            }
        });
        server.mock(move |when, then| {
            when.method(POST).body_includes("LatestDeployment");
            then.status(200).json_body(body.clone());
        });
    }

    #[tokio::test]
    async fn unit_fetch_rejects_out_of_range_limits_before_any_network_call() {
        let server = MockServer::start();
        let upstream = server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({ "data": {} }));
        });
        let fetcher = fetcher(&server.base_url());

        for limit in [0_u32, 101] {
            let error = fetcher
                .fetch("svc-1", LogKind::Runtime, limit)
                .await
                .expect_err("out-of-range limit must fail");
            assert!(matches!(error, FetchError::InvalidLimit(_)));
        }
        upstream.assert_calls(0);
    }

    #[tokio::test]
    async fn functional_fetch_orders_normalizes_and_titles_the_window() {
        let server = MockServer::start();
        mock_latest_deployment(&server, "f00dcafe-77aa-4b10");
        server.mock(|when, then| {
            when.method(POST).body_includes("DeploymentLogs");
            then.status(200).json_body(json!({
                "data": {
                    "deploymentLogs": [
                        {
                            "message": "\u{1b}[31mboom\u{1b}[0m",
                            "severity": "ERROR",
                            "timestamp": "2026-08-01T10:00:01Z"
                        },
                        {
                            "message": "booting",
                            "severity": "INFO",
                            "timestamp": "2026-08-01T10:00:00Z"
                        },
                        {
                            "message": "retrying",
                            "severity": "WARN",
                            "timestamp": "2026-08-01T10:00:02Z"
                        }
                    ]
                }
            }));
        });

        let fetched = fetcher(&server.base_url())
            .fetch("svc-1", LogKind::Runtime, 3)
            .await
            .expect("fetch");

        assert_eq!(fetched.title, "Application Logs for f00dcafe");
        assert_eq!(fetched.logs.len(), 3);
        assert_eq!(fetched.logs[0].message, "booting");
        assert_eq!(fetched.logs[1].message, "boom");
        assert_eq!(fetched.logs[1].severity, LogSeverity::Error);
        assert_eq!(fetched.logs[2].message, "retrying");
    }

    #[tokio::test]
    async fn functional_fetch_reports_missing_deployments_as_business_outcome() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).body_includes("LatestDeployment");
            then.status(200)
                .json_body(json!({ "data": { "deployments": { "edges": [] } } }));
        });
        let logs_query = server.mock(|when, then| {
            when.method(POST).body_includes("DeploymentLogs");
            then.status(200).json_body(json!({ "data": {} }));
        });

        let error = fetcher(&server.base_url())
            .fetch("svc-1", LogKind::Runtime, 20)
            .await
            .expect_err("missing deployment must fail");
        assert_eq!(error.to_string(), "No active deployments found.");
        logs_query.assert_calls(0);
    }

    #[tokio::test]
    async fn regression_build_kind_targets_build_logs_and_build_title() {
        let server = MockServer::start();
        mock_latest_deployment(&server, "0a1b2c3d4e5f");
        let build_logs = server.mock(|when, then| {
            when.method(POST).body_includes("BuildLogs");
            then.status(200).json_body(json!({
                "data": {
                    "buildLogs": [
                        {
                            "message": "compiling",
                            "severity": "INFO",
                            "timestamp": "2026-08-01T09:59:00Z"
                        }
                    ]
                }
            }));
        });

        let fetched = fetcher(&server.base_url())
            .fetch("svc-1", LogKind::Build, 1)
            .await
            .expect("fetch");
        assert_eq!(fetched.title, "Deployment Logs for 0a1b2c3d");
        assert_eq!(build_logs.calls(), 1);
    }
}
