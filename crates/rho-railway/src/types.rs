use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on the number of log entries a single fetch may request.
pub const MAX_LOG_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
/// Severity attached to an upstream log record.
pub enum LogSeverity {
    Info,
    Warn,
    Error,
    Debug,
}

impl LogSeverity {
    /// Parses the upstream severity string. Railway reports severities as
    /// free-form text; anything unrecognized degrades to `Info` rather than
    /// failing the whole fetch.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "WARN" | "WARNING" => Self::Warn,
            "ERROR" | "ERR" => Self::Error,
            "DEBUG" => Self::Debug,
            _ => Self::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Debug => "DEBUG",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A single normalized log record.
pub struct LogEntry {
    pub message: String,
    pub severity: LogSeverity,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// The deployment a log window was resolved against.
pub struct Deployment {
    pub id: String,
    pub status: String,
}

impl Deployment {
    /// Short identifier used in user-facing titles.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(8) {
            Some((idx, _)) => &self.id[..idx],
            None => self.id.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Which log stream a fetch targets.
pub enum LogKind {
    /// Run-time service logs ("app").
    Runtime,
    /// Build-phase logs ("deploy").
    Build,
}

impl LogKind {
    /// Resolves a command argument. Defaults to runtime logs unless the
    /// argument is exactly `deploy`.
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            Some("deploy") => Self::Build,
            _ => Self::Runtime,
        }
    }

    pub fn arg_name(&self) -> &'static str {
        match self {
            Self::Runtime => "app",
            Self::Build => "deploy",
        }
    }

    pub fn title_label(&self) -> &'static str {
        match self {
            Self::Runtime => "Application",
            Self::Build => "Deployment",
        }
    }
}

#[derive(Debug, Error)]
/// Failure arm of a fetch. Every variant carries the exact text shown to the
/// operator; callers render `Display` verbatim.
pub enum FetchError {
    #[error("Please provide a number of logs between 1 and {MAX_LOG_LIMIT}.")]
    InvalidLimit(u32),
    #[error("No active deployments found.")]
    NoActiveDeployments,
    #[error("GraphQL Error: {0}")]
    GraphQl(String),
    #[error("Failed to fetch logs: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::{Deployment, LogKind, LogSeverity};

    #[test]
    fn unit_severity_parse_degrades_unknown_values_to_info() {
        assert_eq!(LogSeverity::parse("error"), LogSeverity::Error);
        assert_eq!(LogSeverity::parse("WARNING"), LogSeverity::Warn);
        assert_eq!(LogSeverity::parse("debug"), LogSeverity::Debug);
        assert_eq!(LogSeverity::parse("fatal"), LogSeverity::Info);
        assert_eq!(LogSeverity::parse(""), LogSeverity::Info);
    }

    #[test]
    fn unit_log_kind_defaults_to_runtime_unless_exactly_deploy() {
        assert_eq!(LogKind::from_arg(None), LogKind::Runtime);
        assert_eq!(LogKind::from_arg(Some("app")), LogKind::Runtime);
        assert_eq!(LogKind::from_arg(Some("Deploy")), LogKind::Runtime);
        assert_eq!(LogKind::from_arg(Some("deploy")), LogKind::Build);
    }

    #[test]
    fn unit_deployment_short_id_clamps_to_available_length() {
        let deployment = Deployment {
            id: "abcdef1234567890".to_string(),
            status: "SUCCESS".to_string(),
        };
        assert_eq!(deployment.short_id(), "abcdef12");

        let short = Deployment {
            id: "abc".to_string(),
            status: "SUCCESS".to_string(),
        };
        assert_eq!(short.short_id(), "abc");
    }
}
