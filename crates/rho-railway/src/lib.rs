//! Railway log retrieval for Rho.
//!
//! Hosts the GraphQL client for the Railway public API, the log data model,
//! the ANSI normalizer applied to every fetched line, and the fetcher that
//! composes deployment resolution, log retrieval, and title rendering.

pub mod ansi;
pub mod fetcher;
pub mod railway_client;
pub mod types;

pub use ansi::strip_ansi;
pub use fetcher::{FetchedLogs, LogFetcher};
pub use railway_client::{RailwayClient, RailwayClientConfig, RAILWAY_API_ENDPOINT};
pub use types::{Deployment, FetchError, LogEntry, LogKind, LogSeverity, MAX_LOG_LIMIT};
