//! Browser-facing log console endpoint for Rho.
//!
//! The form posts per-request credentials plus a shared access password; the
//! password gate runs before any upstream contact, and the response carries
//! exactly one of a log window or an error string.

pub mod web_console;

pub use web_console::{
    run_web_console, web_console_router, FetchLogsRequest, FetchLogsResponse, WebConsoleConfig,
    WebConsoleState,
};
