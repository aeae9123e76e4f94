//! CLI argument models for the `rho` binary.
//!
//! Every flag is environment-backed so deployments can configure the relay
//! without a command line; missing required configuration fails startup
//! before any network activity.

use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "rho", version, about = "Railway deployment-log relay")]
pub struct Cli {
    #[command(subcommand)]
    pub command: RhoCommand,
}

#[derive(Debug, Subcommand)]
pub enum RhoCommand {
    /// Run the Discord bridge.
    Bot(BotArgs),
    /// Run the browser log console.
    Web(WebArgs),
}

#[derive(Debug, Args)]
pub struct SharedArgs {
    /// Railway GraphQL endpoint.
    #[arg(
        long,
        env = "RHO_RAILWAY_API_BASE",
        default_value = rho_railway::RAILWAY_API_ENDPOINT
    )]
    pub railway_api_base: String,

    /// Per-request HTTP timeout in milliseconds.
    #[arg(long, env = "RHO_REQUEST_TIMEOUT_MS", default_value_t = 30_000)]
    pub request_timeout_ms: u64,

    /// Upper bound on attempts per upstream request.
    #[arg(long, env = "RHO_RETRY_MAX_ATTEMPTS", default_value_t = 3)]
    pub retry_max_attempts: usize,

    /// Base delay for exponential retry backoff, in milliseconds.
    #[arg(long, env = "RHO_RETRY_BASE_DELAY_MS", default_value_t = 200)]
    pub retry_base_delay_ms: u64,
}

#[derive(Debug, Args)]
pub struct BotArgs {
    #[command(flatten)]
    pub shared: SharedArgs,

    /// Discord gateway credential.
    #[arg(long, env = "DISCORD_BOT_TOKEN", hide_env_values = true)]
    pub discord_bot_token: String,

    /// The only channel the relay operates in.
    #[arg(long, env = "DISCORD_CHANNEL_ID")]
    pub discord_channel_id: u64,

    /// Role required to issue commands. Unset leaves the gate open.
    #[arg(long, env = "DISCORD_ADMIN_ROLE_ID")]
    pub discord_admin_role_id: Option<String>,

    /// Prefix character for chat commands.
    #[arg(long, env = "RHO_COMMAND_PREFIX", default_value_t = '!')]
    pub command_prefix: char,

    /// Railway API credential.
    #[arg(long, env = "RAILWAY_API_TOKEN", hide_env_values = true)]
    pub railway_api_token: String,

    /// Service whose deployment logs are relayed.
    #[arg(long, env = "TARGET_SERVICE_ID")]
    pub target_service_id: String,

    /// Gemini API key for summaries and error interpretation.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: String,

    /// Model used for the derived-text operations.
    #[arg(long, env = "RHO_AI_MODEL", default_value = "gemini-2.0-flash")]
    pub ai_model: String,

    /// Gemini API endpoint.
    #[arg(
        long,
        env = "RHO_GOOGLE_API_BASE",
        default_value = "https://generativelanguage.googleapis.com/v1beta"
    )]
    pub google_api_base: String,
}

#[derive(Debug, Args)]
pub struct WebArgs {
    #[command(flatten)]
    pub shared: SharedArgs,

    /// Address the console binds to.
    #[arg(long, env = "RHO_WEB_BIND", default_value = "127.0.0.1:8787")]
    pub bind_addr: SocketAddr,

    /// Shared password gating the browser form.
    #[arg(long, env = "APP_PASSWORD", hide_env_values = true)]
    pub app_password: String,
}
