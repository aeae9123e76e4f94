//! Entry point for the `rho` log relay.

mod cli_args;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use cli_args::{BotArgs, Cli, RhoCommand, SharedArgs, WebArgs};
use rho_ai::{AiDelegate, GoogleClient, GoogleConfig};
use rho_discord_runtime::{run_discord_bridge, DiscordBridgeRuntimeConfig};
use rho_railway::{LogFetcher, RailwayClient, RailwayClientConfig};
use rho_web::{run_web_console, WebConsoleConfig};

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn railway_client_config(shared: &SharedArgs, api_token: String) -> RailwayClientConfig {
    RailwayClientConfig {
        api_base: shared.railway_api_base.clone(),
        api_token,
        request_timeout_ms: shared.request_timeout_ms,
        retry_max_attempts: shared.retry_max_attempts,
        retry_base_delay_ms: shared.retry_base_delay_ms,
    }
}

async fn run_bot(args: BotArgs) -> Result<()> {
    let client = RailwayClient::new(railway_client_config(
        &args.shared,
        args.railway_api_token.clone(),
    ))?;
    let google = GoogleClient::new(GoogleConfig {
        api_base: args.google_api_base.clone(),
        api_key: args.gemini_api_key.clone(),
        request_timeout_ms: args.shared.request_timeout_ms,
        max_retries: args.shared.retry_max_attempts,
    })?;

    run_discord_bridge(DiscordBridgeRuntimeConfig {
        bot_token: args.discord_bot_token,
        channel_id: args.discord_channel_id,
        admin_role_id: args.discord_admin_role_id,
        command_prefix: args.command_prefix,
        service_id: args.target_service_id,
        fetcher: LogFetcher::new(client),
        delegate: AiDelegate::new(Arc::new(google), args.ai_model),
    })
    .await
}

async fn run_web(args: WebArgs) -> Result<()> {
    run_web_console(WebConsoleConfig {
        bind_addr: args.bind_addr,
        access_password: args.app_password,
        railway_api_base: args.shared.railway_api_base,
        request_timeout_ms: args.shared.request_timeout_ms,
        retry_max_attempts: args.shared.retry_max_attempts,
        retry_base_delay_ms: args.shared.retry_base_delay_ms,
    })
    .await
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        RhoCommand::Bot(args) => run_bot(args).await,
        RhoCommand::Web(args) => run_web(args).await,
    }
}
