//! Discord bridge runtime for the Rho log relay.
//!
//! Routes operator prefix commands and button interactions through the
//! authorization gate into the fetch → chunk → send and fetch → AI → embed
//! pipelines.

pub mod discord_runtime;

pub use discord_runtime::{
    chunk_log_lines, run_discord_bridge, BotCommand, CommandContext, CommandRouter,
    CommandSource, DiscordBridgeRuntimeConfig, OutboundEmbed, DISCORD_MESSAGE_BUDGET,
};
