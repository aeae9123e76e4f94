//! Discord bridge runtime that routes operator commands into the log
//! pipeline.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::all::{
    ChannelId, CreateInteractionResponse, CreateInteractionResponseMessage, CreateMessage,
    GatewayIntents, Interaction, Message, Ready,
};
use serenity::client::{Client as SerenityClient, Context as SerenityContext, EventHandler};
use tracing::{info, warn};

use rho_access::{evaluate_role_gate, AccessDecision};
use rho_ai::AiDelegate;
use rho_railway::{LogFetcher, LogKind};

mod discord_command_helpers;
mod discord_context;
mod discord_render_helpers;

use discord_command_helpers::{
    command_for_component_id, last_error_entry, parse_bot_command, parse_log_limit,
};
use discord_context::{ComponentCommandContext, MessageCommandContext};
pub use discord_render_helpers::{chunk_log_lines, OutboundEmbed};

use discord_render_helpers::{
    debug_embed, format_log_line, help_embed, interpretation_embed, summary_embed,
};

/// Hard per-message character budget on Discord.
pub const DISCORD_MESSAGE_BUDGET: usize = 2_000;

const SUMMARIZE_FETCH_LIMIT: u32 = 50;
const INTERPRET_FETCH_LIMIT: u32 = 100;

const UNEXPECTED_ERROR_MESSAGE: &str =
    "Something unexpected went wrong while processing your request.";

#[derive(Clone)]
/// Runtime configuration for the Discord bridge.
pub struct DiscordBridgeRuntimeConfig {
    pub bot_token: String,
    pub channel_id: u64,
    pub admin_role_id: Option<String>,
    pub command_prefix: char,
    pub service_id: String,
    pub fetcher: LogFetcher,
    pub delegate: AiDelegate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Whether an event originated as a prefix command or a button press.
pub enum CommandSource {
    Message,
    Button,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The fixed command set the router dispatches over.
pub enum BotCommand {
    Start,
    Logs {
        kind: LogKind,
        limit_raw: Option<String>,
    },
    Summarize {
        kind: LogKind,
    },
    Interpret,
    Help,
    DebugId,
    Invalid {
        message: String,
    },
}

#[async_trait]
/// Capability surface handlers operate against. One adapter exists per
/// concrete Discord event type; handlers never see either directly.
pub trait CommandContext: Send + Sync {
    fn channel_id(&self) -> u64;
    fn principal_id(&self) -> String;
    fn source(&self) -> CommandSource;
    /// Resolves the acting principal's current role memberships. Called at
    /// authorization time, never cached.
    async fn principal_role_ids(&self) -> Result<Vec<String>>;
    async fn reply(&self, text: &str) -> Result<()>;
    async fn send_text(&self, text: &str) -> Result<()>;
    async fn send_embed(&self, embed: OutboundEmbed) -> Result<()>;
    async fn send_button_menu(&self, content: &str) -> Result<()>;
}

/// Stateless per-event command dispatch: authorization gate, then handler.
/// Nothing is shared between in-flight events and nothing is retained
/// across them.
pub struct CommandRouter {
    fetcher: LogFetcher,
    delegate: AiDelegate,
    service_id: String,
    admin_role_id: Option<String>,
    command_prefix: char,
}

impl CommandRouter {
    pub fn new(
        fetcher: LogFetcher,
        delegate: AiDelegate,
        service_id: impl Into<String>,
        admin_role_id: Option<String>,
        command_prefix: char,
    ) -> Self {
        Self {
            fetcher,
            delegate,
            service_id: service_id.into(),
            admin_role_id,
            command_prefix,
        }
    }

    /// Routes one event, containing every failure. Handler errors that
    /// escape the per-command paths are answered with a generic apology so
    /// no event goes unanswered and the process never crashes.
    pub async fn process_event(&self, ctx: &dyn CommandContext, command: BotCommand) {
        if let Err(error) = self.route(ctx, command).await {
            warn!(
                principal = %ctx.principal_id(),
                error = %format!("{error:#}"),
                "command handling failed unexpectedly"
            );
            if let Err(send_error) = ctx.reply(UNEXPECTED_ERROR_MESSAGE).await {
                warn!(error = %send_error, "failed to deliver error response");
            }
        }
    }

    async fn route(&self, ctx: &dyn CommandContext, command: BotCommand) -> Result<()> {
        let decision = self.authorize(ctx).await?;
        if !decision.is_allowed() {
            info!(
                principal = %ctx.principal_id(),
                reason_code = decision.reason_code(),
                "command denied"
            );
            let denial = match ctx.source() {
                CommandSource::Button => "Sorry, you don't have permission to use this button.",
                CommandSource::Message => "Sorry, you don't have permission to use this command.",
            };
            ctx.reply(denial).await?;
            return Ok(());
        }

        match command {
            BotCommand::Start => ctx.send_button_menu("What would you like to do?").await,
            BotCommand::Logs { kind, limit_raw } => {
                self.handle_logs(ctx, kind, limit_raw.as_deref()).await
            }
            BotCommand::Summarize { kind } => self.handle_summarize(ctx, kind).await,
            BotCommand::Interpret => self.handle_interpret(ctx).await,
            BotCommand::Help => {
                ctx.send_embed(help_embed(ctx.source(), self.command_prefix))
                    .await
            }
            BotCommand::DebugId => ctx.send_embed(debug_embed(&self.service_id)).await,
            BotCommand::Invalid { message } => ctx.reply(&message).await,
        }
    }

    async fn authorize(&self, ctx: &dyn CommandContext) -> Result<AccessDecision> {
        let Some(required) = self
            .admin_role_id
            .as_deref()
            .map(str::trim)
            .filter(|role| !role.is_empty())
        else {
            return Ok(AccessDecision::Allow {
                reason_code: "open_gate",
            });
        };

        let roles = ctx
            .principal_role_ids()
            .await
            .context("failed to resolve principal role memberships")?;
        Ok(evaluate_role_gate(Some(required), &roles))
    }

    async fn handle_logs(
        &self,
        ctx: &dyn CommandContext,
        kind: LogKind,
        limit_raw: Option<&str>,
    ) -> Result<()> {
        let limit = match parse_log_limit(limit_raw) {
            Ok(limit) => limit,
            Err(message) => {
                ctx.reply(&message).await?;
                return Ok(());
            }
        };

        ctx.reply(&format!(
            "Fetching the last {limit} `{}` logs...",
            kind.arg_name()
        ))
        .await?;

        let fetched = match self.fetcher.fetch(&self.service_id, kind, limit).await {
            Ok(fetched) => fetched,
            Err(error) => {
                ctx.reply(&error.to_string()).await?;
                return Ok(());
            }
        };

        if fetched.logs.is_empty() {
            ctx.send_text("No logs found.").await?;
            return Ok(());
        }

        let lines = fetched
            .logs
            .iter()
            .map(format_log_line)
            .collect::<Vec<_>>();
        for chunk in chunk_log_lines(&fetched.title, &lines, DISCORD_MESSAGE_BUDGET) {
            ctx.send_text(&chunk).await?;
        }
        Ok(())
    }

    async fn handle_summarize(&self, ctx: &dyn CommandContext, kind: LogKind) -> Result<()> {
        ctx.reply(&format!(
            "Summarizing the last {SUMMARIZE_FETCH_LIMIT} `{}` logs...",
            kind.arg_name()
        ))
        .await?;

        let fetched = match self
            .fetcher
            .fetch(&self.service_id, kind, SUMMARIZE_FETCH_LIMIT)
            .await
        {
            Ok(fetched) => fetched,
            Err(error) => {
                ctx.reply(&error.to_string()).await?;
                return Ok(());
            }
        };

        if fetched.logs.is_empty() {
            ctx.send_text("No logs to summarize.").await?;
            return Ok(());
        }

        let lines = fetched
            .logs
            .iter()
            .map(format_log_line)
            .collect::<Vec<_>>();
        match self.delegate.summarize(&lines).await {
            Ok(summary) => ctx.send_embed(summary_embed(kind, &summary.summary)).await,
            Err(error) => ctx.reply(&error.to_string()).await,
        }
    }

    async fn handle_interpret(&self, ctx: &dyn CommandContext) -> Result<()> {
        ctx.reply("Looking for the most recent error in the application logs...")
            .await?;

        let fetched = match self
            .fetcher
            .fetch(&self.service_id, LogKind::Runtime, INTERPRET_FETCH_LIMIT)
            .await
        {
            Ok(fetched) => fetched,
            Err(error) => {
                ctx.reply(&error.to_string()).await?;
                return Ok(());
            }
        };

        let Some(last_error) = last_error_entry(&fetched.logs) else {
            ctx.send_text("No recent errors found in the application logs.")
                .await?;
            return Ok(());
        };

        match self.delegate.interpret_error(&last_error.message).await {
            Ok(interpretation) => {
                ctx.send_embed(interpretation_embed(&last_error.message, &interpretation))
                    .await
            }
            Err(error) => ctx.reply(&error.to_string()).await,
        }
    }
}

struct DiscordBridgeHandler {
    router: Arc<CommandRouter>,
    channel_id: u64,
    command_prefix: char,
}

#[async_trait]
impl EventHandler for DiscordBridgeHandler {
    async fn ready(&self, ctx: SerenityContext, ready: Ready) {
        info!(bot_user = %ready.user.name, "discord bridge connected");
        let greeting = format!(
            "Online. Type `{prefix}start` for the button menu or `{prefix}help` for more information.",
            prefix = self.command_prefix
        );
        let channel = ChannelId::new(self.channel_id);
        if let Err(error) = channel
            .send_message(&ctx.http, CreateMessage::new().content(greeting))
            .await
        {
            warn!(error = %error, "failed to send startup greeting");
        }
    }

    async fn message(&self, ctx: SerenityContext, message: Message) {
        if message.author.bot {
            return;
        }
        if message.channel_id.get() != self.channel_id {
            return;
        }
        // Non-command chatter stays silent; only prefixed input routes.
        let Some(command) = parse_bot_command(&message.content, self.command_prefix) else {
            return;
        };
        let context = MessageCommandContext::new(ctx.http.clone(), message);
        self.router.process_event(&context, command).await;
    }

    async fn interaction_create(&self, ctx: SerenityContext, interaction: Interaction) {
        let Interaction::Component(component) = interaction else {
            return;
        };

        if component.channel_id.get() != self.channel_id {
            let response = CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content("Sorry, I can only operate in the authorized channel.")
                    .ephemeral(true),
            );
            if let Err(error) = component.create_response(&ctx.http, response).await {
                warn!(error = %error, "failed to answer out-of-channel interaction");
            }
            return;
        }

        let defer = CreateInteractionResponse::Defer(
            CreateInteractionResponseMessage::new().ephemeral(true),
        );
        if let Err(error) = component.create_response(&ctx.http, defer).await {
            warn!(error = %error, "failed to defer interaction");
            return;
        }

        let command = command_for_component_id(&component.data.custom_id);
        let context = ComponentCommandContext::new(ctx.http.clone(), component);
        match command {
            Some(command) => self.router.process_event(&context, command).await,
            // A button press is an explicit affordance; it always gets
            // feedback, unlike unrecognized plain messages.
            None => {
                if let Err(error) = context.reply("Unrecognized button command.").await {
                    warn!(error = %error, "failed to answer unrecognized button");
                }
            }
        }
    }
}

/// Connects the gateway and processes events until the client terminates.
pub async fn run_discord_bridge(config: DiscordBridgeRuntimeConfig) -> Result<()> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS;

    let handler = DiscordBridgeHandler {
        router: Arc::new(CommandRouter::new(
            config.fetcher.clone(),
            config.delegate.clone(),
            config.service_id.clone(),
            config.admin_role_id.clone(),
            config.command_prefix,
        )),
        channel_id: config.channel_id,
        command_prefix: config.command_prefix,
    };

    let mut client = SerenityClient::builder(&config.bot_token, intents)
        .event_handler(handler)
        .await
        .context("failed to build discord client")?;
    client.start().await.context("discord client terminated")
}
