//! Concrete [`CommandContext`] adapters over the two Discord event types.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::all::{
    ButtonStyle, Colour, ComponentInteraction, CreateActionRow, CreateButton, CreateEmbed,
    CreateMessage, EditInteractionResponse, GuildId, Message, Timestamp, UserId,
};
use serenity::http::Http;

use super::discord_command_helpers::{
    COMPONENT_INTERPRET_ERROR, COMPONENT_SHOW_HELP, COMPONENT_SHOW_LOGS_APP,
    COMPONENT_SHOW_LOGS_DEPLOY, COMPONENT_SUMMARIZE_APP,
};
use super::discord_render_helpers::OutboundEmbed;
use super::{CommandContext, CommandSource};

/// Adapter over an inbound prefix-command message.
pub(super) struct MessageCommandContext {
    http: Arc<Http>,
    message: Message,
}

impl MessageCommandContext {
    pub(super) fn new(http: Arc<Http>, message: Message) -> Self {
        Self { http, message }
    }
}

#[async_trait]
impl CommandContext for MessageCommandContext {
    fn channel_id(&self) -> u64 {
        self.message.channel_id.get()
    }

    fn principal_id(&self) -> String {
        self.message.author.id.to_string()
    }

    fn source(&self) -> CommandSource {
        CommandSource::Message
    }

    async fn principal_role_ids(&self) -> Result<Vec<String>> {
        resolve_member_roles(&self.http, self.message.guild_id, self.message.author.id).await
    }

    async fn reply(&self, text: &str) -> Result<()> {
        self.message
            .reply(&self.http, text)
            .await
            .context("failed to reply to message")?;
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        send_to_channel(&self.http, &self.message, CreateMessage::new().content(text)).await
    }

    async fn send_embed(&self, embed: OutboundEmbed) -> Result<()> {
        send_to_channel(
            &self.http,
            &self.message,
            CreateMessage::new().embed(to_create_embed(embed)),
        )
        .await
    }

    async fn send_button_menu(&self, content: &str) -> Result<()> {
        send_to_channel(
            &self.http,
            &self.message,
            CreateMessage::new()
                .content(content)
                .components(button_menu_components()),
        )
        .await
    }
}

/// Adapter over a deferred button interaction. Replies edit the deferred
/// ephemeral response; channel sends post publicly like message commands.
pub(super) struct ComponentCommandContext {
    http: Arc<Http>,
    interaction: ComponentInteraction,
}

impl ComponentCommandContext {
    pub(super) fn new(http: Arc<Http>, interaction: ComponentInteraction) -> Self {
        Self { http, interaction }
    }
}

#[async_trait]
impl CommandContext for ComponentCommandContext {
    fn channel_id(&self) -> u64 {
        self.interaction.channel_id.get()
    }

    fn principal_id(&self) -> String {
        self.interaction.user.id.to_string()
    }

    fn source(&self) -> CommandSource {
        CommandSource::Button
    }

    async fn principal_role_ids(&self) -> Result<Vec<String>> {
        resolve_member_roles(&self.http, self.interaction.guild_id, self.interaction.user.id).await
    }

    async fn reply(&self, text: &str) -> Result<()> {
        self.interaction
            .edit_response(&self.http, EditInteractionResponse::new().content(text))
            .await
            .context("failed to edit interaction response")?;
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        self.interaction
            .channel_id
            .send_message(&self.http, CreateMessage::new().content(text))
            .await
            .context("failed to send channel message")?;
        Ok(())
    }

    async fn send_embed(&self, embed: OutboundEmbed) -> Result<()> {
        self.interaction
            .channel_id
            .send_message(
                &self.http,
                CreateMessage::new().embed(to_create_embed(embed)),
            )
            .await
            .context("failed to send channel embed")?;
        Ok(())
    }

    async fn send_button_menu(&self, content: &str) -> Result<()> {
        self.interaction
            .channel_id
            .send_message(
                &self.http,
                CreateMessage::new()
                    .content(content)
                    .components(button_menu_components()),
            )
            .await
            .context("failed to send button menu")?;
        Ok(())
    }
}

/// Resolves current role memberships through the API at call time. Direct
/// messages have no guild and therefore no roles.
async fn resolve_member_roles(
    http: &Arc<Http>,
    guild_id: Option<GuildId>,
    user_id: UserId,
) -> Result<Vec<String>> {
    let Some(guild_id) = guild_id else {
        return Ok(Vec::new());
    };
    let member = guild_id
        .member(http, user_id)
        .await
        .context("failed to resolve guild member")?;
    Ok(member.roles.iter().map(|role| role.to_string()).collect())
}

async fn send_to_channel(http: &Arc<Http>, message: &Message, builder: CreateMessage) -> Result<()> {
    message
        .channel_id
        .send_message(http, builder)
        .await
        .context("failed to send channel message")?;
    Ok(())
}

fn to_create_embed(embed: OutboundEmbed) -> CreateEmbed {
    let mut builder = CreateEmbed::new()
        .title(embed.title)
        .colour(Colour::new(embed.colour));
    if let Some(description) = embed.description {
        builder = builder.description(description);
    }
    for (name, value) in embed.fields {
        builder = builder.field(name, value, false);
    }
    if embed.timestamp {
        builder = builder.timestamp(Timestamp::now());
    }
    builder
}

fn button_menu_components() -> Vec<CreateActionRow> {
    vec![CreateActionRow::Buttons(vec![
        CreateButton::new(COMPONENT_SHOW_LOGS_APP)
            .label("📄 App Logs")
            .style(ButtonStyle::Primary),
        CreateButton::new(COMPONENT_SHOW_LOGS_DEPLOY)
            .label("🚀 Deploy Logs")
            .style(ButtonStyle::Primary),
        CreateButton::new(COMPONENT_SUMMARIZE_APP)
            .label("✍️ Summarize App")
            .style(ButtonStyle::Secondary),
        CreateButton::new(COMPONENT_INTERPRET_ERROR)
            .label("🐛 Interpret Error")
            .style(ButtonStyle::Danger),
        CreateButton::new(COMPONENT_SHOW_HELP)
            .label("❓ Help")
            .style(ButtonStyle::Secondary),
    ])]
}
