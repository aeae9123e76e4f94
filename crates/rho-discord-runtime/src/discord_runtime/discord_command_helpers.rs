//! Prefix-command parsing, button-id mapping, and log-selection helpers.

use rho_railway::{LogEntry, LogKind, LogSeverity, MAX_LOG_LIMIT};

use super::BotCommand;

pub(super) const LOGS_DEFAULT_LIMIT: u32 = 20;

pub(super) const COMPONENT_SHOW_LOGS_APP: &str = "show_logs_app";
pub(super) const COMPONENT_SHOW_LOGS_DEPLOY: &str = "show_logs_deploy";
pub(super) const COMPONENT_SUMMARIZE_APP: &str = "summarize_app";
pub(super) const COMPONENT_INTERPRET_ERROR: &str = "interpret_error";
pub(super) const COMPONENT_SHOW_HELP: &str = "show_help";

/// Parses a chat message into a command. `None` means the message is not
/// addressed to the bot at all (no prefix, or a bare prefix) and must stay
/// unanswered; an unknown command behind the prefix becomes
/// [`BotCommand::Invalid`] so it still passes the authorization gate before
/// being answered.
pub(super) fn parse_bot_command(content: &str, prefix: char) -> Option<BotCommand> {
    let rest = content.trim().strip_prefix(prefix)?;
    let mut pieces = rest.trim().split_whitespace();
    let command = pieces.next()?;

    let parsed = match command.to_ascii_lowercase().as_str() {
        "start" => BotCommand::Start,
        "logs" => BotCommand::Logs {
            kind: LogKind::from_arg(pieces.next()),
            limit_raw: pieces.next().map(str::to_string),
        },
        "summarize" => BotCommand::Summarize {
            kind: LogKind::from_arg(pieces.next()),
        },
        "interpret" => BotCommand::Interpret,
        "help" => BotCommand::Help,
        "debugid" => BotCommand::DebugId,
        _ => BotCommand::Invalid {
            message: format!("Unrecognized command. Type `{prefix}help` or use the buttons."),
        },
    };
    Some(parsed)
}

/// Maps a button custom id onto its fixed command. Unknown ids return `None`
/// and the runtime answers them explicitly.
pub(super) fn command_for_component_id(custom_id: &str) -> Option<BotCommand> {
    match custom_id {
        COMPONENT_SHOW_LOGS_APP => Some(BotCommand::Logs {
            kind: LogKind::Runtime,
            limit_raw: None,
        }),
        COMPONENT_SHOW_LOGS_DEPLOY => Some(BotCommand::Logs {
            kind: LogKind::Build,
            limit_raw: None,
        }),
        COMPONENT_SUMMARIZE_APP => Some(BotCommand::Summarize {
            kind: LogKind::Runtime,
        }),
        COMPONENT_INTERPRET_ERROR => Some(BotCommand::Interpret),
        COMPONENT_SHOW_HELP => Some(BotCommand::Help),
        _ => None,
    }
}

/// Validates the display-count argument. Absent means the default window;
/// anything that does not parse to an integer in `[1, MAX_LOG_LIMIT]` is a
/// local validation failure and never reaches the fetcher.
pub(super) fn parse_log_limit(raw: Option<&str>) -> Result<u32, String> {
    let Some(raw) = raw else {
        return Ok(LOGS_DEFAULT_LIMIT);
    };
    match raw.parse::<u32>() {
        Ok(limit) if (1..=MAX_LOG_LIMIT).contains(&limit) => Ok(limit),
        _ => Err(format!(
            "Please enter a valid number of logs to show (between 1 and {MAX_LOG_LIMIT})."
        )),
    }
}

/// The last ERROR-severity entry by sequence order. Trailing entries of
/// other severities never mask an earlier error.
pub(super) fn last_error_entry(logs: &[LogEntry]) -> Option<&LogEntry> {
    logs.iter()
        .rev()
        .find(|entry| entry.severity == LogSeverity::Error)
}
