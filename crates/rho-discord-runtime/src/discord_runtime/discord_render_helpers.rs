//! Log-line formatting, message chunking, and embed construction.

use rho_ai::ErrorInterpretation;
use rho_core::truncate_with_ellipsis;
use rho_railway::{LogEntry, LogKind};

use super::CommandSource;

const SUMMARY_EMBED_COLOUR: u32 = 0x8B5CF6;
const INTERPRETATION_EMBED_COLOUR: u32 = 0xEF4444;
const HELP_EMBED_COLOUR: u32 = 0x10B981;
const DEBUG_EMBED_COLOUR: u32 = 0xFBBF24;

const EMBED_FIELD_CODE_BUDGET: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Platform-neutral rich message. Adapters translate this into the concrete
/// Discord embed type; handlers and tests only ever see this shape.
pub struct OutboundEmbed {
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<(String, String)>,
    pub colour: u32,
    pub timestamp: bool,
}

/// One display line per log entry: local wall-clock time, severity, message.
pub(super) fn format_log_line(entry: &LogEntry) -> String {
    format!(
        "`[{}]` `[{}]` {}",
        entry.timestamp.format("%H:%M:%S"),
        entry.severity.as_str(),
        entry.message
    )
}

/// Greedy single-pass packing of formatted lines into messages of at most
/// `budget` characters. The first chunk is seeded with a bolded title line.
/// Lines are never split: a line that alone exceeds the budget occupies its
/// own oversized chunk. The final chunk is always emitted, so at least one
/// chunk results even for an empty window, and concatenating all chunks
/// reproduces every line exactly once in input order.
pub fn chunk_log_lines(title: &str, lines: &[String], budget: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = format!("**{title}**\n");
    let mut current_chars = current.chars().count();

    for line in lines {
        let line_chars = line.chars().count();
        if current_chars > 0 && current_chars + line_chars + 1 > budget {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        current.push_str(line);
        current.push('\n');
        current_chars += line_chars + 1;
    }

    chunks.push(current);
    chunks
}

pub(super) fn summary_embed(kind: LogKind, summary: &str) -> OutboundEmbed {
    OutboundEmbed {
        title: format!("{} Log Summary", kind.title_label()),
        description: Some(summary.to_string()),
        fields: Vec::new(),
        colour: SUMMARY_EMBED_COLOUR,
        timestamp: true,
    }
}

pub(super) fn interpretation_embed(
    error_message: &str,
    interpretation: &ErrorInterpretation,
) -> OutboundEmbed {
    OutboundEmbed {
        title: "AI Error Interpretation".to_string(),
        description: None,
        fields: vec![
            (
                "Error Message".to_string(),
                format!(
                    "```{}```",
                    truncate_with_ellipsis(error_message, EMBED_FIELD_CODE_BUDGET)
                ),
            ),
            (
                "Interpretation".to_string(),
                interpretation.interpretation.clone(),
            ),
            (
                "Possible Solutions".to_string(),
                interpretation.possible_solutions.clone(),
            ),
        ],
        colour: INTERPRETATION_EMBED_COLOUR,
        timestamp: true,
    }
}

pub(super) fn help_embed(source: CommandSource, prefix: char) -> OutboundEmbed {
    let description = match source {
        CommandSource::Button => "You can use the buttons or the following commands:",
        CommandSource::Message => "Available prefix commands:",
    };
    OutboundEmbed {
        title: "Rho Log Relay Help".to_string(),
        description: Some(description.to_string()),
        fields: vec![
            (
                format!("`{prefix}start`"),
                "Shows the button menu for quick access.".to_string(),
            ),
            (
                format!("`{prefix}logs [app|deploy] [count]`"),
                format!("Shows logs. (E.g. `{prefix}logs app 30`.)"),
            ),
            (
                format!("`{prefix}summarize [app|deploy]`"),
                "Generates an AI summary of the last 50 logs.".to_string(),
            ),
            (
                format!("`{prefix}interpret`"),
                "Interprets the last error found in the application logs.".to_string(),
            ),
            (
                format!("`{prefix}debugid`"),
                "Shows the service id the relay is targeting.".to_string(),
            ),
            (
                format!("`{prefix}help`"),
                "Shows this help message.".to_string(),
            ),
        ],
        colour: HELP_EMBED_COLOUR,
        timestamp: false,
    }
}

pub(super) fn debug_embed(service_id: &str) -> OutboundEmbed {
    OutboundEmbed {
        title: "Debug: Target Service ID".to_string(),
        description: Some("The relay is configured to fetch logs for the following service:".to_string()),
        fields: vec![(
            "Current Target Service ID".to_string(),
            format!("`{service_id}`"),
        )],
        colour: DEBUG_EMBED_COLOUR,
        timestamp: false,
    }
}
