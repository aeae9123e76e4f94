//! Terminal control-sequence stripping for raw log lines.

use std::sync::OnceLock;

use regex::Regex;

static CSI_PATTERN: OnceLock<Regex> = OnceLock::new();

// CSI grammar: ESC '[' parameter bytes (0x30-0x3F), intermediate bytes
// (0x20-0x2F), one final byte (0x40-0x7E).
fn csi_pattern() -> &'static Regex {
    CSI_PATTERN.get_or_init(|| {
        Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]").expect("CSI pattern is a valid regex")
    })
}

/// Removes ANSI CSI escape sequences from `raw`, leaving every other
/// character untouched. Pure and idempotent.
pub fn strip_ansi(raw: &str) -> String {
    csi_pattern().replace_all(raw, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::strip_ansi;

    #[test]
    fn unit_strip_ansi_removes_color_and_cursor_sequences() {
        assert_eq!(strip_ansi("\x1b[31mboom\x1b[0m"), "boom");
        assert_eq!(strip_ansi("\x1b[1;32mok\x1b[0m done"), "ok done");
        assert_eq!(strip_ansi("\x1b[2K\x1b[1Gprogress 42%"), "progress 42%");
    }

    #[test]
    fn unit_strip_ansi_leaves_plain_text_untouched() {
        assert_eq!(strip_ansi("plain [INFO] line"), "plain [INFO] line");
        assert_eq!(strip_ansi("brackets [0m are kept"), "brackets [0m are kept");
        assert_eq!(strip_ansi(""), "");
    }

    #[test]
    fn regression_strip_ansi_is_idempotent() {
        let raw = "\x1b[31mred\x1b[0m and \x1b[4munderline\x1b[24m";
        let once = strip_ansi(raw);
        assert_eq!(strip_ansi(&once), once);
        assert_eq!(once, "red and underline");
    }
}
