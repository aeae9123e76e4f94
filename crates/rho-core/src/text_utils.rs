/// Truncates `value` to at most `max_chars` characters, appending an ellipsis
/// marker when anything was dropped. Counts characters, not bytes, so
/// multi-byte input never splits mid-codepoint.
pub fn truncate_with_ellipsis(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated = String::new();
    for ch in value.chars().take(max_chars) {
        truncated.push(ch);
    }
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::truncate_with_ellipsis;

    #[test]
    fn unit_truncate_with_ellipsis_passes_short_values_through() {
        assert_eq!(truncate_with_ellipsis("rho", 10), "rho");
        assert_eq!(truncate_with_ellipsis("", 0), "");
    }

    #[test]
    fn regression_truncate_with_ellipsis_preserves_unicode_boundaries() {
        let value = "rh🌊o-message";
        assert_eq!(truncate_with_ellipsis(value, 20), value);
        assert_eq!(truncate_with_ellipsis(value, 3), "rh🌊...");
        assert_eq!(truncate_with_ellipsis(value, 0), "...");
    }
}
