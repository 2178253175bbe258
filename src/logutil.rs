//! Log sanitization for narrative text. Quest and event texts are
//! multi-line prose; escaping keeps every log record on a single line.

/// Escape a string for single-line logging, mapping newlines, carriage
/// returns, tabs and backslashes to their escaped forms and rendering any
/// other control character as `\xNN`. Output is capped to keep noisy
/// payloads from flooding the log.
pub fn escape_log(text: &str) -> String {
    const CAP: usize = 240;
    let mut out = String::with_capacity(text.len().min(CAP) + 4);
    for ch in text.chars() {
        if out.len() >= CAP {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_log;

    #[test]
    fn escapes_control_characters() {
        assert_eq!(
            escape_log("The path stands clear.\n\nYou gain 250 xp"),
            "The path stands clear.\\n\\nYou gain 250 xp"
        );
        assert_eq!(escape_log("a\tb\r\\"), "a\\tb\\r\\\\");
    }

    #[test]
    fn caps_very_long_text() {
        let long = "x".repeat(1000);
        let escaped = escape_log(&long);
        assert!(escaped.chars().count() < 300);
        assert!(escaped.ends_with('…'));
    }
}
