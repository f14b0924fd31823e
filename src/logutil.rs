//! Helpers for keeping host payloads readable in single-line logs.

/// Longest payload preview written to the log.
const MAX_PREVIEW: usize = 240;

/// Escape control characters so a payload stays on one log line, truncating
/// anything past `MAX_PREVIEW` characters with an ellipsis.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
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

/// Compact one-line rendering of a JSON payload for debug logs.
pub fn payload_preview(value: &serde_json::Value) -> String {
    escape_log(&value.to_string())
}
