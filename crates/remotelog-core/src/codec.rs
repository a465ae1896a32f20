// # Content Codec
//
// Transport encoding of log content and line framing.
//
// Remote content travels as standard base64. Contents APIs commonly wrap the
// encoded text at a fixed column with `\n`, so decoding ignores ASCII
// whitespace; anything else that is not valid base64 is a `DecodeError`.
//
// Framing rules:
// - one record per line, `\n` terminated
// - existing bytes are never rewritten, only extended

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::DecodeError;

/// Encode raw log bytes for transport
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode transport text back into raw log bytes
///
/// Embedded ASCII whitespace (line wrapping) is skipped. Any other invalid
/// input fails rather than producing partial content.
pub fn decode(transport: &str) -> Result<Vec<u8>, DecodeError> {
    let compact: Vec<u8> = transport
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    Ok(STANDARD.decode(compact)?)
}

/// Flatten a candidate line so it occupies exactly one log line
///
/// Every run of `\r` / `\n` characters collapses into a single space, then
/// surrounding whitespace is trimmed.
pub fn normalize_line(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_break = false;

    for ch in raw.chars() {
        if ch == '\r' || ch == '\n' {
            if !in_break {
                out.push(' ');
                in_break = true;
            }
        } else {
            out.push(ch);
            in_break = false;
        }
    }

    out.trim().to_string()
}

/// Append one normalized line to existing log bytes
///
/// A separating `\n` is inserted first when `existing` is non-empty and does
/// not already end with one. The line is always `\n` terminated.
pub fn append_to(existing: &[u8], line: &str) -> Vec<u8> {
    let needs_separator = !existing.is_empty() && !existing.ends_with(b"\n");

    let mut out = Vec::with_capacity(existing.len() + line.len() + 2);
    out.extend_from_slice(existing);
    if needs_separator {
        out.push(b'\n');
    }
    out.extend_from_slice(line.as_bytes());
    out.push(b'\n');
    out
}
