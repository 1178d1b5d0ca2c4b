//! JsonLocator - Embedded JSON document location
//!
//! ## Responsibilities
//!
//! - Find the analytics JSON object inside a raw multipart text blob
//! - Decode exactly one object, tolerating trailing multipart content
//!
//! Different firmware versions emit the same anchor key with different
//! surrounding whitespace, so several literal anchors are tried and the
//! earliest match wins. Decoding uses serde_json's stream deserializer,
//! which stops at the first syntactically complete value and therefore
//! handles braces inside quoted strings correctly. A string/escape-aware
//! brace scan remains as a fallback for payloads the deserializer rejects.

use serde_json::Value;

/// Anchor literals marking the start of the embedded analytics object.
/// Whitespace variants match the known firmware formatting styles.
const ANCHORS: [&str; 3] = [
    "{\"ipAddress\"",
    "{\n\t\"ipAddress\"",
    "{\n        \"ipAddress\"",
];

/// A located and decoded JSON document
#[derive(Debug, Clone)]
pub struct LocatedJson {
    /// The decoded object
    pub value: Value,
    /// Offset one past the end of the object within the searched text
    pub end_offset: usize,
}

/// Locate and decode the embedded analytics JSON object.
///
/// Returns `None` when no anchor is present or the anchored text cannot
/// be decoded as a single JSON object.
pub fn locate(text: &str) -> Option<LocatedJson> {
    let start = earliest_anchor(text)?;

    let tail = &text[start..];
    let mut stream = serde_json::Deserializer::from_str(tail).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) if value.is_object() => {
            return Some(LocatedJson {
                value,
                end_offset: start + stream.byte_offset(),
            });
        }
        Some(Ok(_)) | Some(Err(_)) | None => {}
    }

    // Stream decode failed; retry with a manual brace scan
    let end = scan_object_end(tail)?;
    let value: Value = serde_json::from_str(&tail[..end]).ok()?;
    value.is_object().then(|| LocatedJson {
        value,
        end_offset: start + end,
    })
}

/// Earliest occurrence of any anchor variant
fn earliest_anchor(text: &str) -> Option<usize> {
    ANCHORS.iter().filter_map(|a| text.find(a)).min()
}

/// Find the end offset of the object starting at `text[0]` by counting
/// brace depth, skipping braces inside quoted strings and escaped quotes.
fn scan_object_end(text: &str) -> Option<usize> {
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}
