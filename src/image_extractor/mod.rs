//! ImageExtractor - JPEG extraction from raw webhook bytes
//!
//! ## Responsibilities
//!
//! - Locate a named multipart attachment by content-disposition marker
//! - Locate a single inline JPEG by SOI/EOI markers (line-crossing payloads)
//! - Validate JPEG framing so truncated images are never published
//!
//! The cameras emit a multipart-like stream with a fixed literal boundary
//! token; this module scans bytes directly instead of running a full MIME
//! parser. A stricter parser could replace it without touching callers.

/// JPEG start-of-image marker
const SOI: [u8; 2] = [0xff, 0xd8];

/// JPEG end-of-image marker
const EOI: [u8; 2] = [0xff, 0xd9];

/// Fixed multipart boundary token the cameras emit
const BOUNDARY: &[u8] = b"--boundary";

const CONTENT_TYPE_JPEG: &[u8] = b"Content-Type: image/jpeg";

/// Attachment names tried for body-detection payloads, highest priority
/// first: full-scene attachments, then cropped person-only attachments.
const BODY_IMAGE_PARTS: [&str; 4] = [
    "faceBackgroundImage",
    "humanBackgroundImage",
    "faceImage",
    "humanImage",
];

/// Extract the JPEG payload of the multipart part with the given name.
///
/// Returns `None` when the part, its JPEG content type, or the end of its
/// headers cannot be located, or when the extracted bytes are not a
/// complete SOI..EOI framed image.
pub fn extract_named_part(payload: &[u8], part_name: &str) -> Option<Vec<u8>> {
    let marker = format!("Content-Disposition: form-data; name=\"{}\"", part_name);
    let marker_idx = find(payload, marker.as_bytes(), 0)?;

    let type_idx = find(payload, CONTENT_TYPE_JPEG, marker_idx)?;

    // Headers end at the first blank line, CRLF or bare LF variant
    let data_start = match find(payload, b"\r\n\r\n", type_idx) {
        Some(idx) => idx + 4,
        None => find(payload, b"\n\n", type_idx)? + 2,
    };

    let data_end = find(payload, BOUNDARY, data_start).unwrap_or(payload.len());

    let data = trim_ascii(&payload[data_start..data_end]);
    validate_jpeg(data).then(|| data.to_vec())
}

/// Extract a single inline JPEG spanning the first SOI to the last EOI.
///
/// Used for line-crossing payloads, which carry one image without a
/// reliable part name.
pub fn extract_inline_jpeg(payload: &[u8]) -> Option<Vec<u8>> {
    let soi = find(payload, &SOI, 0)?;
    let eoi = rfind(payload, &EOI)?;
    if eoi < soi {
        return None;
    }
    Some(payload[soi..eoi + EOI.len()].to_vec())
}

/// Extract the best available image from a body-detection payload,
/// trying full-scene attachments before cropped ones.
pub fn extract_body_detection_image(payload: &[u8]) -> Option<Vec<u8>> {
    for part in BODY_IMAGE_PARTS {
        if let Some(data) = extract_named_part(payload, part) {
            tracing::debug!(part, size = data.len(), "Extracted detection image");
            return Some(data);
        }
    }
    tracing::debug!("No image attachment found in body-detection payload");
    None
}

/// First occurrence of `needle` in `haystack` at or after `from`
fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|idx| from + idx)
}

/// Last occurrence of `needle` in `haystack`
fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack
        .windows(needle.len())
        .rposition(|w| w == needle)
}

fn trim_ascii(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    let end = data
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map(|idx| idx + 1)
        .unwrap_or(start);
    &data[start..end]
}

/// A publishable image must carry both JPEG framing markers
fn validate_jpeg(data: &[u8]) -> bool {
    data.len() >= 4 && data.starts_with(&SOI) && data.ends_with(&EOI)
}
