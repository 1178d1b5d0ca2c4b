//! AnalyticsMapper - Normalized attribute mapping
//!
//! ## Responsibilities
//!
//! - Flatten the decoded body/face analytics JSON into `face_*`/`human_*`
//!   keyed raw analytics
//! - Apply the publication contract: Human values preferred over Face,
//!   yes/no accessories rendered as ON/OFF, documented defaults
//! - Build the line-crossing attribute set for publication
//!
//! The raw key set mirrors the camera's Property descriptions; the
//! published names come from [`ItemNames`] so item naming stays
//! configuration, not code.

use crate::config::{AttributeKey, ItemNames};
use crate::models::NormalizedAttributes;
use chrono::NaiveDateTime;
use serde_json::Value;
use std::collections::BTreeMap;

/// UTC-offset suffixes the cameras are known to emit. Anything else fails
/// the naive parse and the raw string is published unchanged.
const KNOWN_OFFSETS: [&str; 3] = ["+00:00", "+01:00", "+02:00"];

/// Flatten the decoded analytics object into a raw key/value map.
///
/// Top-level `channelName`/`eventType` are always recorded; Face and
/// Human property lists from `CaptureResult[0]` are flattened as
/// `face_<description>` / `human_<description>`, plus per-category
/// `snapTime` entries.
pub fn extract_raw(value: &Value) -> BTreeMap<String, String> {
    let mut raw = BTreeMap::new();

    raw.insert(
        "channelName".to_string(),
        string_field(value, "channelName").unwrap_or_else(|| "unknown".to_string()),
    );
    raw.insert(
        "eventType".to_string(),
        string_field(value, "eventType").unwrap_or_else(|| "unknown".to_string()),
    );

    let capture = value
        .get("CaptureResult")
        .and_then(Value::as_array)
        .and_then(|results| results.first());

    if let Some(capture) = capture {
        for (category, prefix) in [("Face", "face"), ("Human", "human")] {
            if let Some(section) = capture.get(category) {
                flatten_properties(section, prefix, &mut raw);
            }
        }
    }

    raw
}

fn flatten_properties(section: &Value, prefix: &str, raw: &mut BTreeMap<String, String>) {
    if let Some(props) = section.get("Property").and_then(Value::as_array) {
        for prop in props {
            let (Some(description), Some(value)) = (
                string_field(prop, "description"),
                string_field(prop, "value"),
            ) else {
                continue;
            };
            raw.insert(format!("{}_{}", prefix, description), value);
        }
    }
    let snap_time = string_field(section, "snapTime").unwrap_or_default();
    raw.insert(format!("{}_snapTime", prefix), snap_time);
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whether the raw map holds anything beyond channel/event info.
///
/// Fewer than 3 keys means no Face/Human analytics were present and the
/// payload is not a valid analytics payload.
pub fn has_analytics(raw: &BTreeMap<String, String>) -> bool {
    raw.len() > 2
}

/// Preferred snap time: Human first, then Face
pub fn snap_time(raw: &BTreeMap<String, String>) -> Option<String> {
    non_empty(raw, "human_snapTime").or_else(|| non_empty(raw, "face_snapTime"))
}

/// Map raw body-detection analytics to the published attribute set.
///
/// Every documented field is pushed exactly once, with its documented
/// default when the source key is absent.
pub fn map_body(raw: &BTreeMap<String, String>, names: &ItemNames) -> NormalizedAttributes {
    let mut attrs = NormalizedAttributes::new();
    let get = |key: &str| non_empty(raw, key);
    let unknown = || "unknown".to_string();

    attrs.push(
        names.name(AttributeKey::ChannelName),
        get("channelName").unwrap_or_else(unknown),
    );
    attrs.push(
        names.name(AttributeKey::EventType),
        get("eventType").unwrap_or_else(unknown),
    );

    if let Some(ts) = snap_time(raw) {
        attrs.push(names.name(AttributeKey::Timestamp), format_snap_time(&ts));
    }

    // Clothing: human-only
    for (key, raw_key) in [
        (AttributeKey::JacketColor, "human_jacketColor"),
        (AttributeKey::TrousersColor, "human_trousersColor"),
        (AttributeKey::JacketType, "human_jacketType"),
        (AttributeKey::TrousersType, "human_trousersType"),
    ] {
        attrs.push(names.name(key), get(raw_key).unwrap_or_else(unknown));
    }

    // Accessories: human preferred, face fallback where the camera has
    // one, rendered as ON/OFF
    let accessory = |human: &str, face: Option<&str>| {
        let value = get(human)
            .or_else(|| face.and_then(get))
            .unwrap_or_else(|| "no".to_string());
        if value == "yes" { "ON" } else { "OFF" }
    };
    attrs.push(
        names.name(AttributeKey::HasHat),
        accessory("human_hat", Some("face_hat")),
    );
    attrs.push(
        names.name(AttributeKey::HasGlasses),
        accessory("human_glass", Some("face_glass")),
    );
    attrs.push(names.name(AttributeKey::HasBag), accessory("human_bag", None));
    attrs.push(
        names.name(AttributeKey::HasThings),
        accessory("human_things", None),
    );
    attrs.push(
        names.name(AttributeKey::HasMask),
        accessory("human_mask", Some("face_mask")),
    );
    attrs.push(
        names.name(AttributeKey::HasRide),
        accessory("human_ride", None),
    );

    // Person attributes
    attrs.push(
        names.name(AttributeKey::Gender),
        get("human_gender")
            .or_else(|| get("face_gender"))
            .unwrap_or_else(unknown),
    );
    attrs.push(
        names.name(AttributeKey::AgeGroup),
        get("human_ageGroup")
            .or_else(|| get("face_ageGroup"))
            .unwrap_or_else(unknown),
    );
    attrs.push(
        names.name(AttributeKey::HairStyle),
        get("human_hairStyle").unwrap_or_else(unknown),
    );
    attrs.push(
        names.name(AttributeKey::FaceExpression),
        get("face_faceExpression").unwrap_or_else(unknown),
    );
    attrs.push(
        names.name(AttributeKey::Age),
        get("face_age").unwrap_or_else(|| "0".to_string()),
    );

    // Motion: human-only
    attrs.push(
        names.name(AttributeKey::MotionDirection),
        get("human_direction").unwrap_or_else(unknown),
    );

    // Detection quality scores
    attrs.push(
        names.name(AttributeKey::FaceScore),
        get("face_score").unwrap_or_else(|| "0".to_string()),
    );
    attrs.push(
        names.name(AttributeKey::HumanScore),
        get("human_score").unwrap_or_else(|| "0".to_string()),
    );

    attrs
}

/// Line-crossing attribute set. The image filename attribute is published
/// separately once the image has been persisted.
pub fn map_line_crossing(
    channel_name: &str,
    object_type: &str,
    region_id: &str,
    date_time: &str,
    direction: &str,
    names: &ItemNames,
) -> NormalizedAttributes {
    let mut attrs = NormalizedAttributes::new();
    attrs.push(names.name(AttributeKey::CrossingDirection), direction);
    attrs.push(names.name(AttributeKey::CrossingObjectType), object_type);
    attrs.push(names.name(AttributeKey::CrossingRegion), region_id);
    attrs.push(names.name(AttributeKey::CrossingTime), date_time);
    attrs.push(names.name(AttributeKey::CrossingChannel), channel_name);
    attrs
}

/// Parse a snap time with a known UTC-offset suffix stripped, reformatted
/// for display; the raw string passes through on any parse failure.
pub fn format_snap_time(snap_time: &str) -> String {
    let mut stripped = snap_time;
    for offset in KNOWN_OFFSETS {
        if let Some(prefix) = stripped.strip_suffix(offset) {
            stripped = prefix;
            break;
        }
    }
    match NaiveDateTime::parse_from_str(stripped, "%Y-%m-%dT%H:%M:%S") {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => snap_time.to_string(),
    }
}

fn non_empty(raw: &BTreeMap<String, String>, key: &str) -> Option<String> {
    raw.get(key).filter(|v| !v.is_empty()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Value {
        serde_json::json!({
            "ipAddress": "10.0.0.2",
            "channelName": "Front Door",
            "eventType": "mixedTargetDetection",
            "CaptureResult": [{
                "Face": {
                    "snapTime": "2026-02-08T08:29:23+01:00",
                    "Property": [
                        {"description": "gender", "value": "male"},
                        {"description": "glass", "value": "yes"},
                        {"description": "age", "value": "34"},
                        {"description": "score", "value": "98"}
                    ]
                },
                "Human": {
                    "snapTime": "2026-02-08T08:29:24+01:00",
                    "Property": [
                        {"description": "gender", "value": "female"},
                        {"description": "jacketColor", "value": "red"},
                        {"description": "hat", "value": "yes"},
                        {"description": "score", "value": "87"}
                    ]
                }
            }]
        })
    }

    #[test]
    fn test_extract_raw_flattens_properties() {
        let raw = extract_raw(&fixture());
        assert_eq!(raw.get("channelName").unwrap(), "Front Door");
        assert_eq!(raw.get("face_gender").unwrap(), "male");
        assert_eq!(raw.get("human_jacketColor").unwrap(), "red");
        assert_eq!(raw.get("human_snapTime").unwrap(), "2026-02-08T08:29:24+01:00");
        assert!(has_analytics(&raw));
    }

    #[test]
    fn test_channel_event_only_is_not_analytics() {
        let raw = extract_raw(&serde_json::json!({
            "ipAddress": "10.0.0.2",
            "channelName": "Front Door",
            "eventType": "mixedTargetDetection"
        }));
        assert_eq!(raw.len(), 2);
        assert!(!has_analytics(&raw));
    }

    #[test]
    fn test_human_preferred_over_face() {
        let raw = extract_raw(&fixture());
        let attrs = map_body(&raw, &ItemNames::default());
        assert_eq!(attrs.get("Camera_Gender"), Some("female"));
        // Human has no glass property, face value is used
        assert_eq!(attrs.get("Camera_HasGlasses"), Some("ON"));
        // Human hat wins
        assert_eq!(attrs.get("Camera_HasHat"), Some("ON"));
    }

    #[test]
    fn test_every_documented_field_published_once_with_defaults() {
        let raw = extract_raw(&serde_json::json!({
            "channelName": "Door",
            "eventType": "mixedTargetDetection",
            "CaptureResult": [{
                "Human": {
                    "snapTime": "",
                    "Property": [{"description": "gender", "value": "male"}]
                }
            }]
        }));
        let names = ItemNames::default();
        let attrs = map_body(&raw, &names);

        // No snap time, so no Timestamp attribute; everything else exactly once
        assert_eq!(attrs.len(), 20);
        let mut seen = std::collections::HashSet::new();
        for (name, _) in attrs.iter() {
            assert!(seen.insert(name.to_string()), "duplicate attribute {name}");
        }
        assert_eq!(attrs.get("Camera_JacketColor"), Some("unknown"));
        assert_eq!(attrs.get("Camera_HasBag"), Some("OFF"));
        assert_eq!(attrs.get("Camera_FaceScore"), Some("0"));
        assert_eq!(attrs.get("Camera_HumanScore"), Some("0"));
        assert_eq!(attrs.get("Camera_Gender"), Some("male"));
    }

    #[test]
    fn test_snap_time_formatting() {
        assert_eq!(
            format_snap_time("2026-02-08T08:29:23+01:00"),
            "2026-02-08 08:29:23"
        );
        assert_eq!(
            format_snap_time("2026-02-08T08:29:23+00:00"),
            "2026-02-08 08:29:23"
        );
    }

    #[test]
    fn test_snap_time_unknown_offset_passes_through() {
        // Only the known offsets are stripped; anything else publishes raw
        assert_eq!(
            format_snap_time("2026-02-08T08:29:23+05:30"),
            "2026-02-08T08:29:23+05:30"
        );
        assert_eq!(format_snap_time("not a time"), "not a time");
    }

    #[test]
    fn test_snap_time_prefers_human() {
        let raw = extract_raw(&fixture());
        assert_eq!(snap_time(&raw).unwrap(), "2026-02-08T08:29:24+01:00");
    }

    #[test]
    fn test_line_crossing_attributes() {
        let attrs = map_line_crossing(
            "Gate",
            "Human",
            "3",
            "2026-02-08T08:29:23+01:00",
            "Human Enter",
            &ItemNames::default(),
        );
        assert_eq!(attrs.get("Camera_CrossingDirection"), Some("Human Enter"));
        assert_eq!(attrs.get("Camera_CrossingObjectType"), Some("Human"));
        assert_eq!(attrs.get("Camera_CrossingRegion"), Some("3"));
        assert_eq!(attrs.len(), 5);
    }
}
