//! XmlLocator - Line-crossing alert extraction
//!
//! ## Responsibilities
//!
//! - Locate the embedded event-notification XML inside a raw text blob
//! - Strip the firmware namespace declaration and parse the fragment
//! - Collect leaf fields by first-match-anywhere lookup
//! - Normalize line geometry against the configured camera resolution and
//!   derive orientation, tracking axis and line position
//!
//! Any XML parse failure yields "no line-crossing data" for the whole
//! request; a failed geometry read only leaves the geometry undefined so
//! the region-mapped direction path still works.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

/// Start anchor of the embedded document
const XML_START: &str = "<?xml";

/// End anchor, closing tag of the alert root element
const XML_END: &str = "</EventNotificationAlert>";

/// Namespace declaration the downstream lookup does not resolve
const NAMESPACE_DECL: &str = r#" xmlns="http://www.hikvision.com/ver20/XMLSchema""#;

/// Direction tag variants across firmware versions, priority order
const DIRECTION_TAGS: [&str; 4] = [
    "direction",
    "crossDirection",
    "directionSensitivity",
    "detectionDirection",
];

/// Normalized line endpoints, 0-1 scale on each axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineGeometry {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOrientation {
    Vertical,
    Horizontal,
    Diagonal,
}

/// Axis on which a crossing object's position is compared to the line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingAxis {
    X,
    Y,
}

/// Derived orientation, tracking axis and scalar line position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineTrack {
    pub orientation: LineOrientation,
    pub axis: TrackingAxis,
    pub position: f64,
}

/// Normalized target rectangle, raw strings defaulting to "0"
#[derive(Debug, Clone, PartialEq)]
pub struct TargetRect {
    pub x: String,
    pub y: String,
    pub width: String,
    pub height: String,
}

impl Default for TargetRect {
    fn default() -> Self {
        Self {
            x: "0".to_string(),
            y: "0".to_string(),
            width: "0".to_string(),
            height: "0".to_string(),
        }
    }
}

/// Fields extracted from a line-crossing alert
#[derive(Debug, Clone, Default)]
pub struct LineCrossingFields {
    pub ip_address: String,
    pub mac_address: String,
    pub channel_id: String,
    pub channel_name: String,
    pub event_type: String,
    pub event_state: String,
    pub event_description: String,
    pub date_time: String,
    pub region_id: String,
    pub sensitivity: String,
    pub detection_target: String,
    /// Classification derived from the detection target
    pub object_type: String,
    /// Direction the camera supplied, if any
    pub explicit_direction: Option<String>,
    pub geometry: Option<LineGeometry>,
    pub track: Option<LineTrack>,
    pub target_rect: TargetRect,
}

/// Locate and parse the embedded line-crossing alert.
///
/// `resolution` is the configured camera (width, height) used to
/// normalize region coordinates.
pub fn locate(text: &str, resolution: (u32, u32)) -> Option<LineCrossingFields> {
    let start = text.find(XML_START)?;
    let end = text[start..].find(XML_END)? + start + XML_END.len();

    let fragment = text[start..end].replace(NAMESPACE_DECL, "");
    let doc = match parse_document(&fragment) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(error = %e, "Line-crossing XML failed to parse");
            return None;
        }
    };

    let field = |tag: &str| doc.leaf(tag).unwrap_or_default().to_string();

    let detection_target = field("detectionTarget");
    let explicit_direction = DIRECTION_TAGS
        .iter()
        .find_map(|tag| doc.leaf(tag))
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let geometry = normalize_geometry(&doc.position_xs, &doc.position_ys, resolution);
    let track = geometry.map(derive_track);

    Some(LineCrossingFields {
        ip_address: field("ipAddress"),
        mac_address: field("macAddress"),
        channel_id: field("channelID"),
        channel_name: field("channelName"),
        event_type: field("eventType"),
        event_state: field("eventState"),
        event_description: field("eventDescription"),
        date_time: field("dateTime"),
        region_id: field("regionID"),
        sensitivity: field("sensitivityLevel"),
        object_type: classify_object_type(&detection_target),
        detection_target,
        explicit_direction,
        geometry,
        track,
        target_rect: doc.target_rect.clone(),
    })
}

/// Flat view of the parsed document
struct ParsedDocument {
    /// First text value seen for each leaf tag, anywhere in the tree
    leaves: HashMap<String, String>,
    /// positionX values under RegionCoordinatesList, document order
    position_xs: Vec<String>,
    /// positionY values under RegionCoordinatesList, document order
    position_ys: Vec<String>,
    target_rect: TargetRect,
}

impl ParsedDocument {
    fn leaf(&self, tag: &str) -> Option<&str> {
        self.leaves.get(tag).map(String::as_str)
    }
}

fn parse_document(fragment: &str) -> Result<ParsedDocument, String> {
    let mut reader = Reader::from_str(fragment);
    reader.config_mut().trim_text(true);

    let mut leaves: HashMap<String, String> = HashMap::new();
    let mut position_xs = Vec::new();
    let mut position_ys = Vec::new();
    let mut target_rect = TargetRect::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
                path.push(name);
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Text(text) => {
                let Some(tag) = path.last() else { continue };
                let value = text.unescape().map_err(|e| e.to_string())?.trim().to_string();
                if value.is_empty() {
                    continue;
                }

                let in_coordinates = path.iter().any(|p| p == "RegionCoordinatesList");
                let in_target_rect = path.iter().any(|p| p == "TargetRect");

                if in_coordinates && tag == "positionX" {
                    position_xs.push(value.clone());
                } else if in_coordinates && tag == "positionY" {
                    position_ys.push(value.clone());
                } else if in_target_rect {
                    match tag.as_str() {
                        "X" => target_rect.x = value.clone(),
                        "Y" => target_rect.y = value.clone(),
                        "width" => target_rect.width = value.clone(),
                        "height" => target_rect.height = value.clone(),
                        _ => {}
                    }
                }

                // First match anywhere in the subtree wins
                leaves.entry(tag.clone()).or_insert(value);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(ParsedDocument {
        leaves,
        position_xs,
        position_ys,
        target_rect,
    })
}

/// Normalize the first two coordinate pairs against the camera resolution.
/// Returns `None` when fewer than two pairs exist or any value fails to
/// parse; the caller then reports the direction as unavailable.
fn normalize_geometry(
    xs: &[String],
    ys: &[String],
    resolution: (u32, u32),
) -> Option<LineGeometry> {
    if xs.len() < 2 || ys.len() < 2 {
        return None;
    }
    let width = f64::from(resolution.0);
    let height = f64::from(resolution.1);

    let x1 = xs[0].parse::<f64>().ok()? / width;
    let x2 = xs[1].parse::<f64>().ok()? / width;
    let y1 = ys[0].parse::<f64>().ok()? / height;
    let y2 = ys[1].parse::<f64>().ok()? / height;

    Some(LineGeometry { x1, y1, x2, y2 })
}

/// Orientation and tracking axis from the endpoint deltas.
///
/// A line is vertical when its Y extent dominates the X extent by more
/// than 2x (and vice versa); anything else is diagonal and tracks the
/// larger delta's axis.
pub fn derive_track(line: LineGeometry) -> LineTrack {
    let dx = (line.x1 - line.x2).abs();
    let dy = (line.y1 - line.y2).abs();

    if dy > 2.0 * dx {
        LineTrack {
            orientation: LineOrientation::Vertical,
            axis: TrackingAxis::X,
            position: (line.x1 + line.x2) / 2.0,
        }
    } else if dx > 2.0 * dy {
        LineTrack {
            orientation: LineOrientation::Horizontal,
            axis: TrackingAxis::Y,
            position: (line.y1 + line.y2) / 2.0,
        }
    } else if dy > dx {
        LineTrack {
            orientation: LineOrientation::Diagonal,
            axis: TrackingAxis::Y,
            position: (line.y1 + line.y2) / 2.0,
        }
    } else {
        LineTrack {
            orientation: LineOrientation::Diagonal,
            axis: TrackingAxis::X,
            position: (line.x1 + line.x2) / 2.0,
        }
    }
}

/// Object classification from the camera's detection target string.
/// Case-insensitive substring match, first rule wins.
pub fn classify_object_type(target: &str) -> String {
    let lower = target.to_lowercase();
    if lower.contains("human") {
        "Human".to_string()
    } else if lower.contains("vehicle") || lower.contains("car") {
        "Vehicle".to_string()
    } else if lower == "others" || lower == "other" {
        "Unknown Object".to_string()
    } else if lower.is_empty() {
        "Unknown".to_string()
    } else {
        title_case(target)
    }
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESOLUTION: (u32, u32) = (1920, 1080);

    fn alert(inner: &str) -> String {
        format!(
            "--boundary\r\n\r\n<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <EventNotificationAlert version=\"2.0\" xmlns=\"http://www.hikvision.com/ver20/XMLSchema\">\n\
             <ipAddress>192.168.1.64</ipAddress>\n\
             <macAddress>a4:d5:c2:00:11:22</macAddress>\n\
             <channelID>1</channelID>\n\
             <channelName>Gate</channelName>\n\
             <dateTime>2026-02-08T08:29:23+01:00</dateTime>\n\
             <eventType>linedetection</eventType>\n\
             <eventState>active</eventState>\n\
             <eventDescription>linedetection alarm</eventDescription>\n\
             {}\n\
             </EventNotificationAlert>\r\n--boundary--",
            inner
        )
    }

    fn region(coords: &[(u32, u32)], extra: &str) -> String {
        let entries: String = coords
            .iter()
            .map(|(x, y)| {
                format!(
                    "<RegionCoordinates><positionX>{}</positionX><positionY>{}</positionY></RegionCoordinates>",
                    x, y
                )
            })
            .collect();
        format!(
            "<DetectionRegionList><DetectionRegionEntry>\
             <regionID>3</regionID>\
             <sensitivityLevel>50</sensitivityLevel>\
             <detectionTarget>human</detectionTarget>\
             {}\
             <RegionCoordinatesList>{}</RegionCoordinatesList>\
             </DetectionRegionEntry></DetectionRegionList>",
            extra, entries
        )
    }

    #[test]
    fn test_locate_extracts_fields() {
        let text = alert(&region(&[(192, 540), (1728, 540)], ""));
        let fields = locate(&text, RESOLUTION).unwrap();

        assert_eq!(fields.ip_address, "192.168.1.64");
        assert_eq!(fields.channel_name, "Gate");
        assert_eq!(fields.event_type, "linedetection");
        assert_eq!(fields.region_id, "3");
        assert_eq!(fields.sensitivity, "50");
        assert_eq!(fields.detection_target, "human");
        assert_eq!(fields.object_type, "Human");
        assert!(fields.explicit_direction.is_none());
    }

    #[test]
    fn test_missing_anchor_returns_none() {
        assert!(locate("no xml here", RESOLUTION).is_none());
        assert!(locate("<?xml version=\"1.0\"?><open>", RESOLUTION).is_none());
    }

    #[test]
    fn test_horizontal_line_tracks_y() {
        // x1=0.1, x2=0.9, y1=y2=0.5
        let text = alert(&region(&[(192, 540), (1728, 540)], ""));
        let fields = locate(&text, RESOLUTION).unwrap();

        let track = fields.track.unwrap();
        assert_eq!(track.orientation, LineOrientation::Horizontal);
        assert_eq!(track.axis, TrackingAxis::Y);
        assert!((track.position - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_vertical_line_tracks_x() {
        // x1=x2=0.5, y1=0.1, y2=0.9
        let text = alert(&region(&[(960, 108), (960, 972)], ""));
        let fields = locate(&text, RESOLUTION).unwrap();

        let track = fields.track.unwrap();
        assert_eq!(track.orientation, LineOrientation::Vertical);
        assert_eq!(track.axis, TrackingAxis::X);
        assert!((track.position - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_diagonal_line_tracks_larger_delta() {
        let track = derive_track(LineGeometry {
            x1: 0.1,
            y1: 0.1,
            x2: 0.6,
            y2: 0.9,
        });
        assert_eq!(track.orientation, LineOrientation::Diagonal);
        assert_eq!(track.axis, TrackingAxis::Y);
        assert!((track.position - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_single_coordinate_pair_leaves_geometry_undefined() {
        let text = alert(&region(&[(192, 540)], ""));
        let fields = locate(&text, RESOLUTION).unwrap();
        assert!(fields.geometry.is_none());
        assert!(fields.track.is_none());
    }

    #[test]
    fn test_direction_tag_priority() {
        let text = alert(&region(
            &[(192, 540), (1728, 540)],
            "<crossDirection>left-right</crossDirection>",
        ));
        let fields = locate(&text, RESOLUTION).unwrap();
        assert_eq!(fields.explicit_direction.as_deref(), Some("left-right"));
    }

    #[test]
    fn test_target_rect_defaults_to_zero() {
        let text = alert(&region(&[(192, 540), (1728, 540)], ""));
        let fields = locate(&text, RESOLUTION).unwrap();
        assert_eq!(fields.target_rect, TargetRect::default());
    }

    #[test]
    fn test_target_rect_extraction() {
        let text = alert(&region(
            &[(192, 540), (1728, 540)],
            "<DetectionTargetInfo><TargetRect>\
             <X>0.40</X><Y>0.70</Y><width>0.10</width><height>0.20</height>\
             </TargetRect></DetectionTargetInfo>",
        ));
        let fields = locate(&text, RESOLUTION).unwrap();
        assert_eq!(fields.target_rect.x, "0.40");
        assert_eq!(fields.target_rect.y, "0.70");
        assert_eq!(fields.target_rect.width, "0.10");
        assert_eq!(fields.target_rect.height, "0.20");
    }

    #[test]
    fn test_object_type_classification() {
        assert_eq!(classify_object_type("human"), "Human");
        assert_eq!(classify_object_type("vehicle"), "Vehicle");
        assert_eq!(classify_object_type("Car"), "Vehicle");
        assert_eq!(classify_object_type("others"), "Unknown Object");
        assert_eq!(classify_object_type("other"), "Unknown Object");
        assert_eq!(classify_object_type(""), "Unknown");
        assert_eq!(classify_object_type("ANIMAL"), "Animal");
    }
}
