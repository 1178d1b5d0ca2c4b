//! EventRouter - Payload classification and dispatch
//!
//! ## Responsibilities
//!
//! - Classify a raw webhook payload as body-detection or line-crossing
//! - Dispatch to the matching locator and image extractor
//! - Produce a [`DetectionEvent`] consumed by exhaustive matching
//!
//! Classification sniffs the textual view of the payload for the JSON or
//! XML anchor; an unrecognized payload routes to nothing and the request
//! is answered with "no analytics found".

use crate::analytics_mapper;
use crate::config::ProcessorConfig;
use crate::image_extractor;
use crate::json_locator;
use crate::xml_locator::{self, LineCrossingFields};
use std::collections::BTreeMap;

/// Payload classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    BodyDetection,
    LineCrossing,
    Unknown,
}

/// A routed and fully extracted detection event
#[derive(Debug, Clone)]
pub enum DetectionEvent {
    BodyDetection(BodyDetectionEvent),
    LineCrossing(Box<LineCrossingEvent>),
}

/// Body/face detection: flattened analytics plus the best attachment
#[derive(Debug, Clone)]
pub struct BodyDetectionEvent {
    /// Raw `face_*`/`human_*` keyed analytics plus channel/event info
    pub analytics: BTreeMap<String, String>,
    /// Preferred snap time (Human over Face), when present
    pub snap_time: Option<String>,
    pub image: Option<Vec<u8>>,
}

/// Line crossing: alert fields plus the inline image
#[derive(Debug, Clone)]
pub struct LineCrossingEvent {
    pub fields: LineCrossingFields,
    pub image: Option<Vec<u8>>,
}

/// Classify the textual view of a payload
pub fn classify(text: &str) -> PayloadKind {
    if text.contains("\"ipAddress\"") {
        PayloadKind::BodyDetection
    } else if text.contains("<EventNotificationAlert") || text.contains("linedetection") {
        PayloadKind::LineCrossing
    } else {
        PayloadKind::Unknown
    }
}

/// Route a payload to the matching locator/extractor pair.
///
/// Returns `None` when the payload cannot be classified or its embedded
/// document is missing or carries no analytics.
pub fn route(payload: &[u8], text: &str, cfg: &ProcessorConfig) -> Option<DetectionEvent> {
    match classify(text) {
        PayloadKind::BodyDetection => {
            let located = json_locator::locate(text)?;
            let analytics = analytics_mapper::extract_raw(&located.value);
            if !analytics_mapper::has_analytics(&analytics) {
                tracing::warn!("JSON payload carried no Face/Human analytics");
                return None;
            }
            let snap_time = analytics_mapper::snap_time(&analytics);
            let image = image_extractor::extract_body_detection_image(payload);
            Some(DetectionEvent::BodyDetection(BodyDetectionEvent {
                analytics,
                snap_time,
                image,
            }))
        }
        PayloadKind::LineCrossing => {
            let fields = xml_locator::locate(text, cfg.resolution)?;
            let image = image_extractor::extract_inline_jpeg(payload);
            Some(DetectionEvent::LineCrossing(Box::new(LineCrossingEvent {
                fields,
                image,
            })))
        }
        PayloadKind::Unknown => {
            tracing::warn!(len = payload.len(), "Unrecognized webhook payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProcessorConfig;

    #[test]
    fn test_classification() {
        assert_eq!(
            classify(r#"junk {"ipAddress": "1.2.3.4"} junk"#),
            PayloadKind::BodyDetection
        );
        assert_eq!(
            classify("<?xml version=\"1.0\"?><EventNotificationAlert>"),
            PayloadKind::LineCrossing
        );
        assert_eq!(classify("eventType>linedetection<"), PayloadKind::LineCrossing);
        assert_eq!(classify("hello world"), PayloadKind::Unknown);
    }

    #[test]
    fn test_route_body_detection() {
        let text = r#"{"ipAddress":"10.0.0.2","channelName":"Door","eventType":"mixedTargetDetection","CaptureResult":[{"Human":{"snapTime":"2026-02-08T08:29:24+01:00","Property":[{"description":"gender","value":"female"}]}}]}"#;
        let event = route(text.as_bytes(), text, &ProcessorConfig::default()).unwrap();

        match event {
            DetectionEvent::BodyDetection(body) => {
                assert_eq!(body.analytics.get("human_gender").unwrap(), "female");
                assert_eq!(body.snap_time.as_deref(), Some("2026-02-08T08:29:24+01:00"));
                assert!(body.image.is_none());
            }
            DetectionEvent::LineCrossing(_) => panic!("expected body detection"),
        }
    }

    #[test]
    fn test_route_rejects_analytics_free_json() {
        let text = r#"{"ipAddress":"10.0.0.2","channelName":"Door","eventType":"x"}"#;
        assert!(route(text.as_bytes(), text, &ProcessorConfig::default()).is_none());
    }

    #[test]
    fn test_route_line_crossing() {
        let text = "<?xml version=\"1.0\"?><EventNotificationAlert>\
                    <channelName>Gate</channelName>\
                    <eventType>linedetection</eventType>\
                    <detectionTarget>vehicle</detectionTarget>\
                    </EventNotificationAlert>";
        let event = route(text.as_bytes(), text, &ProcessorConfig::default()).unwrap();

        match event {
            DetectionEvent::LineCrossing(crossing) => {
                assert_eq!(crossing.fields.channel_name, "Gate");
                assert_eq!(crossing.fields.object_type, "Vehicle");
                assert!(crossing.image.is_none());
            }
            DetectionEvent::BodyDetection(_) => panic!("expected line crossing"),
        }
    }

    #[test]
    fn test_route_unknown_payload() {
        let text = "GET / HTTP/1.1";
        assert!(route(text.as_bytes(), text, &ProcessorConfig::default()).is_none());
    }
}
