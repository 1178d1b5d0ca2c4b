//! DirectionResolver - Enter/Exit decision for line-crossing events
//!
//! ## Responsibilities
//!
//! - Honor a direction the camera supplied explicitly
//! - Apply the administrator's region -> direction mapping, with global
//!   inversion
//! - Fall back to position-based inference from the tracked object's side
//!   of the line
//!
//! The margin-tolerant side classification is advisory only; it is logged
//! at debug level and never feeds the published direction.

use crate::config::ProcessorConfig;
use crate::xml_locator::{LineTrack, TrackingAxis};

/// Published when neither mapping nor position data can resolve a direction
pub const DIRECTION_NOT_AVAILABLE: &str = "Direction Not Available";

/// Published when the position calculation itself fails
pub const DIRECTION_ERROR: &str = "Direction Error";

/// Resolver inputs for one crossing event
#[derive(Debug, Clone, Default)]
pub struct DirectionInput<'a> {
    /// Direction the camera already supplied, used verbatim when present
    pub explicit_direction: Option<&'a str>,
    pub region_id: &'a str,
    pub detection_target: &'a str,
    pub track: Option<LineTrack>,
    /// Target coordinates on the normalized 0-1 scale, as reported
    pub target_x: Option<f64>,
    pub target_y: Option<f64>,
}

/// Resolve the published direction string. Deterministic for identical
/// inputs; never panics.
pub fn resolve(input: &DirectionInput, cfg: &ProcessorConfig) -> String {
    // The advisory side classification is diagnostic only
    let side = calculated_side(input, cfg.position_margin);
    tracing::debug!(
        region_id = input.region_id,
        calculated_side = side,
        "Crossing side diagnostic"
    );

    // 1. Explicit camera direction wins, no inference
    if let Some(direction) = input.explicit_direction.filter(|d| !d.is_empty()) {
        return direction.to_string();
    }

    // 2. Administrator-declared meaning for this region
    if !input.region_id.is_empty() {
        if let Some(declared) = cfg.region_directions.get(input.region_id) {
            match parse_declared(declared) {
                Some(entered) => {
                    return render(input.detection_target, entered, cfg.invert_direction);
                }
                None => {
                    tracing::warn!(
                        region_id = input.region_id,
                        declared = %declared,
                        "Region direction is neither enter nor exit, ignoring"
                    );
                }
            }
        }
    }

    // 3. Position-based inference
    match infer_from_position(input) {
        Ok(Some(entered)) => render(input.detection_target, entered, cfg.invert_direction),
        Ok(None) => DIRECTION_NOT_AVAILABLE.to_string(),
        Err(()) => DIRECTION_ERROR.to_string(),
    }
}

fn parse_declared(declared: &str) -> Option<bool> {
    if declared.eq_ignore_ascii_case("enter") {
        Some(true)
    } else if declared.eq_ignore_ascii_case("exit") {
        Some(false)
    } else {
        None
    }
}

/// Side-of-line inference. The camera only fires on a crossing, so the
/// side the object is on after the event is the side it arrived at:
/// arriving on side B means it entered, side A means it exited.
///
/// `Ok(None)` means position data is missing; `Err` means the data was
/// present but unusable.
fn infer_from_position(input: &DirectionInput) -> Result<Option<bool>, ()> {
    let Some(track) = input.track else {
        return Ok(None);
    };
    let current = match track.axis {
        TrackingAxis::Y => input.target_y,
        TrackingAxis::X => input.target_x,
    };
    let Some(current) = current else {
        return Ok(None);
    };
    if !current.is_finite() || !track.position.is_finite() {
        return Err(());
    }

    let entered = match track.axis {
        // Side A above the line, side B below; arriving below = entered
        TrackingAxis::Y => current >= track.position,
        // Side A right of the line, side B left; arriving left = entered
        TrackingAxis::X => current <= track.position,
    };
    Ok(Some(entered))
}

/// Render "<Kind> Enter"/"<Kind> Exit", applying the inversion flag.
/// Kind matches vehicle before human before the generic object.
fn render(detection_target: &str, entered: bool, invert: bool) -> String {
    let lower = detection_target.to_lowercase();
    let kind = if lower.contains("vehicle") || lower.contains("car") {
        "Vehicle"
    } else if lower.contains("human") {
        "Human"
    } else {
        "Object"
    };
    let entered = entered != invert;
    format!("{} {}", kind, if entered { "Enter" } else { "Exit" })
}

/// Margin-tolerant side classification, for diagnostics only
fn calculated_side(input: &DirectionInput, margin: f64) -> &'static str {
    let Some(track) = input.track else {
        return "Position unknown";
    };
    match track.axis {
        TrackingAxis::Y => match input.target_y {
            Some(y) if (y - track.position).abs() <= margin => "on line",
            Some(y) if y < track.position => "above",
            Some(_) => "below",
            None => "Position unknown",
        },
        TrackingAxis::X => match input.target_x {
            Some(x) if (x - track.position).abs() <= margin => "on line",
            Some(x) if x > track.position => "right",
            Some(_) => "left",
            None => "Position unknown",
        },
    }
}
