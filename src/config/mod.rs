//! ProcessorConfig - Immutable processing configuration
//!
//! ## Responsibilities
//!
//! - Camera resolution used to normalize line geometry
//! - Region id -> declared direction mapping
//! - Direction inversion flag and position margin
//! - External item names for every published attribute
//!
//! Constructed once at startup with validation; invalid values fall back
//! to documented defaults with a warning. Passed explicitly into every
//! component, no ambient global state.

use std::collections::HashMap;

/// Fallback resolution when configured width/height is missing or zero
pub const DEFAULT_RESOLUTION: (u32, u32) = (1920, 1080);

/// Fallback position margin, must be in (0, 1]
pub const DEFAULT_POSITION_MARGIN: f64 = 0.05;

/// Default prefix for external item names (e.g. `Camera_ChannelName`)
pub const DEFAULT_ITEM_PREFIX: &str = "Camera";

/// Closed set of published attribute keys.
///
/// Configuration supplies only the external name string per key; the set
/// itself is fixed so every publish site is checked at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKey {
    // Body/face detection
    ChannelName,
    EventType,
    Timestamp,
    JacketColor,
    TrousersColor,
    JacketType,
    TrousersType,
    HasHat,
    HasGlasses,
    HasBag,
    HasThings,
    HasMask,
    HasRide,
    Gender,
    AgeGroup,
    HairStyle,
    FaceExpression,
    Age,
    MotionDirection,
    FaceScore,
    HumanScore,
    // Line crossing
    CrossingDirection,
    CrossingObjectType,
    CrossingRegion,
    CrossingTime,
    CrossingChannel,
    CrossingImage,
}

impl AttributeKey {
    /// All keys, in publication order
    pub const ALL: [AttributeKey; 27] = [
        AttributeKey::ChannelName,
        AttributeKey::EventType,
        AttributeKey::Timestamp,
        AttributeKey::JacketColor,
        AttributeKey::TrousersColor,
        AttributeKey::JacketType,
        AttributeKey::TrousersType,
        AttributeKey::HasHat,
        AttributeKey::HasGlasses,
        AttributeKey::HasBag,
        AttributeKey::HasThings,
        AttributeKey::HasMask,
        AttributeKey::HasRide,
        AttributeKey::Gender,
        AttributeKey::AgeGroup,
        AttributeKey::HairStyle,
        AttributeKey::FaceExpression,
        AttributeKey::Age,
        AttributeKey::MotionDirection,
        AttributeKey::FaceScore,
        AttributeKey::HumanScore,
        AttributeKey::CrossingDirection,
        AttributeKey::CrossingObjectType,
        AttributeKey::CrossingRegion,
        AttributeKey::CrossingTime,
        AttributeKey::CrossingChannel,
        AttributeKey::CrossingImage,
    ];

    /// Canonical suffix, also the key used for per-item overrides
    pub fn suffix(self) -> &'static str {
        match self {
            AttributeKey::ChannelName => "ChannelName",
            AttributeKey::EventType => "EventType",
            AttributeKey::Timestamp => "Timestamp",
            AttributeKey::JacketColor => "JacketColor",
            AttributeKey::TrousersColor => "TrousersColor",
            AttributeKey::JacketType => "JacketType",
            AttributeKey::TrousersType => "TrousersType",
            AttributeKey::HasHat => "HasHat",
            AttributeKey::HasGlasses => "HasGlasses",
            AttributeKey::HasBag => "HasBag",
            AttributeKey::HasThings => "HasThings",
            AttributeKey::HasMask => "HasMask",
            AttributeKey::HasRide => "HasRide",
            AttributeKey::Gender => "Gender",
            AttributeKey::AgeGroup => "AgeGroup",
            AttributeKey::HairStyle => "HairStyle",
            AttributeKey::FaceExpression => "FaceExpression",
            AttributeKey::Age => "Age",
            AttributeKey::MotionDirection => "MotionDirection",
            AttributeKey::FaceScore => "FaceScore",
            AttributeKey::HumanScore => "HumanScore",
            AttributeKey::CrossingDirection => "CrossingDirection",
            AttributeKey::CrossingObjectType => "CrossingObjectType",
            AttributeKey::CrossingRegion => "CrossingRegion",
            AttributeKey::CrossingTime => "CrossingTime",
            AttributeKey::CrossingChannel => "CrossingChannel",
            AttributeKey::CrossingImage => "CrossingImage",
        }
    }
}

/// External item names for published attributes.
///
/// Names default to `<prefix>_<suffix>`; individual keys can be overridden
/// via a suffix-keyed map (`ITEM_NAME_OVERRIDES` as a JSON object).
#[derive(Debug, Clone)]
pub struct ItemNames {
    prefix: String,
    overrides: HashMap<String, String>,
}

impl Default for ItemNames {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_ITEM_PREFIX.to_string(),
            overrides: HashMap::new(),
        }
    }
}

impl ItemNames {
    pub fn new(prefix: impl Into<String>, overrides: HashMap<String, String>) -> Self {
        Self {
            prefix: prefix.into(),
            overrides,
        }
    }

    /// External name for a key
    pub fn name(&self, key: AttributeKey) -> String {
        match self.overrides.get(key.suffix()) {
            Some(name) => name.clone(),
            None => format!("{}_{}", self.prefix, key.suffix()),
        }
    }
}

/// Immutable processor configuration, validated at construction
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Camera resolution (width, height) for geometry normalization
    pub resolution: (u32, u32),
    /// Region id -> declared direction ("enter"/"exit")
    pub region_directions: HashMap<String, String>,
    /// Flip Enter<->Exit for inferred directions
    pub invert_direction: bool,
    /// Jitter tolerance for the advisory side classification, in (0, 1]
    pub position_margin: f64,
    /// External item names
    pub items: ItemNames,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            region_directions: HashMap::new(),
            invert_direction: false,
            position_margin: DEFAULT_POSITION_MARGIN,
            items: ItemNames::default(),
        }
    }
}

impl ProcessorConfig {
    /// Build from raw values, applying documented fallbacks.
    ///
    /// Invalid resolution (zero axis) falls back to [`DEFAULT_RESOLUTION`];
    /// a margin outside (0, 1] falls back to [`DEFAULT_POSITION_MARGIN`].
    /// Both log a warning, neither is fatal.
    pub fn new(
        resolution: (u32, u32),
        region_directions: HashMap<String, String>,
        invert_direction: bool,
        position_margin: f64,
        items: ItemNames,
    ) -> Self {
        let resolution = if resolution.0 == 0 || resolution.1 == 0 {
            tracing::warn!(
                width = resolution.0,
                height = resolution.1,
                "Invalid camera resolution, falling back to default"
            );
            DEFAULT_RESOLUTION
        } else {
            resolution
        };

        let position_margin = if position_margin > 0.0 && position_margin <= 1.0 {
            position_margin
        } else {
            tracing::warn!(
                margin = position_margin,
                "Position margin outside (0, 1], falling back to default"
            );
            DEFAULT_POSITION_MARGIN
        };

        Self {
            resolution,
            region_directions,
            invert_direction,
            position_margin,
            items,
        }
    }

    /// Load from environment variables
    pub fn from_env() -> Self {
        let width = env_u32("CAMERA_WIDTH").unwrap_or(DEFAULT_RESOLUTION.0);
        let height = env_u32("CAMERA_HEIGHT").unwrap_or(DEFAULT_RESOLUTION.1);

        let region_directions = std::env::var("REGION_DIRECTIONS")
            .map(|raw| parse_region_directions(&raw))
            .unwrap_or_default();

        let invert_direction = std::env::var("INVERT_DIRECTION")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let position_margin = std::env::var("POSITION_MARGIN")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(DEFAULT_POSITION_MARGIN);

        let prefix = std::env::var("ITEM_PREFIX")
            .unwrap_or_else(|_| DEFAULT_ITEM_PREFIX.to_string());
        let overrides = std::env::var("ITEM_NAME_OVERRIDES")
            .ok()
            .and_then(|raw| match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => Some(map),
                Err(e) => {
                    tracing::warn!(error = %e, "ITEM_NAME_OVERRIDES is not a JSON object, ignoring");
                    None
                }
            })
            .unwrap_or_default();

        Self::new(
            (width, height),
            region_directions,
            invert_direction,
            position_margin,
            ItemNames::new(prefix, overrides),
        )
    }
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.parse::<u32>().ok())
}

/// Parse `"1:enter,2:exit"` into a region map; malformed entries are skipped
fn parse_region_directions(raw: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        match entry.split_once(':') {
            Some((region, direction)) if !region.trim().is_empty() => {
                map.insert(
                    region.trim().to_string(),
                    direction.trim().to_lowercase(),
                );
            }
            _ => {
                tracing::warn!(entry, "Skipping malformed region direction entry");
            }
        }
    }
    map
}
