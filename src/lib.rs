//! Camera Webhook Analytics Processor
//!
//! Receives multipart webhook payloads from IP camera analytics firmwares,
//! extracts structured fields and embedded JPEG images, derives a
//! directional decision for line-crossing events, and republishes
//! everything as key/value updates to an external state store.
//!
//! ## Architecture
//!
//! 1. WebAPI - webhook ingestion, health and info endpoints
//! 2. EventRouter - payload classification and dispatch
//! 3. JsonLocator - embedded analytics JSON location/decoding
//! 4. XmlLocator - embedded line-crossing alert parsing and geometry
//! 5. AnalyticsMapper - normalized attribute mapping
//! 6. DirectionResolver - Enter/Exit decision for crossings
//! 7. ImageExtractor - JPEG extraction from multipart bytes
//! 8. Publisher - state-store updates and viewer file persistence
//! 9. WebhookLog - bounded raw payload dumps
//!
//! ## Design Principles
//!
//! - The parsing/decision core is pure and synchronous per request
//! - All configuration is resolved once at startup and passed explicitly
//! - Extractors report absence, they never throw

pub mod analytics_mapper;
pub mod config;
pub mod direction_resolver;
pub mod error;
pub mod event_router;
pub mod image_extractor;
pub mod json_locator;
pub mod models;
pub mod publisher;
pub mod state;
pub mod web_api;
pub mod webhook_log;
pub mod xml_locator;

pub use error::{Error, Result};
pub use state::AppState;
