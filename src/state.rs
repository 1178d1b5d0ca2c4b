//! Application state
//!
//! Holds configuration and all shared services

use crate::config::ProcessorConfig;
use crate::publisher::{ImageStore, StateStoreClient};
use crate::webhook_log::WebhookLog;
use std::path::PathBuf;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// State store base URL
    pub store_url: String,
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Directory for raw webhook dumps
    pub webhook_dump_dir: PathBuf,
    /// Directory the web viewer reads images from
    pub viewer_dir: PathBuf,
    /// Maximum retained webhook dumps
    pub max_webhook_files: usize,
    /// Whether raw webhook dumping is enabled
    pub log_webhooks: bool,
    /// Latest detection image filename
    pub image_filename: String,
    /// Latest detection timestamp filename
    pub timestamp_filename: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_url: std::env::var("STORE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5001),
            webhook_dump_dir: std::env::var("WEBHOOK_DUMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/var/lib/camhook/webhooks")),
            viewer_dir: std::env::var("VIEWER_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/var/lib/camhook/html")),
            max_webhook_files: std::env::var("MAX_WEBHOOK_FILES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
            log_webhooks: std::env::var("LOG_WEBHOOKS")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            image_filename: std::env::var("IMAGE_FILENAME")
                .unwrap_or_else(|_| "camera_latest.jpg".to_string()),
            timestamp_filename: std::env::var("TIMESTAMP_FILENAME")
                .unwrap_or_else(|_| "camera_latest_time.txt".to_string()),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub processor: Arc<ProcessorConfig>,
    pub store: Arc<StateStoreClient>,
    pub images: Arc<ImageStore>,
    pub webhook_log: Arc<WebhookLog>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn uptime_sec(&self) -> u64 {
        (chrono::Utc::now() - self.started_at).num_seconds().max(0) as u64
    }
}
