//! Publisher - State-store updates and viewer file persistence
//!
//! ## Responsibilities
//!
//! - PUT each normalized attribute to the state store's items REST API
//! - Persist the latest detection image and timestamp for the web viewer
//! - Persist line-crossing images (timestamped copy + latest copy)
//!
//! Attribute publish failures are logged and never retried; a failed
//! item never aborts the remaining publishes. Viewer files are written
//! atomically (temp file + rename) so a concurrent reader never observes
//! a partial image. Concurrent requests race last-writer-wins.

use crate::error::Result;
use crate::models::NormalizedAttributes;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Per-attribute PUT timeout
const PUT_TIMEOUT: Duration = Duration::from_secs(5);

/// Health probe timeout
const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Filename of the latest line-crossing image copy
const LINECROSS_LATEST: &str = "linecross_latest.jpg";

/// REST client for the external key/value state store
pub struct StateStoreClient {
    client: reqwest::Client,
    base_url: String,
}

impl StateStoreClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(PUT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Update a single item. Returns whether the store accepted it;
    /// transport errors and rejections are logged, not propagated.
    pub async fn put_attribute(&self, name: &str, value: &str) -> bool {
        let url = format!("{}/rest/items/{}/state", self.base_url, name);
        let result = self
            .client
            .put(&url)
            .header("Content-Type", "text/plain")
            .header("Accept", "application/json")
            .body(value.to_string())
            .send()
            .await;

        match result {
            Ok(response) if matches!(response.status().as_u16(), 200 | 201 | 202) => {
                tracing::debug!(item = name, value, "Updated item");
                true
            }
            Ok(response) => {
                tracing::warn!(
                    item = name,
                    status = response.status().as_u16(),
                    "State store rejected item update"
                );
                false
            }
            Err(e) => {
                tracing::error!(item = name, error = %e, "Failed to update item");
                false
            }
        }
    }

    /// Publish every attribute once, in order. Returns the number of
    /// successful updates.
    pub async fn publish(&self, attrs: &NormalizedAttributes) -> usize {
        let mut ok = 0;
        for (name, value) in attrs.iter() {
            if self.put_attribute(name, value).await {
                ok += 1;
            }
        }
        tracing::info!(published = ok, total = attrs.len(), "Published attributes");
        ok
    }

    /// Probe the store's items endpoint
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/rest/items", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Persists detection images and timestamps for the web viewer
pub struct ImageStore {
    viewer_dir: PathBuf,
    image_filename: String,
    timestamp_filename: String,
}

impl ImageStore {
    /// Create the store and its output directory. Directory creation
    /// failure is fatal at startup.
    pub async fn new(
        viewer_dir: PathBuf,
        image_filename: impl Into<String>,
        timestamp_filename: impl Into<String>,
    ) -> Result<Self> {
        fs::create_dir_all(&viewer_dir).await?;
        Ok(Self {
            viewer_dir,
            image_filename: image_filename.into(),
            timestamp_filename: timestamp_filename.into(),
        })
    }

    /// Save the latest body-detection image plus its display time.
    ///
    /// `display_timestamp` is a `YYYY-MM-DD HH:MM:SS` string; only the
    /// time-of-day part is written for the viewer.
    pub async fn save_detection_image(&self, jpeg: &[u8], display_timestamp: &str) -> Result<()> {
        let image_path = self.viewer_dir.join(&self.image_filename);
        write_atomic(&image_path, jpeg).await?;
        tracing::info!(
            path = %image_path.display(),
            size = jpeg.len(),
            "Saved detection image"
        );

        let time_only = display_timestamp
            .split_once(' ')
            .map(|(_, time)| time)
            .unwrap_or(display_timestamp);
        let ts_path = self.viewer_dir.join(&self.timestamp_filename);
        write_atomic(&ts_path, time_only.as_bytes()).await?;
        Ok(())
    }

    /// Save a line-crossing image as a timestamp-named copy plus the
    /// "latest" copy. Returns the generated filename so it can be
    /// published as an attribute.
    pub async fn save_line_crossing_image(&self, jpeg: &[u8], iso_timestamp: &str) -> Result<String> {
        let filename = format!("linecross_{}.jpg", sanitize_timestamp(iso_timestamp));
        write_atomic(&self.viewer_dir.join(&filename), jpeg).await?;
        write_atomic(&self.viewer_dir.join(LINECROSS_LATEST), jpeg).await?;
        tracing::info!(filename = %filename, size = jpeg.len(), "Saved line-crossing image");
        Ok(filename)
    }
}

/// Write to a temp file in the target directory, then rename over the
/// final path. Rename within one directory is atomic, so a concurrent
/// reader sees either the old or the new file, never a partial one.
async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

/// Make an ISO timestamp filesystem-safe
fn sanitize_timestamp(ts: &str) -> String {
    let cleaned: String = ts
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '-' })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_detection_image_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(
            dir.path().to_path_buf(),
            "latest.jpg",
            "latest_time.txt",
        )
        .await
        .unwrap();

        store
            .save_detection_image(&[0xff, 0xd8, 0xff, 0xd9], "2026-02-08 08:29:23")
            .await
            .unwrap();

        let image = std::fs::read(dir.path().join("latest.jpg")).unwrap();
        assert_eq!(image, vec![0xff, 0xd8, 0xff, 0xd9]);

        let time = std::fs::read_to_string(dir.path().join("latest_time.txt")).unwrap();
        assert_eq!(time, "08:29:23");

        // No temp file may survive
        assert!(!dir.path().join("latest.jpg.tmp").exists());
    }

    #[tokio::test]
    async fn test_timestamp_without_date_part_kept_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().to_path_buf(), "i.jpg", "t.txt")
            .await
            .unwrap();

        store
            .save_detection_image(&[0xff, 0xd8, 0xff, 0xd9], "08:29:23")
            .await
            .unwrap();
        let time = std::fs::read_to_string(dir.path().join("t.txt")).unwrap();
        assert_eq!(time, "08:29:23");
    }

    #[tokio::test]
    async fn test_line_crossing_image_writes_named_and_latest() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().to_path_buf(), "i.jpg", "t.txt")
            .await
            .unwrap();

        let filename = store
            .save_line_crossing_image(&[0xff, 0xd8, 0x01, 0xff, 0xd9], "2026-02-08T08:29:23+01:00")
            .await
            .unwrap();

        assert_eq!(filename, "linecross_2026-02-08T08-29-23-01-00.jpg");
        assert!(dir.path().join(&filename).exists());
        assert!(dir.path().join("linecross_latest.jpg").exists());
    }

    #[test]
    fn test_sanitize_timestamp() {
        assert_eq!(
            sanitize_timestamp("2026-02-08T08:29:23+01:00"),
            "2026-02-08T08-29-23-01-00"
        );
        assert_eq!(sanitize_timestamp(""), "unknown");
    }
}
