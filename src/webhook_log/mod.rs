//! WebhookLog - Bounded raw payload dumps
//!
//! ## Responsibilities
//!
//! - Dump each raw webhook payload to a timestamped text file
//! - Keep only the most recent N dumps, deleting oldest-by-mtime first
//!
//! Dumps exist for debugging camera firmware quirks; a failed dump or
//! cleanup is logged and never affects request processing.

use crate::error::Result;
use chrono::Local;
use std::path::PathBuf;
use std::time::SystemTime;
use tokio::fs;

const DUMP_PREFIX: &str = "webhook_";
const DUMP_SUFFIX: &str = ".txt";

/// Raw payload dump writer with bounded retention
pub struct WebhookLog {
    dir: PathBuf,
    max_files: usize,
    enabled: bool,
}

impl WebhookLog {
    /// Create the log and its directory. Directory creation failure is
    /// fatal at startup.
    pub async fn new(dir: PathBuf, max_files: usize, enabled: bool) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            max_files,
            enabled,
        })
    }

    /// Dump one payload and prune old dumps. Failures are logged only.
    pub async fn record(&self, text: &str) {
        if !self.enabled || text.is_empty() {
            return;
        }

        let filename = format!(
            "{}{}{}",
            DUMP_PREFIX,
            Local::now().format("%Y%m%d_%H%M%S"),
            DUMP_SUFFIX
        );
        let path = self.dir.join(&filename);
        if let Err(e) = fs::write(&path, text).await {
            tracing::error!(path = %path.display(), error = %e, "Failed to dump webhook");
            return;
        }
        tracing::debug!(path = %path.display(), bytes = text.len(), "Dumped webhook");

        match self.cleanup().await {
            Ok(0) => {}
            Ok(deleted) => tracing::info!(deleted, "Pruned old webhook dumps"),
            Err(e) => tracing::error!(error = %e, "Webhook dump cleanup failed"),
        }
    }

    /// Delete oldest dumps beyond `max_files`, returning the delete count
    pub async fn cleanup(&self) -> Result<usize> {
        let mut dumps: Vec<(SystemTime, PathBuf)> = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(DUMP_PREFIX) || !name.ends_with(DUMP_SUFFIX) {
                continue;
            }
            let modified = entry
                .metadata()
                .await?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);
            dumps.push((modified, entry.path()));
        }

        if dumps.len() <= self.max_files {
            return Ok(0);
        }

        dumps.sort_by_key(|(modified, _)| *modified);
        let excess = dumps.len() - self.max_files;
        let mut deleted = 0;
        for (_, path) in dumps.into_iter().take(excess) {
            match fs::remove_file(&path).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to delete dump")
                }
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_log_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let log = WebhookLog::new(dir.path().to_path_buf(), 10, false)
            .await
            .unwrap();
        log.record("payload").await;

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let log = WebhookLog::new(dir.path().to_path_buf(), 2, true)
            .await
            .unwrap();

        for i in 0..4 {
            let path = dir.path().join(format!("webhook_2026010100000{}.txt", i));
            std::fs::write(&path, "x").unwrap();
            let mtime = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000 + i);
            let file = std::fs::File::options().append(true).open(&path).unwrap();
            file.set_modified(mtime).unwrap();
        }

        let deleted = log.cleanup().await.unwrap();
        assert_eq!(deleted, 2);

        let remaining: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().any(|n| n.ends_with("2.txt")));
        assert!(remaining.iter().any(|n| n.ends_with("3.txt")));
    }

    #[tokio::test]
    async fn test_cleanup_ignores_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        let log = WebhookLog::new(dir.path().to_path_buf(), 0, true)
            .await
            .unwrap();

        std::fs::write(dir.path().join("notes.md"), "keep me").unwrap();
        let deleted = log.cleanup().await.unwrap();
        assert_eq!(deleted, 0);
        assert!(dir.path().join("notes.md").exists());
    }
}
