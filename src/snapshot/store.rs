//! On-disk rotation of annotated snapshots

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tokio::fs;
use tumbller_shared::now_ms;

/// Keeps the newest few annotated snapshots per device under a public directory
pub struct SnapshotStore {
    dir: PathBuf,
    /// URL under which `dir` is served, without trailing slash
    url_prefix: String,
    retention: usize,
    sequence: AtomicU64,
}

impl SnapshotStore {
    /// Create the store, making sure `dir` exists
    pub async fn new(
        dir: impl Into<PathBuf>,
        url_prefix: impl Into<String>,
        retention: usize,
    ) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;

        Ok(Self {
            dir,
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
            retention: retention.max(1),
            sequence: AtomicU64::new(0),
        })
    }

    /// Write a snapshot, evict older ones and return its public URL
    pub async fn save(&self, device_id: &str, jpeg: &[u8]) -> std::io::Result<String> {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let name = format!("{}_{:013}_{:06}.jpg", device_id, now_ms(), seq);
        fs::write(self.dir.join(&name), jpeg).await?;

        let evicted = self.rotate(device_id).await?;
        if !evicted.is_empty() {
            tracing::debug!(device_id = %device_id, evicted = evicted.len(), "Old snapshots removed");
        }

        Ok(format!("{}/{}", self.url_prefix, name))
    }

    /// Snapshot files for a device, newest first
    pub async fn list(&self, device_id: &str) -> std::io::Result<Vec<PathBuf>> {
        let prefix = format!("{}_", device_id);
        let mut files: Vec<(SystemTime, PathBuf)> = Vec::new();

        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with(&prefix) || !name.ends_with(".jpg") {
                continue;
            }
            let modified = entry
                .metadata()
                .await?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((modified, path));
        }

        // Newest first; names carry a timestamp and sequence for equal mtimes
        files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        Ok(files.into_iter().map(|(_, path)| path).collect())
    }

    /// Public URL of the newest snapshot for a device, if any
    pub async fn latest_url(&self, device_id: &str) -> Option<String> {
        let newest = self.list(device_id).await.ok()?.into_iter().next()?;
        let name = newest.file_name()?.to_str()?;
        Some(format!("{}/{}", self.url_prefix, name))
    }

    async fn rotate(&self, device_id: &str) -> std::io::Result<Vec<PathBuf>> {
        let stale: Vec<PathBuf> = self
            .list(device_id)
            .await?
            .into_iter()
            .skip(self.retention)
            .collect();

        for path in &stale {
            if let Err(e) = fs::remove_file(path).await {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove old snapshot");
            }
        }
        Ok(stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[tokio::test]
    async fn test_keeps_newest_per_device() {
        let dir = TempDir::new("snapshots").unwrap();
        let store = SnapshotStore::new(dir.path(), "/static/snapshots/", 5).await.unwrap();

        let mut urls = Vec::new();
        for i in 0..8u8 {
            urls.push(store.save("A", &[i]).await.unwrap());
        }
        store.save("B", b"b").await.unwrap();

        let kept = store.list("A").await.unwrap();
        assert_eq!(kept.len(), 5);
        assert_eq!(store.list("B").await.unwrap().len(), 1);

        let last = urls.last().unwrap();
        assert!(last.starts_with("/static/snapshots/A_"));
        let newest = kept[0].file_name().unwrap().to_str().unwrap();
        assert!(last.ends_with(newest));
        assert_eq!(store.latest_url("A").await.as_deref(), Some(last.as_str()));
        assert_eq!(store.latest_url("C").await, None);

        // The newest write is the one kept first
        assert_eq!(fs::read(&kept[0]).await.unwrap(), vec![7u8]);
    }
}
