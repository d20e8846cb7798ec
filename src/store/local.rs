use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use super::{ResultStore, StorageHandle};
use crate::config::{RetentionPolicy, StoreConfig};
use crate::dataset::Dataset;
use crate::error::StoreError;
use crate::output::to_csv_bytes;

const FILE_PREFIX: &str = "processed_data_";

/// Directory-backed store writing `processed_data_<version>_<timestamp>.csv`.
pub struct LocalStore {
    dir: PathBuf,
    retention: RetentionPolicy,
}

impl LocalStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            dir: config.dir,
            retention: config.retention,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stored files sorted by version. A missing directory is an empty store.
    async fn entries(&self) -> Result<Vec<(u64, PathBuf)>, StoreError> {
        let mut read_dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name();
            if let Some(version) = name.to_str().and_then(parse_version) {
                entries.push((version, entry.path()));
            }
        }
        entries.sort_by_key(|(version, _)| *version);
        Ok(entries)
    }

    async fn read(path: &Path) -> Result<Dataset, StoreError> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Dataset::from_csv_bytes(&bytes)?)
    }
}

/// Extracts the version from `processed_data_00000042_20260101_120000.csv`.
fn parse_version(file_name: &str) -> Option<u64> {
    let rest = file_name.strip_prefix(FILE_PREFIX)?.strip_suffix(".csv")?;
    let (version, _timestamp) = rest.split_once('_')?;
    version.parse().ok()
}

fn file_name(version: u64) -> String {
    format!(
        "{FILE_PREFIX}{version:08}_{}.csv",
        Utc::now().format("%Y%m%d_%H%M%S")
    )
}

#[async_trait::async_trait]
impl ResultStore for LocalStore {
    #[tracing::instrument(skip_all, fields(dir = %self.dir.display(), retention = ?self.retention))]
    async fn store(&self, dataset: &Dataset) -> Result<StorageHandle, StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let existing = self.entries().await?;
        let version = existing.last().map_or(1, |(v, _)| v + 1);
        let key = file_name(version);
        let path = self.dir.join(&key);

        tokio::fs::write(&path, to_csv_bytes(dataset)?).await?;
        info!(path = %path.display(), rows = dataset.len(), version, "Stored processed data");

        if self.retention == RetentionPolicy::Replace {
            for (old_version, old_path) in existing {
                match tokio::fs::remove_file(&old_path).await {
                    Ok(()) => debug!(path = %old_path.display(), version = old_version, "Deleted old file"),
                    Err(e) => warn!(path = %old_path.display(), error = %e, "Error deleting old file"),
                }
            }
        }

        Ok(StorageHandle { version, key })
    }

    async fn load_latest(&self) -> Result<Dataset, StoreError> {
        let entries = self.entries().await?;
        let (version, path) = entries.last().ok_or(StoreError::NotFound)?;
        debug!(path = %path.display(), version, "Reading from latest file");
        Self::read(path).await
    }

    async fn load_all(&self) -> Result<Vec<Dataset>, StoreError> {
        let entries = self.entries().await?;
        info!(count = entries.len(), "Found processed files");

        let mut datasets = Vec::with_capacity(entries.len());
        for (_, path) in entries {
            match Self::read(&path).await {
                Ok(dataset) => datasets.push(dataset),
                // A file deleted by a concurrent clear is simply gone.
                Err(StoreError::Io(e)) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Error processing file");
                }
            }
        }
        Ok(datasets)
    }

    async fn clear(&self) -> Result<usize, StoreError> {
        let entries = self.entries().await?;
        let mut removed = 0;
        for (_, path) in entries {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        info!(removed, "All processed data files have been deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::env;

    fn temp_store(name: &str, retention: RetentionPolicy) -> LocalStore {
        let dir = env::temp_dir().join(format!("rci_rater_test_{name}"));
        let _ = std::fs::remove_dir_all(&dir); // clean up any prior run
        LocalStore::new(StoreConfig { dir, retention })
    }

    fn sample(rci: f64) -> Dataset {
        let mut ds = Dataset::new(vec!["coordinate".into(), "Ride_Comfort_Index".into()]);
        ds.push_row(vec![json!("35.0,139.0"), json!(rci)]);
        ds
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("processed_data_00000042_20260101_120000.csv"), Some(42));
        assert_eq!(parse_version("processed_data_x_20260101.csv"), None);
        assert_eq!(parse_version("other.csv"), None);
        assert_eq!(parse_version(&file_name(7)), Some(7));
    }

    #[tokio::test]
    async fn test_empty_store_is_not_found() {
        let store = temp_store("empty", RetentionPolicy::Replace);
        assert!(matches!(store.load_latest().await, Err(StoreError::NotFound)));
        assert!(store.load_all().await.unwrap().is_empty());
        assert_eq!(store.clear().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_replace_keeps_only_latest() {
        let store = temp_store("replace", RetentionPolicy::Replace);

        let first = store.store(&sample(0.5)).await.unwrap();
        let second = store.store(&sample(1.5)).await.unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);

        let all = store.load_all().await.unwrap();
        assert_eq!(all.len(), 1);

        let latest = store.load_latest().await.unwrap();
        assert_eq!(latest.records[0].cells[1], json!("1.500000"));

        std::fs::remove_dir_all(store.dir()).unwrap();
    }

    #[tokio::test]
    async fn test_accumulate_keeps_everything() {
        let store = temp_store("accumulate", RetentionPolicy::Accumulate);

        store.store(&sample(0.5)).await.unwrap();
        store.store(&sample(1.5)).await.unwrap();
        store.store(&sample(2.5)).await.unwrap();

        let all = store.load_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].records[0].cells[1], json!("0.500000"));

        let latest = store.load_latest().await.unwrap();
        assert_eq!(latest.records[0].cells[1], json!("2.500000"));

        assert_eq!(store.clear().await.unwrap(), 3);
        assert!(matches!(store.load_latest().await, Err(StoreError::NotFound)));

        std::fs::remove_dir_all(store.dir()).unwrap();
    }
}
