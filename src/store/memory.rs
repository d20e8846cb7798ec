use tokio::sync::Mutex;

use super::{ResultStore, StorageHandle};
use crate::config::RetentionPolicy;
use crate::dataset::Dataset;
use crate::error::StoreError;

#[derive(Default)]
struct Inner {
    next_version: u64,
    datasets: Vec<(u64, Dataset)>,
}

/// In-process store. Datasets are kept as-is, without a CSV round trip.
pub struct MemoryStore {
    retention: RetentionPolicy,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new(retention: RetentionPolicy) -> Self {
        Self {
            retention,
            inner: Mutex::new(Inner::default()),
        }
    }
}

#[async_trait::async_trait]
impl ResultStore for MemoryStore {
    async fn store(&self, dataset: &Dataset) -> Result<StorageHandle, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.next_version += 1;
        let version = inner.next_version;

        if self.retention == RetentionPolicy::Replace {
            inner.datasets.clear();
        }
        inner.datasets.push((version, dataset.clone()));

        Ok(StorageHandle {
            version,
            key: format!("memory/{version}"),
        })
    }

    async fn load_latest(&self) -> Result<Dataset, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .datasets
            .last()
            .map(|(_, ds)| ds.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn load_all(&self) -> Result<Vec<Dataset>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.datasets.iter().map(|(_, ds)| ds.clone()).collect())
    }

    async fn clear(&self) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().await;
        let removed = inner.datasets.len();
        inner.datasets.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(column: &str) -> Dataset {
        Dataset::new(vec![column.to_string()])
    }

    #[tokio::test]
    async fn test_versions_are_monotonic_across_clear() {
        let store = MemoryStore::new(RetentionPolicy::Accumulate);
        assert_eq!(store.store(&named("a")).await.unwrap().version, 1);
        store.clear().await.unwrap();
        assert_eq!(store.store(&named("b")).await.unwrap().version, 2);
        assert_eq!(store.load_latest().await.unwrap(), named("b"));
    }

    #[tokio::test]
    async fn test_replace_and_accumulate() {
        let replace = MemoryStore::new(RetentionPolicy::Replace);
        replace.store(&named("a")).await.unwrap();
        replace.store(&named("b")).await.unwrap();
        assert_eq!(replace.load_all().await.unwrap(), vec![named("b")]);

        let accumulate = MemoryStore::new(RetentionPolicy::Accumulate);
        accumulate.store(&named("a")).await.unwrap();
        accumulate.store(&named("b")).await.unwrap();
        assert_eq!(accumulate.load_all().await.unwrap(), vec![named("a"), named("b")]);
    }

    #[tokio::test]
    async fn test_empty_is_not_found() {
        let store = MemoryStore::new(RetentionPolicy::Replace);
        assert!(matches!(store.load_latest().await, Err(StoreError::NotFound)));
    }
}
