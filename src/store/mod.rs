//! Persistence for processed datasets.
//!
//! [`ResultStore`] is the async trait the CLI and map aggregation depend on.
//! [`LocalStore`] keeps one CSV per stored dataset in a directory.
//! [`MemoryStore`] keeps datasets in process, for tests and embedding.
//!
//! Every stored dataset gets a monotonically increasing version; "latest"
//! always means the highest version, never the newest file timestamp.

mod local;
mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

use std::fmt;

use crate::dataset::Dataset;
use crate::error::StoreError;

/// Identifies one stored dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageHandle {
    pub version: u64,
    pub key: String,
}

impl fmt::Display for StorageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (v{})", self.key, self.version)
    }
}

#[async_trait::async_trait]
pub trait ResultStore: Send + Sync {
    /// Persists a processed dataset, applying the store's retention policy.
    async fn store(&self, dataset: &Dataset) -> Result<StorageHandle, StoreError>;

    /// Returns the most recently stored dataset, or [`StoreError::NotFound`].
    async fn load_latest(&self) -> Result<Dataset, StoreError>;

    /// Returns every retained dataset, oldest first.
    async fn load_all(&self) -> Result<Vec<Dataset>, StoreError>;

    /// Deletes every retained dataset and returns how many were removed.
    async fn clear(&self) -> Result<usize, StoreError>;
}
