//! Adapter construction and process-wide memoization.

use crate::config::{StorageBackend, StorageConfig};
use crate::storage::adapter::StorageAdapter;
use crate::storage::embedded::EmbeddedAdapter;
use crate::storage::facade::Storage;
use crate::storage::relational::RelationalAdapter;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

static SHARED: OnceCell<Arc<Storage>> = OnceCell::const_new();

/// Chooses the adapter implementation once per process. Backend switching
/// at runtime is unsupported: the first call to [`StorageFactory::shared`]
/// pins the instance for the process lifetime. Tests use
/// [`StorageFactory::build`] to get fresh, independent instances.
pub struct StorageFactory;

impl StorageFactory {
    /// Construct a fresh adapter for the configured backend.
    pub fn build(config: &StorageConfig) -> Arc<dyn StorageAdapter> {
        match config.backend {
            StorageBackend::Embedded => Arc::new(EmbeddedAdapter::new(&config.data_dir)),
            StorageBackend::Sqlite | StorageBackend::Mysql | StorageBackend::Postgresql => {
                Arc::new(RelationalAdapter::new(&config.database_url))
            }
        }
    }

    /// The process-wide storage handle. Every call returns the same
    /// instance; the configuration of the first call wins.
    pub async fn shared(config: &StorageConfig) -> Arc<Storage> {
        SHARED
            .get_or_init(|| async {
                info!(backend = ?config.backend, "storage backend selected");
                Arc::new(Storage::new(Self::build(config)))
            })
            .await
            .clone()
    }
}
