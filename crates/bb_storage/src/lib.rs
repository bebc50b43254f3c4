use async_trait::async_trait;
use bb_core::{ArticleDraft, ArticleStorage, Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn get_error_message() -> &'static str;
    async fn new(config: &StorageConfig) -> Result<Self> where Self: Sized;
}

/// Where a scraping session keeps its articles.
///
/// Every session gets its own database file, `<data_dir>/<session_id>.db`.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub session_id: String,
}

impl StorageConfig {
    pub fn new(data_dir: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            session_id: session_id.into(),
        }
    }

    /// A fresh session with a random identifier.
    pub fn new_session(data_dir: impl Into<PathBuf>) -> Self {
        Self::new(data_dir, uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.db", self.session_id))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(Path::new("data").join("sessions"), "default")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    #[cfg(feature = "sqlite")]
    SQLite,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            #[cfg(feature = "sqlite")]
            "sqlite" => Ok(StorageKind::SQLite),
            other => Err(Error::Storage(format!("Unknown storage backend: {}", other))),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Memory => f.write_str("memory"),
            #[cfg(feature = "sqlite")]
            StorageKind::SQLite => f.write_str("sqlite"),
        }
    }
}

pub async fn create_storage(kind: StorageKind, config: &StorageConfig) -> Result<Arc<dyn ArticleStorage>> {
    let storage: Arc<dyn ArticleStorage> = match kind {
        StorageKind::Memory => Arc::new(MemoryStorage::new(config).await?),
        #[cfg(feature = "sqlite")]
        StorageKind::SQLite => Arc::new(SQLiteStorage::new(config).await.map_err(|e| {
            tracing::error!("{} ({})", SQLiteStorage::get_error_message(), e);
            e
        })?),
    };
    tracing::info!("🏦 Storage ready (using {}, session {})", kind, config.session_id);
    Ok(storage)
}

/// Logs and rejects drafts that must not reach a backend.
pub(crate) fn accept_draft(draft: &ArticleDraft) -> bool {
    match draft.validate() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("⚠️ Rejected article {}: {}", draft.url, e);
            false
        }
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageConfig, StorageKind};
}
