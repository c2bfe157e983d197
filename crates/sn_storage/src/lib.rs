use sn_core::{Error, Result, Storage};
use std::path::Path;
use std::sync::Arc;

pub mod backends;

pub use backends::*;

/// Database file used when no path is given.
pub const DEFAULT_DB_PATH: &str = "stocks.db";

/// Build the backend named on the command line. `path` only applies to SQLite.
pub async fn create_storage(kind: &str, path: Option<&Path>) -> Result<Arc<dyn Storage>> {
    match kind {
        "memory" => Ok(Arc::new(InMemoryStorage::new())),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = path.unwrap_or_else(|| Path::new(DEFAULT_DB_PATH));
            let storage = SQLiteStorage::new_with_path(path).await?;
            Ok(Arc::new(storage))
        }
        other => Err(Error::Validation(format!("Unknown storage backend: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sn_core::StockStorage;

    #[tokio::test]
    async fn test_create_memory_storage() {
        let storage = create_storage("memory", None).await.unwrap();
        assert!(storage.all_stocks().await.unwrap().is_empty());
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_create_sqlite_storage() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("stocks.db");
        let storage = create_storage("sqlite", Some(&path)).await.unwrap();
        storage.add_stock("Acme").await.unwrap();
        storage.close().await;
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_memory_storage_ignores_path() {
        let storage = create_storage("memory", Some(Path::new("/nonexistent/stocks.db")))
            .await
            .unwrap();
        storage.add_stock("Acme").await.unwrap();
        assert!(!Path::new("/nonexistent/stocks.db").exists());
    }

    #[tokio::test]
    async fn test_unknown_backend() {
        assert!(matches!(
            create_storage("qdrant", None).await,
            Err(Error::Validation(_))
        ));
    }
}
