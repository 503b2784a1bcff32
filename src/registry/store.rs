//! Persisted registry store.
//!
//! The whole table is rewritten on every mutation as pretty-printed JSON.
//! Writes go to a sibling temp file first and are renamed into place, so a
//! crash mid-write never leaves a truncated document behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::PersistenceError;
use crate::registry::table::RegistryTable;

/// JSON file backing the service registry.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted table, creating an empty one on first run.
    pub async fn load(&self) -> Result<RegistryTable, PersistenceError> {
        match fs::read(&self.path).await {
            Ok(bytes) => {
                let mut table: RegistryTable = serde_json::from_slice(&bytes)?;
                table.normalize();
                tracing::info!(
                    path = %self.path.display(),
                    services = table.len(),
                    "Service registry loaded"
                );
                Ok(table)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "Creating new service registry");
                let table = RegistryTable::new();
                self.save(&table).await?;
                Ok(table)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the persisted table.
    pub async fn save(&self, table: &RegistryTable) -> Result<(), PersistenceError> {
        let json = serde_json::to_vec_pretty(table)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let tmp = self.tmp_path();
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;

        tracing::trace!(path = %self.path.display(), "Service registry persisted");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("serviceRegistry.json");
        let store = RegistryStore::new(&path);

        let table = store.load().await.unwrap();
        assert!(table.is_empty());

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk.trim(), "{}");
    }

    #[tokio::test]
    async fn test_saved_table_is_pretty_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("serviceRegistry.json");
        let store = RegistryStore::new(&path);

        let mut table = RegistryTable::new();
        table.insert("itemService", "http://localhost:3002", 1_700_000_000_000);
        store.save(&table).await.unwrap();

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("\n  \"itemService\": ["));
        assert!(on_disk.contains("\"lastHealthCheck\": 1700000000000"));
        assert!(!dir.path().join("serviceRegistry.json.tmp").exists());

        assert_eq!(store.load().await.unwrap(), table);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("serviceRegistry.json");
        std::fs::write(&path, "not json").unwrap();

        let err = RegistryStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, PersistenceError::Serialization(_)));
    }
}
