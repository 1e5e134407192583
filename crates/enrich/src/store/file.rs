use std::collections::HashMap;
use std::path::{Path, PathBuf};

use seoforge_core::{ProductId, ProductRecord};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::{model_key, ProductStore, StoreError};

/// Filesystem-backed product persistence.
///
/// ```text
/// products/
///   67e55044-10b1-426f-9247-bb680e5fe0c8.json
///   ...
/// ```
///
/// Saves write `{id}.json.tmp` and rename it over `{id}.json`, so readers
/// never see a half-written record. The model-number index is rebuilt from
/// disk on open and kept in memory afterwards.
pub struct JsonFileProductStore {
    base_dir: PathBuf,
    by_model: RwLock<HashMap<String, ProductId>>,
}

impl JsonFileProductStore {
    /// Open (or create) a store rooted at `base_dir`.
    pub async fn open(base_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_dir = base_dir.into();
        tokio::fs::create_dir_all(&base_dir).await?;

        let mut by_model = HashMap::new();
        let mut entries = tokio::fs::read_dir(&base_dir).await?;
        let mut loaded = 0usize;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_record(&path).await {
                Ok(record) => {
                    if let Some(key) = model_key(record.model_number.as_deref()) {
                        by_model.insert(key, record.id);
                    }
                    loaded += 1;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable product file"),
            }
        }
        info!(dir = %base_dir.display(), records = loaded, "Opened product store");

        Ok(Self {
            base_dir,
            by_model: RwLock::new(by_model),
        })
    }

    /// Base path for this store.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn record_path(&self, id: ProductId) -> PathBuf {
        self.base_dir.join(format!("{}.json", id))
    }
}

async fn read_record(path: &Path) -> Result<ProductRecord, StoreError> {
    let json = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&json)?)
}

#[async_trait::async_trait]
impl ProductStore for JsonFileProductStore {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>, StoreError> {
        let path = self.record_path(id);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }
        Ok(Some(read_record(&path).await?))
    }

    async fn find_by_model_number(&self, model_number: &str) -> Result<Option<ProductRecord>, StoreError> {
        let Some(key) = model_key(Some(model_number)) else {
            return Ok(None);
        };
        let id = self.by_model.read().await.get(&key).copied();
        match id {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn save(&self, record: &ProductRecord) -> Result<(), StoreError> {
        // Held across the write so index and file change together.
        let mut index = self.by_model.write().await;
        let new_key = model_key(record.model_number.as_deref());
        if let Some(key) = &new_key {
            if let Some(existing) = index.get(key) {
                if *existing != record.id {
                    return Err(StoreError::ModelNumberConflict {
                        model_number: key.clone(),
                        existing: *existing,
                    });
                }
            }
        }

        let path = self.record_path(record.id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        index.retain(|_, id| *id != record.id);
        if let Some(key) = new_key {
            index.insert(key, record.id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seoforge_core::ProductInput;

    #[tokio::test]
    async fn round_trip_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let record = ProductRecord::from_input(&ProductInput::with_model("GSP180").brand("Bosch"));
        {
            let store = JsonFileProductStore::open(dir.path()).await.unwrap();
            store.save(&record).await.unwrap();
            assert_eq!(store.find_by_id(record.id).await.unwrap(), Some(record.clone()));
        }

        let reopened = JsonFileProductStore::open(dir.path()).await.unwrap();
        let found = reopened.find_by_model_number("GSP180").await.unwrap().unwrap();
        assert_eq!(found.id, record.id);
        assert_eq!(found.brand.as_deref(), Some("Bosch"));
        assert!(!dir.path().join(format!("{}.json.tmp", record.id)).exists());
    }

    #[tokio::test]
    async fn missing_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileProductStore::open(dir.path()).await.unwrap();
        assert!(store.find_by_id(uuid::Uuid::new_v4()).await.unwrap().is_none());
        assert!(store.find_by_model_number("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn conflicting_model_number_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileProductStore::open(dir.path()).await.unwrap();
        let a = ProductRecord::from_input(&ProductInput::with_model("M1"));
        let b = ProductRecord::from_input(&ProductInput::with_model("M1"));
        store.save(&a).await.unwrap();
        assert!(matches!(
            store.save(&b).await,
            Err(StoreError::ModelNumberConflict { .. })
        ));
    }
}
