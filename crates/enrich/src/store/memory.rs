use std::collections::HashMap;

use seoforge_core::{ProductId, ProductRecord};
use tokio::sync::RwLock;

use super::{model_key, ProductStore, StoreError};

#[derive(Default)]
struct Inner {
    records: HashMap<ProductId, ProductRecord>,
    by_model: HashMap<String, ProductId>,
}

/// Process-local store. Every save happens under one write lock, so a
/// record and its model-number index entry always change together.
#[derive(Default)]
pub struct InMemoryProductStore {
    inner: RwLock<Inner>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }
}

#[async_trait::async_trait]
impl ProductStore for InMemoryProductStore {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>, StoreError> {
        Ok(self.inner.read().await.records.get(&id).cloned())
    }

    async fn find_by_model_number(&self, model_number: &str) -> Result<Option<ProductRecord>, StoreError> {
        let Some(key) = model_key(Some(model_number)) else {
            return Ok(None);
        };
        let inner = self.inner.read().await;
        Ok(inner
            .by_model
            .get(&key)
            .and_then(|id| inner.records.get(id))
            .cloned())
    }

    async fn save(&self, record: &ProductRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let new_key = model_key(record.model_number.as_deref());
        if let Some(key) = &new_key {
            if let Some(existing) = inner.by_model.get(key) {
                if *existing != record.id {
                    return Err(StoreError::ModelNumberConflict {
                        model_number: key.clone(),
                        existing: *existing,
                    });
                }
            }
        }
        let old_key = inner
            .records
            .get(&record.id)
            .and_then(|r| model_key(r.model_number.as_deref()));
        if let Some(old) = old_key {
            if Some(&old) != new_key.as_ref() {
                inner.by_model.remove(&old);
            }
        }
        if let Some(key) = new_key {
            inner.by_model.insert(key, record.id);
        }
        inner.records.insert(record.id, record.clone());
        Ok(())
    }
}
