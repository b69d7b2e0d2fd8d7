use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use super::{ into_object, Collection, Filter, PersistenceClient, PersistenceError, Record };

/// Process-local record storage. Insertion order doubles as creation order.
#[derive(Default)]
pub struct MemoryPersistence {
    collections: RwLock<HashMap<Collection, Vec<Record>>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(collection: Collection, id: &str) -> PersistenceError {
    PersistenceError::NotFound {
        collection,
        id: id.to_string(),
    }
}

#[async_trait]
impl PersistenceClient for MemoryPersistence {
    async fn create(&self, collection: Collection, data: Value) -> Result<Record, PersistenceError> {
        let record = Record::new(collection, into_object(data)?, Utc::now());
        self.collections.write().await.entry(collection).or_default().push(record.clone());
        Ok(record)
    }

    async fn read(
        &self,
        collection: Collection,
        filter: &Filter
    ) -> Result<Vec<Record>, PersistenceError> {
        let collections = self.collections.read().await;
        Ok(
            collections
                .get(&collection)
                .map(|records| {
                    records
                        .iter()
                        .filter(|r| r.matches(filter))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        )
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Record, PersistenceError> {
        let collections = self.collections.read().await;
        collections
            .get(&collection)
            .and_then(|records| records.iter().find(|r| r.id == id))
            .cloned()
            .ok_or_else(|| not_found(collection, id))
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Value
    ) -> Result<Record, PersistenceError> {
        let patch = into_object(patch)?;
        let mut collections = self.collections.write().await;
        let record = collections
            .get_mut(&collection)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| not_found(collection, id))?;
        record.apply_patch(patch, Utc::now());
        Ok(record.clone())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), PersistenceError> {
        let mut collections = self.collections.write().await;
        let records = collections.get_mut(&collection).ok_or_else(|| not_found(collection, id))?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(not_found(collection, id));
        }
        Ok(())
    }
}
