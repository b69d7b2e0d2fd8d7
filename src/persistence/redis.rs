use async_trait::async_trait;
use chrono::{ DateTime, Utc };
use log::{ debug, error };
use redis::{ AsyncCommands, Client, Script };
use serde_json::{ Map, Value };
use std::collections::HashMap;
use super::{
    into_object,
    sort_by_creation,
    Collection,
    Filter,
    PersistenceClient,
    PersistenceError,
    Record,
};

/// Writes `ARGV[3]` only if the field still holds `ARGV[2]`.
const COMPARE_AND_SET: &str =
    r#"
if redis.call('HGET', KEYS[1], ARGV[1]) ~= ARGV[2] then
    return 0
end
redis.call('HSET', KEYS[1], ARGV[1], ARGV[3])
return 1
"#;

const MAX_UPDATE_ATTEMPTS: usize = 32;

/// Applies `patch` to a stored record, returning the record and its new JSON.
fn patched(
    current_json: &str,
    patch: &Map<String, Value>,
    now: DateTime<Utc>
) -> Result<(Record, String), PersistenceError> {
    let mut record: Record = serde_json::from_str(current_json)?;
    record.apply_patch(patch.clone(), now);
    let json = serde_json::to_string(&record)?;
    Ok((record, json))
}

/// One Redis hash per collection, keyed by record id.
pub struct RedisPersistence {
    client: Client,
    key_prefix: String,
}

impl RedisPersistence {
    pub fn new(host: &str, key_prefix: &str) -> Result<Self, PersistenceError> {
        Ok(Self {
            client: Client::open(host)?,
            key_prefix: key_prefix.to_string(),
        })
    }

    fn key(&self, collection: Collection) -> String {
        format!("{}{}", self.key_prefix, collection)
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    async fn store(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        record: &Record
    ) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(record)?;
        let _: i64 = conn.hset(self.key(record.collection), &record.id, json).await?;
        Ok(())
    }

    async fn fetch(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        collection: Collection,
        id: &str
    ) -> Result<Record, PersistenceError> {
        let json: Option<String> = conn.hget(self.key(collection), id).await?;
        match json {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None =>
                Err(PersistenceError::NotFound {
                    collection,
                    id: id.to_string(),
                }),
        }
    }
}

#[async_trait]
impl PersistenceClient for RedisPersistence {
    async fn create(&self, collection: Collection, data: Value) -> Result<Record, PersistenceError> {
        let record = Record::new(collection, into_object(data)?, Utc::now());
        let mut conn = self.get_connection().await?;
        self.store(&mut conn, &record).await?;
        Ok(record)
    }

    async fn read(
        &self,
        collection: Collection,
        filter: &Filter
    ) -> Result<Vec<Record>, PersistenceError> {
        let mut conn = self.get_connection().await?;
        let entries: HashMap<String, String> = conn.hgetall(self.key(collection)).await?;

        let mut records = Vec::with_capacity(entries.len());
        for (id, json) in entries {
            match serde_json::from_str::<Record>(&json) {
                Ok(record) if record.matches(filter) => records.push(record),
                Ok(_) => {}
                Err(e) => error!("Skipping unreadable record '{}' in {}: {}", id, collection, e),
            }
        }
        sort_by_creation(&mut records);
        Ok(records)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Record, PersistenceError> {
        let mut conn = self.get_connection().await?;
        self.fetch(&mut conn, collection, id).await
    }

    /// Read, merge and compare-and-set, retried when another writer got in
    /// between, so concurrent patches never drop each other's fields.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Value
    ) -> Result<Record, PersistenceError> {
        let patch = into_object(patch)?;
        let mut conn = self.get_connection().await?;
        let key = self.key(collection);
        let script = Script::new(COMPARE_AND_SET);

        for _ in 0..MAX_UPDATE_ATTEMPTS {
            let current: Option<String> = conn.hget(&key, id).await?;
            let Some(current) = current else {
                return Err(PersistenceError::NotFound {
                    collection,
                    id: id.to_string(),
                });
            };

            let (record, json) = patched(&current, &patch, Utc::now())?;
            let written: i64 = script
                .key(&key)
                .arg(id)
                .arg(&current)
                .arg(&json)
                .invoke_async(&mut conn).await?;
            if written == 1 {
                return Ok(record);
            }
            debug!("Record '{}' in {} changed during update, retrying", id, collection);
        }

        Err(
            PersistenceError::Backend(
                format!("record '{}' in {} kept changing during update", id, collection)
            )
        )
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), PersistenceError> {
        let mut conn = self.get_connection().await?;
        let removed: i64 = conn.hdel(self.key(collection), id).await?;
        if removed == 0 {
            return Err(PersistenceError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
