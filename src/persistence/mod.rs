//! Record persistence for buddy requests, meetings and check-ins.
//!
//! Records are free-form JSON objects stored under a named [`Collection`].
//! Every backend reports failures as a [`PersistenceError`] whose `Display`
//! output is fit to show a user.

mod memory;
mod redis;

pub use memory::MemoryPersistence;
pub use redis::RedisPersistence;

use async_trait::async_trait;
use chrono::{ DateTime, Utc };
use log::info;
use serde::{ Deserialize, Serialize };
use serde_json::{ Map, Value };
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use crate::cli::Args;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    BuddyRequests,
    Meetings,
    CheckIns,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::BuddyRequests,
        Collection::Meetings,
        Collection::CheckIns,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::BuddyRequests => "buddy_requests",
            Collection::Meetings => "meetings",
            Collection::CheckIns => "check_ins",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL.iter()
            .copied()
            .find(|c| c.as_str() == s.to_lowercase())
            .ok_or_else(|| PersistenceError::UnknownCollection(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub collection: Collection,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub data: Map<String, Value>,
}

impl Record {
    fn new(collection: Collection, data: Map<String, Value>, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            collection,
            created_at: now,
            updated_at: now,
            data,
        }
    }

    fn apply_patch(&mut self, patch: Map<String, Value>, now: DateTime<Utc>) {
        for (field, value) in patch {
            self.data.insert(field, value);
        }
        self.updated_at = now;
    }

    fn matches(&self, filter: &Filter) -> bool {
        filter.0.iter().all(|(field, expected)| self.data.get(field) == Some(expected))
    }
}

/// Equality constraints on top-level `data` fields. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(pub Vec<(String, Value)>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.push((field.to_string(), value.into()));
        self
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("no record '{id}' in {collection}")] NotFound {
        collection: Collection,
        id: String,
    },
    #[error("invalid record: {0}")] InvalidRecord(String),
    #[error(
        "unknown collection '{0}' (expected buddy_requests, meetings or check_ins)"
    )] UnknownCollection(String),
    #[error("storage backend error: {0}")] Backend(String),
}

impl From<::redis::RedisError> for PersistenceError {
    fn from(err: ::redis::RedisError) -> Self {
        PersistenceError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Backend(err.to_string())
    }
}

pub fn into_object(value: Value) -> Result<Map<String, Value>, PersistenceError> {
    match value {
        Value::Object(map) => Ok(map),
        other =>
            Err(
                PersistenceError::InvalidRecord(
                    format!("expected a JSON object, got {}", json_kind(&other))
                )
            ),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
pub trait PersistenceClient: Send + Sync {
    async fn create(&self, collection: Collection, data: Value) -> Result<Record, PersistenceError>;

    /// Records matching `filter`, oldest first.
    async fn read(
        &self,
        collection: Collection,
        filter: &Filter
    ) -> Result<Vec<Record>, PersistenceError>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Record, PersistenceError>;

    /// Shallow merge: top-level fields in `patch` replace those in the record.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Value
    ) -> Result<Record, PersistenceError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), PersistenceError>;
}

pub fn create_persistence_client(
    args: &Args
) -> Result<Arc<dyn PersistenceClient>, PersistenceError> {
    info!("Records will be stored in: {} at {}", args.persistence_type, args.persistence_host);
    match args.persistence_type.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(MemoryPersistence::new())),
        "redis" =>
            Ok(
                Arc::new(
                    RedisPersistence::new(&args.persistence_host, &args.persistence_redis_prefix)?
                )
            ),
        other =>
            Err(PersistenceError::Backend(format!("unsupported persistence type: {}", other))),
    }
}

fn sort_by_creation(records: &mut [Record]) {
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}
