mod memory;
mod redis;

pub use memory::MemoryConversationStore;
pub use redis::RedisConversationStore;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use thiserror::Error;
use crate::cli::Args;
use crate::models::chat::{ Conversation, ConversationMessage };

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error(
        "message {id} is out of order in conversation '{conversation_id}' (last id is {last_id})"
    )]
    OutOfOrder {
        conversation_id: String,
        id: i64,
        last_id: i64,
    },
    #[error("history backend error: {0}")] Backend(String),
    #[error("unsupported history store type: {0}")] UnsupportedType(String),
}

impl From<::redis::RedisError> for HistoryError {
    fn from(err: ::redis::RedisError) -> Self {
        HistoryError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for HistoryError {
    fn from(err: serde_json::Error) -> Self {
        HistoryError::Backend(err.to_string())
    }
}

/// Append-only message history, one ordered list per conversation.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Appends a message. The id must be greater than the last id already
    /// stored for the conversation.
    async fn append(
        &self,
        conversation_id: &str,
        message: ConversationMessage
    ) -> Result<(), HistoryError>;

    /// Returns the last `limit` messages in chronological order; `0` returns
    /// the whole conversation. Unknown conversations are empty.
    async fn get_conversation(
        &self,
        conversation_id: &str,
        limit: usize
    ) -> Result<Conversation, HistoryError>;
}

pub fn create_conversation_store(
    args: &Args
) -> Result<Arc<dyn ConversationStore>, HistoryError> {
    match args.history_type.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(MemoryConversationStore::new())),
        "redis" => {
            let store = RedisConversationStore::new(
                &args.history_host,
                &args.history_redis_prefix
            )?;
            Ok(Arc::new(store))
        }
        other => Err(HistoryError::UnsupportedType(other.to_string())),
    }
}

pub fn initialize_conversation_store(
    args: &Args
) -> Result<Arc<dyn ConversationStore>, HistoryError> {
    info!("Chat history will be stored in: {} at {}", args.history_type, args.history_host);
    create_conversation_store(args)
}

fn check_order(
    conversation_id: &str,
    last_id: Option<i64>,
    message: &ConversationMessage
) -> Result<(), HistoryError> {
    match last_id {
        Some(last_id) if message.id <= last_id =>
            Err(HistoryError::OutOfOrder {
                conversation_id: conversation_id.to_string(),
                id: message.id,
                last_id,
            }),
        _ => Ok(()),
    }
}
