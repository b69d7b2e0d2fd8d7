use async_trait::async_trait;
use crate::history::{ check_order, ConversationStore, HistoryError };
use crate::models::chat::{ Conversation, ConversationMessage };
use log::error;
use redis::{ Client, AsyncCommands };

/// One Redis list per conversation, oldest message at the head.
pub struct RedisConversationStore {
    client: Client,
    key_prefix: String,
}

impl RedisConversationStore {
    pub fn new(host: &str, key_prefix: &str) -> Result<Self, HistoryError> {
        Ok(Self {
            client: Client::open(host)?,
            key_prefix: key_prefix.to_string(),
        })
    }

    fn key(&self, conversation_id: &str) -> String {
        format!("{}{}", self.key_prefix, conversation_id)
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }
}

/// `LRANGE` start index for the last `limit` entries. `0`, or a limit too
/// large to index, means the whole list.
fn tail_start(limit: usize) -> isize {
    isize::try_from(limit).map(|l| -l).unwrap_or(0)
}

#[async_trait]
impl ConversationStore for RedisConversationStore {
    async fn append(
        &self,
        conversation_id: &str,
        message: ConversationMessage
    ) -> Result<(), HistoryError> {
        let mut conn = self.get_connection().await?;
        let key = self.key(conversation_id);

        // The order check and the push are separate round trips; ids come
        // from a single generator per process so this only guards misuse.
        let last: Option<String> = conn.lindex(&key, -1).await?;
        let last_id = match last {
            Some(json) => Some(serde_json::from_str::<ConversationMessage>(&json)?.id),
            None => None,
        };
        check_order(conversation_id, last_id, &message)?;

        let json_msg = serde_json::to_string(&message)?;
        let _: i64 = conn.rpush(&key, &json_msg).await?;
        Ok(())
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
        limit: usize
    ) -> Result<Conversation, HistoryError> {
        let mut conn = self.get_connection().await?;
        let key = self.key(conversation_id);
        let json_entries: Vec<String> = conn.lrange(&key, tail_start(limit), -1).await?;

        let mut messages = Vec::with_capacity(json_entries.len());
        for json_entry in &json_entries {
            match serde_json::from_str::<ConversationMessage>(json_entry) {
                Ok(msg) => messages.push(msg),
                Err(e) => {
                    error!("Error parsing history entry: {}", e);
                }
            }
        }

        Ok(Conversation {
            id: conversation_id.to_string(),
            messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_start_covers_whole_list_for_zero_and_huge_limits() {
        assert_eq!(tail_start(0), 0);
        assert_eq!(tail_start(3), -3);
        assert_eq!(tail_start(isize::MAX as usize), -isize::MAX);
        assert_eq!(tail_start(usize::MAX), 0);
        assert_eq!(tail_start((isize::MAX as usize) + 1), 0);
    }
}
