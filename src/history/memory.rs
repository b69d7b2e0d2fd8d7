use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use crate::history::{ check_order, ConversationStore, HistoryError };
use crate::models::chat::{ Conversation, ConversationMessage };

#[derive(Default)]
pub struct MemoryConversationStore {
    conversations: RwLock<HashMap<String, Vec<ConversationMessage>>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn append(
        &self,
        conversation_id: &str,
        message: ConversationMessage
    ) -> Result<(), HistoryError> {
        let mut conversations = self.conversations.write().await;
        let messages = conversations.entry(conversation_id.to_string()).or_default();
        check_order(
            conversation_id,
            messages.last().map(|m| m.id),
            &message
        )?;
        messages.push(message);
        Ok(())
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
        limit: usize
    ) -> Result<Conversation, HistoryError> {
        let conversations = self.conversations.read().await;
        let messages = conversations
            .get(conversation_id)
            .map(|all| {
                let start = if limit == 0 { 0 } else { all.len().saturating_sub(limit) };
                all[start..].to_vec()
            })
            .unwrap_or_default();

        Ok(Conversation {
            id: conversation_id.to_string(),
            messages,
        })
    }
}
