use crate::config::rules::{ self, RuleError, RuleSet };
use crate::history::{ ConversationStore, HistoryError };
use crate::models::chat::{
    Clock,
    Conversation,
    ConversationMessage,
    MessageIdGenerator,
    SystemClock,
};
use crate::responder::Response;

use log::{ info, debug };
use rand::rngs::StdRng;
use rand::{ Rng, SeedableRng };
use std::collections::HashMap;
use std::sync::{ Arc, Mutex };
use std::time::Duration;
use tokio::sync::{ Mutex as AsyncMutex, RwLock };

/// Bounds for the artificial "assistant is typing" pause, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingDelay {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl TypingDelay {
    pub const NONE: TypingDelay = TypingDelay { min_ms: 0, max_ms: 0 };

    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rng.gen_range(self.min_ms..=self.max_ms))
    }
}

impl Default for TypingDelay {
    fn default() -> Self {
        Self::new(1000, 2000)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub message: ConversationMessage,
    pub intent: String,
}

/// Sits between a chat transport and the responder: records both sides of
/// the exchange and decides how long to pretend to type.
pub struct Assistant {
    rules: RwLock<RuleSet>,
    rules_path: Option<String>,
    history_store: Arc<dyn ConversationStore>,
    ids: MessageIdGenerator,
    clock: Arc<dyn Clock>,
    typing_delay: TypingDelay,
    rng: Mutex<StdRng>,
    /// One lock per conversation so a user turn and its reply get adjacent,
    /// increasing ids even when replies race.
    turns: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl Assistant {
    pub fn new(history_store: Arc<dyn ConversationStore>) -> Self {
        Self {
            rules: RwLock::new(RuleSet::built_in()),
            rules_path: None,
            history_store,
            ids: MessageIdGenerator::new(),
            clock: Arc::new(SystemClock),
            typing_delay: TypingDelay::default(),
            rng: Mutex::new(StdRng::from_entropy()),
            turns: Mutex::new(HashMap::new()),
        }
    }

    /// Loads the rule file at `path` in place of the built-in table. Later
    /// calls to [`Assistant::reload_rules_if_changed`] watch the same file.
    pub fn with_rules_file(mut self, path: &str) -> Result<Self, RuleError> {
        let rule_set = rules::load_rules(path)?;
        self.rules = RwLock::new(rule_set);
        self.rules_path = Some(path.to_string());
        Ok(self)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_typing_delay(mut self, typing_delay: TypingDelay) -> Self {
        self.typing_delay = typing_delay;
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub async fn classify(&self, text: &str) -> Response {
        let responder = Arc::clone(&self.rules.read().await.responder);
        responder.classify(text)
    }

    /// Records the user's message, classifies it and records the reply.
    pub async fn reply(&self, conversation_id: &str, text: &str) -> Result<Reply, HistoryError> {
        let turn = self.turn_lock(conversation_id);
        let _turn = turn.lock().await;

        let now = self.clock.now();
        let user_message = ConversationMessage::user(self.ids.next_id(now), text, now);
        self.history_store.append(conversation_id, user_message).await?;

        let response = self.classify(text).await;
        debug!("Conversation {} routed to intent '{}'", conversation_id, response.intent);

        let now = self.clock.now();
        let bot_message = ConversationMessage::bot(
            self.ids.next_id(now),
            &response.text,
            response.suggestions,
            now
        );
        self.history_store.append(conversation_id, bot_message.clone()).await?;

        Ok(Reply {
            message: bot_message,
            intent: response.intent,
        })
    }

    fn turn_lock(&self, conversation_id: &str) -> Arc<AsyncMutex<()>> {
        let mut turns = match self.turns.lock() {
            Ok(turns) => turns,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(turns.entry(conversation_id.to_string()).or_default())
    }

    pub async fn history(
        &self,
        conversation_id: &str,
        limit: usize
    ) -> Result<Conversation, HistoryError> {
        self.history_store.get_conversation(conversation_id, limit).await
    }

    pub fn typing_delay(&self) -> Duration {
        match self.rng.lock() {
            Ok(mut rng) => self.typing_delay.sample(&mut *rng),
            Err(poisoned) => self.typing_delay.sample(&mut *poisoned.into_inner()),
        }
    }

    /// Returns `Ok(true)` when a newer rule file replaced the active table.
    /// A file that fails validation leaves the current table in place.
    pub async fn reload_rules_if_changed(&self) -> Result<bool, RuleError> {
        let Some(path) = &self.rules_path else {
            return Ok(false);
        };

        let mut current = self.rules.write().await;
        match rules::reload_rules_if_changed(path, &current)? {
            Some(new_rules) => {
                *current = new_rules;
                info!("Intent rules successfully reloaded from '{}'", path);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn rule_count(&self) -> usize {
        self.rules.read().await.responder.rules().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_delay_stays_in_bounds() {
        let delay = TypingDelay::new(1000, 2000);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let d = delay.sample(&mut rng);
            assert!(d >= Duration::from_millis(1000) && d <= Duration::from_millis(2000));
        }
    }

    #[test]
    fn typing_delay_bounds_are_ordered() {
        assert_eq!(TypingDelay::new(500, 100), TypingDelay { min_ms: 100, max_ms: 500 });
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(TypingDelay::NONE.sample(&mut rng), Duration::ZERO);
    }

    #[test]
    fn seeded_rng_gives_repeatable_delays() {
        let delay = TypingDelay::default();
        let a: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..5).map(|_| delay.sample(&mut rng)).collect()
        };
        let b: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..5).map(|_| delay.sample(&mut rng)).collect()
        };
        assert_eq!(a, b);
    }
}
