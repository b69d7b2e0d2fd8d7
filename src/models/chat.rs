use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };
use std::sync::atomic::{ AtomicI64, Ordering };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: i64,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

impl ConversationMessage {
    pub fn user(id: i64, text: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            text: text.to_string(),
            sender: Sender::User,
            timestamp,
            suggestions: None,
        }
    }

    pub fn bot(id: i64, text: &str, suggestions: Vec<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            text: text.to_string(),
            sender: Sender::Bot,
            timestamp,
            suggestions: Some(suggestions),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub messages: Vec<ConversationMessage>,
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hands out time-based message ids that never repeat.
///
/// The id is the capture time in milliseconds, bumped past the previous id
/// when two messages share a millisecond or the clock goes backwards.
#[derive(Debug, Default)]
pub struct MessageIdGenerator {
    last: AtomicI64,
}

impl MessageIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self, now: DateTime<Utc>) -> i64 {
        let candidate = now.timestamp_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = candidate.max(last + 1);
            match self.last.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
                Ok(_) => {
                    return next;
                }
                Err(actual) => {
                    last = actual;
                }
            }
        }
    }
}
