use crate::responder::{ FallbackRule, IntentResponder, IntentRule };
use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use log::{ info, warn };

#[derive(Debug)]
pub enum RuleError {
    InvalidRule(String),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::InvalidRule(msg) => write!(f, "Invalid intent rule: {}", msg),
            RuleError::IoError(e) => write!(f, "Rule file IO error: {}", e),
            RuleError::JsonError(e) => write!(f, "Rule JSON parsing error: {}", e),
        }
    }
}

impl Error for RuleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RuleError::IoError(e) => Some(e),
            RuleError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RuleError {
    fn from(err: std::io::Error) -> Self {
        RuleError::IoError(err)
    }
}

impl From<serde_json::Error> for RuleError {
    fn from(err: serde_json::Error) -> Self {
        RuleError::JsonError(err)
    }
}

#[derive(Deserialize, Debug, Clone)]
struct RuleFile {
    rules: Vec<IntentRule>,
    fallback: FallbackRule,
}

/// A validated responder together with the time it was read from disk.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub responder: Arc<IntentResponder>,
    pub last_loaded: Option<SystemTime>,
}

impl RuleSet {
    pub fn built_in() -> Self {
        Self {
            responder: Arc::new(IntentResponder::default()),
            last_loaded: None,
        }
    }
}

pub fn parse_rules(json: &str) -> Result<IntentResponder, RuleError> {
    let file: RuleFile = serde_json::from_str(json)?;
    IntentResponder::new(file.rules, file.fallback)
}

pub fn load_rules<P: AsRef<Path>>(path: P) -> Result<RuleSet, RuleError> {
    let loaded_at = SystemTime::now();
    let content = fs::read_to_string(&path)?;
    let responder = parse_rules(&content)?;
    info!(
        "Loaded {} intent rules from '{}'",
        responder.rules().len(),
        path.as_ref().display()
    );
    Ok(RuleSet {
        responder: Arc::new(responder),
        last_loaded: Some(loaded_at),
    })
}

/// Returns a fresh rule set when the file was modified after `current` was
/// loaded. A set without a load time (the built-in table) is always replaced.
pub fn reload_rules_if_changed<P: AsRef<Path>>(
    path: P,
    current: &RuleSet
) -> Result<Option<RuleSet>, RuleError> {
    let metadata = fs::metadata(&path)?;

    let modified = match metadata.modified() {
        Ok(m) => m,
        Err(e) => {
            warn!("Rule file modification time unavailable: {}", e);
            return Ok(None);
        }
    };

    match current.last_loaded {
        Some(last_loaded) if modified <= last_loaded => Ok(None),
        Some(_) => {
            info!("Rule file changed, reloading...");
            load_rules(path).map(Some)
        }
        None => {
            info!("No previous rule file load, loading '{}'", path.as_ref().display());
            load_rules(path).map(Some)
        }
    }
}
