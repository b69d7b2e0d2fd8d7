//! Rule-based intent matching for the in-app assistant.
//!
//! A [`IntentResponder`] owns an ordered table of [`IntentRule`]s and a
//! fallback. Classification lowercases the input and returns the response of
//! the first rule with any keyword contained in it. Nothing here performs I/O
//! and nothing here can fail once the table has been validated.

mod defaults;

use crate::config::rules::RuleError;
use serde::{ Deserialize, Serialize };
use std::collections::HashSet;

pub use defaults::default_rule_set;

pub const FALLBACK_INTENT: &str = "fallback";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRule {
    pub name: String,
    pub keywords: Vec<String>,
    pub response: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl IntentRule {
    pub fn new(name: &str, keywords: &[&str], response: &str, suggestions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords
                .iter()
                .map(|k| k.to_string())
                .collect(),
            response: response.to_string(),
            suggestions: suggestions
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    fn matches(&self, normalized: &str) -> bool {
        self.keywords.iter().any(|keyword| normalized.contains(keyword.as_str()))
    }

    fn to_response(&self) -> Response {
        Response {
            text: self.response.clone(),
            suggestions: self.suggestions.clone(),
            intent: self.name.clone(),
        }
    }
}

/// The catch-all rule. It has no keywords because it always applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackRule {
    pub response: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    pub suggestions: Vec<String>,
    pub intent: String,
}

#[derive(Debug, Clone)]
pub struct IntentResponder {
    rules: Vec<IntentRule>,
    fallback: Response,
}

impl IntentResponder {
    /// Validates and normalizes a rule table.
    ///
    /// Keywords are lowercased here so that classification only has to
    /// normalize the input. An empty keyword would match every input and
    /// shadow every later rule, so it is rejected along with empty responses
    /// and duplicate names.
    pub fn new(rules: Vec<IntentRule>, fallback: FallbackRule) -> Result<Self, RuleError> {
        let mut seen = HashSet::new();
        let mut normalized_rules = Vec::with_capacity(rules.len());

        for mut rule in rules {
            let name = rule.name.trim().to_string();
            if name.is_empty() {
                return Err(RuleError::InvalidRule("rule with an empty name".to_string()));
            }
            if name == FALLBACK_INTENT {
                return Err(
                    RuleError::InvalidRule(format!("'{}' is reserved for the fallback rule", name))
                );
            }
            if !seen.insert(name.clone()) {
                return Err(RuleError::InvalidRule(format!("duplicate rule name '{}'", name)));
            }
            if rule.keywords.is_empty() {
                return Err(RuleError::InvalidRule(format!("rule '{}' has no keywords", name)));
            }
            if rule.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(RuleError::InvalidRule(format!("rule '{}' has an empty keyword", name)));
            }
            if rule.response.trim().is_empty() {
                return Err(
                    RuleError::InvalidRule(format!("rule '{}' has an empty response", name))
                );
            }

            rule.name = name;
            rule.keywords = rule.keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect();
            normalized_rules.push(rule);
        }

        if fallback.response.trim().is_empty() {
            return Err(RuleError::InvalidRule("fallback rule has an empty response".to_string()));
        }

        Ok(Self {
            rules: normalized_rules,
            fallback: Response {
                text: fallback.response,
                suggestions: fallback.suggestions,
                intent: FALLBACK_INTENT.to_string(),
            },
        })
    }

    pub fn classify(&self, input: &str) -> Response {
        let normalized = input.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&normalized))
            .map(IntentRule::to_response)
            .unwrap_or_else(|| self.fallback.clone())
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn fallback(&self) -> &Response {
        &self.fallback
    }
}

impl Default for IntentResponder {
    fn default() -> Self {
        let (rules, fallback) = default_rule_set();
        Self::new(rules, fallback).expect("built-in rule table is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback() -> FallbackRule {
        FallbackRule {
            response: "Sorry?".to_string(),
            suggestions: vec![],
        }
    }

    #[test]
    fn earlier_rule_wins_over_earlier_keyword() {
        let responder = IntentResponder::new(
            vec![
                IntentRule::new("first", &["zebra"], "first", &[]),
                IntentRule::new("second", &["apple"], "second", &[])
            ],
            fallback()
        ).unwrap();

        let response = responder.classify("apple before zebra");
        assert_eq!(response.intent, "first");
    }

    #[test]
    fn keywords_are_lowercased_on_construction() {
        let responder = IntentResponder::new(
            vec![IntentRule::new("wifi", &["Wi-Fi"], "Connect to Staff-Net.", &["Password"])],
            fallback()
        ).unwrap();

        assert_eq!(responder.rules()[0].keywords, vec!["wi-fi".to_string()]);
        assert_eq!(responder.classify("WI-FI is down").intent, "wifi");
    }

    #[test]
    fn rejects_empty_keyword() {
        let err = IntentResponder::new(
            vec![IntentRule::new("broken", &["ok", ""], "text", &[])],
            fallback()
        ).unwrap_err();
        assert!(err.to_string().contains("empty keyword"));
    }

    #[test]
    fn rejects_whitespace_keyword() {
        let err = IntentResponder::new(
            vec![
                IntentRule::new("spaces", &[" "], "text", &[]),
                IntentRule::new("later", &["later"], "text", &[])
            ],
            fallback()
        ).unwrap_err();
        assert!(err.to_string().contains("empty keyword"));
    }

    #[test]
    fn rejects_duplicate_and_reserved_names() {
        let dup = IntentResponder::new(
            vec![
                IntentRule::new("a", &["x"], "text", &[]),
                IntentRule::new("a", &["y"], "text", &[])
            ],
            fallback()
        );
        assert!(dup.is_err());

        let reserved = IntentResponder::new(
            vec![IntentRule::new(FALLBACK_INTENT, &["x"], "text", &[])],
            fallback()
        );
        assert!(reserved.is_err());
    }

    #[test]
    fn rejects_blank_fallback() {
        let result = IntentResponder::new(vec![], FallbackRule {
            response: "   ".to_string(),
            suggestions: vec![],
        });
        assert!(result.is_err());
    }

    #[test]
    fn empty_table_always_falls_back() {
        let responder = IntentResponder::new(vec![], fallback()).unwrap();
        let response = responder.classify("anything at all");
        assert_eq!(response.intent, FALLBACK_INTENT);
        assert_eq!(response.text, "Sorry?");
        assert!(response.suggestions.is_empty());
    }

    #[test]
    fn default_table_builds() {
        let responder = IntentResponder::default();
        assert!(!responder.rules().is_empty());
        assert!(!responder.fallback().suggestions.is_empty());
    }
}
