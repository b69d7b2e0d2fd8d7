use access_assistant::responder::{
    default_rule_set,
    FallbackRule,
    IntentResponder,
    IntentRule,
    FALLBACK_INTENT,
};
use proptest::prelude::*;

fn responder() -> IntentResponder {
    IntentResponder::default()
}

#[test]
fn office_scenarios_reach_the_expected_intent() {
    let responder = responder();
    let cases = [
        ("Where is the nearest accessible restroom?", "navigation"),
        ("I need emergency help now", "emergency"),
        ("How do I use voice commands?", "voice_commands"),
        ("My back pain is getting worse at this desk", "ergonomics"),
        ("Good morning!", "greeting"),
        ("thanks a lot", "gratitude"),
        ("what can you do", "help"),
    ];
    for (input, intent) in cases {
        assert_eq!(responder.classify(input).intent, intent, "input: {:?}", input);
    }
}

#[test]
fn desk_words_only_reach_ergonomics_in_context() {
    let responder = responder();
    assert_eq!(responder.classify("How do I contact the helpdesk?").intent, "help");
    assert_eq!(responder.classify("Can I raise my desk height?").intent, "ergonomics");
    assert_eq!(responder.classify("I'd like a standing desk").intent, "ergonomics");
}

#[test]
fn empty_and_gibberish_fall_back() {
    let responder = responder();
    let (_, fallback) = default_rule_set();

    for input in ["", "   ", "asdkjasnd"] {
        let response = responder.classify(input);
        assert_eq!(response.intent, FALLBACK_INTENT);
        assert_eq!(response.text, fallback.response);
        assert_eq!(response.suggestions, fallback.suggestions);
    }
}

#[test]
fn emergency_beats_every_later_rule() {
    let responder = responder();
    // Mentions navigation, voice and help too.
    let response = responder.classify("urgent: where is the exit, help, voice");
    assert_eq!(response.intent, "emergency");
    assert!(!response.suggestions.is_empty());
}

#[test]
fn earlier_rule_wins_on_shared_keyword() {
    let rules = vec![
        IntentRule::new("first", &["lift"], "First.", &["A"]),
        IntentRule::new("second", &["lift", "stairs"], "Second.", &["B"])
    ];
    let fallback = FallbackRule {
        response: "Sorry?".to_string(),
        suggestions: vec![],
    };
    let responder = IntentResponder::new(rules, fallback).unwrap();

    assert_eq!(responder.classify("LIFT please").intent, "first");
    assert_eq!(responder.classify("the stairs").intent, "second");
    assert_eq!(responder.classify("nothing").intent, FALLBACK_INTENT);
}

#[test]
fn default_table_order_is_stable() {
    let (rules, _) = default_rule_set();
    let names: Vec<_> = rules
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(names.first(), Some(&"emergency"));
    assert_eq!(names.last(), Some(&"help"));
    assert_eq!(names.len(), 13);
}

proptest! {
    #[test]
    fn classify_is_total_and_deterministic(input in ".{0,200}") {
        let responder = responder();
        let first = responder.classify(&input);
        let second = responder.classify(&input);
        prop_assert!(!first.text.is_empty());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn classify_ignores_ascii_case(input in "[a-zA-Z ?!']{0,80}") {
        let responder = responder();
        prop_assert_eq!(
            responder.classify(&input.to_uppercase()),
            responder.classify(&input.to_lowercase())
        );
    }

    #[test]
    fn every_result_names_a_known_intent(input in "\\PC{0,120}") {
        let responder = responder();
        let intent = responder.classify(&input).intent;
        let known = intent == FALLBACK_INTENT ||
            responder.rules().iter().any(|r| r.name == intent);
        prop_assert!(known, "unknown intent {}", intent);
    }
}
