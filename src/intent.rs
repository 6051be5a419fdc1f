//! Intent classification
//!
//! Turns a raw utterance into a typed [`Intent`]. Two interchangeable
//! strategies, fixed at construction: a remote language-model classifier with
//! a bounded time budget, and a local keyword table. Remote failures of any
//! kind fall back to the keyword table for that single utterance.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::reasoning::Reasoning;
use crate::state::SessionState;

/// Default time budget for a single remote classification call
pub const CLASSIFY_BUDGET: Duration = Duration::from_secs(10);

/// The fixed intent vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    DescribeScene,
    ReadText,
    RecognizeObjects,
    Navigate,
    RecognizePeople,
    Emergency,
    Exit,
    GeneralQuestion,
    Unknown,
}

impl IntentKind {
    /// Canonical wire name for this intent kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DescribeScene => "describe_scene",
            Self::ReadText => "read_text",
            Self::RecognizeObjects => "recognize_objects",
            Self::Navigate => "navigate",
            Self::RecognizePeople => "recognize_people",
            Self::Emergency => "emergency",
            Self::Exit => "exit",
            Self::GeneralQuestion => "general_question",
            Self::Unknown => "unknown",
        }
    }
}

/// A classified command: intent kind plus a parameter bag
///
/// Created once per utterance, immutable, discarded after its handler runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub kind: IntentKind,
    #[serde(default)]
    pub parameters: HashMap<String, Value>,
}

impl Intent {
    /// Create an intent with no parameters
    #[must_use]
    pub fn new(kind: IntentKind) -> Self {
        Self {
            kind,
            parameters: HashMap::new(),
        }
    }

    /// Create an intent carrying a single string parameter
    #[must_use]
    pub fn with_param(kind: IntentKind, key: &str, value: &str) -> Self {
        let mut parameters = HashMap::new();
        parameters.insert(key.to_string(), Value::String(value.to_string()));
        Self { kind, parameters }
    }

    /// Look up a string parameter
    #[must_use]
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }

    /// Look up a boolean parameter; remote classifiers sometimes send
    /// booleans as strings, so `"true"`/`"false"` count too
    #[must_use]
    pub fn param_bool(&self, key: &str) -> Option<bool> {
        match self.parameters.get(key)? {
            Value::Bool(flag) => Some(*flag),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// Ordered trigger-phrase table for the keyword strategy
///
/// First intent whose phrase list matches wins; table order is the tie-break.
const KEYWORD_TABLE: &[(IntentKind, &[&str])] = &[
    (
        IntentKind::DescribeScene,
        &["describe", "what do you see", "what around", "surroundings"],
    ),
    (
        IntentKind::ReadText,
        &["read", "what does it say", "text"],
    ),
    (
        IntentKind::RecognizeObjects,
        &["objects", "what things", "identify"],
    ),
    (
        IntentKind::Navigate,
        &["go to", "navigate", "directions to", "how to get to"],
    ),
    (
        IntentKind::RecognizePeople,
        &["who is this", "identify person", "do you know this person", "faces"],
    ),
    (
        IntentKind::Emergency,
        &["help", "emergency", "danger", "call for help"],
    ),
    (
        IntentKind::Exit,
        &["goodbye", "bye", "exit", "quit", "stop", "turn off", "shut down", "close"],
    ),
];

/// Navigation trigger phrases whose trailing words name the destination,
/// longest first so "navigate to" wins over "navigate"
const DESTINATION_TRIGGERS: &[&str] =
    &["how to get to", "directions to", "navigate to", "go to", "navigate"];

/// Classify an utterance with the static keyword table
///
/// Case-insensitive substring match; no match maps to `general_question`.
#[must_use]
pub fn keyword_classify(utterance: &str) -> Intent {
    let lower = utterance.to_lowercase();

    for (kind, phrases) in KEYWORD_TABLE {
        if phrases.iter().any(|p| lower.contains(p)) {
            let mut intent = Intent::new(*kind);
            intent
                .parameters
                .insert("query".to_string(), Value::String(utterance.to_string()));

            if *kind == IntentKind::Navigate {
                if let Some(destination) = extract_destination(&lower) {
                    intent
                        .parameters
                        .insert("destination".to_string(), Value::String(destination));
                }
            }

            return intent;
        }
    }

    Intent::with_param(IntentKind::GeneralQuestion, "query", utterance)
}

/// Pull the destination out of a navigation phrase, e.g.
/// "navigate to the library" -> "the library"
fn extract_destination(lower: &str) -> Option<String> {
    for trigger in DESTINATION_TRIGGERS {
        if let Some(pos) = lower.find(trigger) {
            let rest = lower[pos + trigger.len()..].trim();
            if !rest.is_empty() {
                return Some(rest.to_string());
            }
        }
    }
    None
}

/// Classification strategy selected at construction time
enum Strategy {
    /// Remote language-model classification with keyword fallback
    Remote {
        reasoning: Arc<dyn Reasoning>,
        budget: Duration,
    },
    /// Local keyword table only
    Keyword,
}

/// Normalizes a raw utterance into a typed [`Intent`]
pub struct IntentClassifier {
    strategy: Strategy,
}

impl IntentClassifier {
    /// Classifier using only the local keyword table
    #[must_use]
    pub const fn keyword() -> Self {
        Self {
            strategy: Strategy::Keyword,
        }
    }

    /// Classifier that asks the reasoning collaborator first, bounded by
    /// `budget`, falling back to the keyword table on any failure
    #[must_use]
    pub fn remote(reasoning: Arc<dyn Reasoning>, budget: Duration) -> Self {
        Self {
            strategy: Strategy::Remote { reasoning, budget },
        }
    }

    /// Classify an utterance
    ///
    /// Always yields a valid intent; remote failures never propagate.
    pub async fn classify(&self, utterance: &str, state: &SessionState) -> Intent {
        match &self.strategy {
            Strategy::Keyword => keyword_classify(utterance),
            Strategy::Remote { reasoning, budget } => {
                match tokio::time::timeout(*budget, reasoning.classify_intent(utterance, state))
                    .await
                {
                    Ok(Ok(intent)) => {
                        tracing::debug!(kind = intent.kind.as_str(), "remote classification");
                        intent
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "remote classification failed, using keywords");
                        keyword_classify(utterance)
                    }
                    Err(_) => {
                        tracing::warn!(
                            budget_ms = budget.as_millis(),
                            "remote classification timed out, using keywords"
                        );
                        keyword_classify(utterance)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_maps_to_intent() {
        assert_eq!(
            keyword_classify("what do you see around me").kind,
            IntentKind::DescribeScene
        );
        assert_eq!(
            keyword_classify("please read that sign").kind,
            IntentKind::ReadText
        );
        assert_eq!(
            keyword_classify("what things are nearby").kind,
            IntentKind::RecognizeObjects
        );
        assert_eq!(
            keyword_classify("who is this in front of me").kind,
            IntentKind::RecognizePeople
        );
        assert_eq!(keyword_classify("I need help").kind, IntentKind::Emergency);
        assert_eq!(keyword_classify("goodbye").kind, IntentKind::Exit);
    }

    #[test]
    fn test_keyword_case_insensitive() {
        assert_eq!(
            keyword_classify("WHAT DO YOU SEE").kind,
            IntentKind::DescribeScene
        );
        assert_eq!(keyword_classify("GoOdByE").kind, IntentKind::Exit);
    }

    #[test]
    fn test_no_match_is_general_question() {
        let intent = keyword_classify("will it rain tomorrow");
        assert_eq!(intent.kind, IntentKind::GeneralQuestion);
        assert_eq!(intent.param_str("query"), Some("will it rain tomorrow"));
    }

    #[test]
    fn test_param_bool_accepts_string_forms() {
        let mut intent = Intent::new(IntentKind::DescribeScene);
        intent
            .parameters
            .insert("detailed".to_string(), Value::Bool(true));
        assert_eq!(intent.param_bool("detailed"), Some(true));

        let as_string = Intent::with_param(IntentKind::DescribeScene, "detailed", "true");
        assert_eq!(as_string.param_bool("detailed"), Some(true));

        assert_eq!(Intent::new(IntentKind::DescribeScene).param_bool("detailed"), None);
    }

    #[test]
    fn test_table_order_is_tie_break() {
        // "identify person" matches both recognize_objects ("identify") and
        // recognize_people; the earlier table entry wins
        assert_eq!(
            keyword_classify("identify person").kind,
            IntentKind::RecognizeObjects
        );
    }

    #[test]
    fn test_navigate_extracts_destination() {
        let intent = keyword_classify("navigate to the library");
        assert_eq!(intent.kind, IntentKind::Navigate);
        assert_eq!(intent.param_str("destination"), Some("the library"));

        let intent = keyword_classify("how to get to Main Street station");
        assert_eq!(intent.param_str("destination"), Some("main street station"));
    }

    #[test]
    fn test_navigate_without_destination() {
        let intent = keyword_classify("navigate");
        assert_eq!(intent.kind, IntentKind::Navigate);
        assert!(intent.param_str("destination").is_none());
    }

    #[test]
    fn test_intent_kind_wire_names() {
        let kind: IntentKind = serde_json::from_str("\"recognize_people\"").unwrap();
        assert_eq!(kind, IntentKind::RecognizePeople);
        assert_eq!(
            serde_json::to_string(&IntentKind::GeneralQuestion).unwrap(),
            "\"general_question\""
        );
    }
}
