//! Classifier behavior with a remote backend and the keyword fallback

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::StubReasoning;
use lumen::intent::{Intent, IntentClassifier, IntentKind};
use lumen::state::SessionState;

#[tokio::test]
async fn remote_classification_result_is_used() {
    let remote = StubReasoning::classifying(Intent::with_param(
        IntentKind::Navigate,
        "destination",
        "the station",
    ));
    let classifier = IntentClassifier::remote(Arc::new(remote), Duration::from_secs(1));

    let intent = classifier
        .classify("take me to the station", &SessionState::default())
        .await;

    assert_eq!(intent.kind, IntentKind::Navigate);
    assert_eq!(intent.param_str("destination"), Some("the station"));
}

#[tokio::test]
async fn remote_failure_falls_back_to_keywords() {
    let classifier =
        IntentClassifier::remote(Arc::new(StubReasoning::failing()), Duration::from_secs(1));

    let intent = classifier
        .classify("what do you see around me", &SessionState::default())
        .await;

    assert_eq!(intent.kind, IntentKind::DescribeScene);
}

#[tokio::test]
async fn remote_timeout_falls_back_to_keywords() {
    // The remote answer would be Emergency, but it arrives after the budget
    let slow = StubReasoning {
        intent: Some(Intent::new(IntentKind::Emergency)),
        delay: Some(Duration::from_millis(200)),
        ..StubReasoning::default()
    };
    let classifier = IntentClassifier::remote(Arc::new(slow), Duration::from_millis(20));

    let intent = classifier
        .classify("read this sign", &SessionState::default())
        .await;

    assert_eq!(intent.kind, IntentKind::ReadText);
}

#[tokio::test]
async fn fallback_keeps_unmatched_utterances_answerable() {
    let classifier =
        IntentClassifier::remote(Arc::new(StubReasoning::failing()), Duration::from_secs(1));

    let intent = classifier
        .classify("what time is it in Tokyo", &SessionState::default())
        .await;

    assert_eq!(intent.kind, IntentKind::GeneralQuestion);
    assert_eq!(intent.param_str("query"), Some("what time is it in Tokyo"));
}

#[tokio::test]
async fn keyword_strategy_never_consults_the_backend() {
    let classifier = IntentClassifier::keyword();

    let intent = classifier
        .classify("navigate to the library", &SessionState::default())
        .await;

    assert_eq!(intent.kind, IntentKind::Navigate);
    assert_eq!(intent.param_str("destination"), Some("the library"));
}
