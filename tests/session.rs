//! Full session loop scenarios

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{RecordingStore, ScriptedSpeech, StubNavigation, StubPerception, StubReasoning};
use lumen::handlers::{FAREWELL_REPLY, SENSOR_UNAVAILABLE_REPLY};
use lumen::intent::IntentClassifier;
use lumen::navigation::Navigation;
use lumen::perception::Perception;
use lumen::reasoning::Reasoning;
use lumen::session::{Session, GREETING};
use lumen::speech::Speech;
use lumen::state::Preferences;
use lumen::store::Store;

fn session(
    speech: &Arc<ScriptedSpeech>,
    perception: &Arc<StubPerception>,
    store: &Arc<RecordingStore>,
) -> Session {
    Session::new(
        Arc::clone(speech) as Arc<dyn Speech>,
        Arc::clone(perception) as Arc<dyn Perception>,
        Arc::new(StubReasoning::default()) as Arc<dyn Reasoning>,
        Arc::new(StubNavigation::located()) as Arc<dyn Navigation>,
        Arc::clone(store) as Arc<dyn Store>,
        IntentClassifier::keyword(),
        "test-user".to_string(),
    )
    .unwrap()
}

#[tokio::test]
async fn scene_command_is_heard_answered_and_recorded() {
    let speech = Arc::new(ScriptedSpeech::new(&["what do you see", "goodbye"]));
    let perception = Arc::new(StubPerception::with_objects(&["chair", "table"]));
    let store = Arc::new(RecordingStore::default());

    let mut session = session(&speech, &perception, &store);
    session.run().await.unwrap();

    let transcript = speech.transcript();
    assert_eq!(transcript.first().unwrap(), GREETING);
    assert_eq!(transcript.last().unwrap(), FAREWELL_REPLY);

    let announce = transcript
        .iter()
        .position(|t| t == "Let me take a look around.")
        .unwrap();
    let answer = transcript
        .iter()
        .position(|t| t.contains("chair, table"))
        .unwrap();
    assert!(announce < answer);

    let exchanges = store.exchanges.lock().unwrap();
    assert_eq!(exchanges[0].0, "what do you see");
    assert!(exchanges[0].1.contains("chair, table"));
}

#[tokio::test]
async fn unroutable_navigation_is_answered_in_a_live_session() {
    let speech = Arc::new(ScriptedSpeech::new(&["navigate to the library", "goodbye"]));
    let perception = Arc::new(StubPerception::default());
    let store = Arc::new(RecordingStore::default());

    let mut session = session(&speech, &perception, &store);
    session.run().await.unwrap();

    assert!(speech
        .transcript()
        .iter()
        .any(|t| t == "I could not find directions to the library."));
}

#[tokio::test]
async fn goodbye_ends_the_loop_after_one_iteration() {
    let speech = Arc::new(ScriptedSpeech::new(&["goodbye"]));
    let perception = Arc::new(StubPerception::default());
    let store = Arc::new(RecordingStore::default());

    let mut session = session(&speech, &perception, &store);
    session.run().await.unwrap();

    assert_eq!(speech.listen_calls.load(Ordering::SeqCst), 1);
    assert!(!session.state().running);
}

#[tokio::test]
async fn resources_are_released_exactly_once() {
    // The exit handler releases, then the loop's shutdown path releases again
    let speech = Arc::new(ScriptedSpeech::new(&["goodbye"]));
    let perception = Arc::new(StubPerception::default());
    let store = Arc::new(RecordingStore::default());

    let mut session = session(&speech, &perception, &store);
    session.run().await.unwrap();

    assert_eq!(perception.release_count.load(Ordering::SeqCst), 1);
    assert_eq!(store.close_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_capture_leaves_last_scene_untouched() {
    let speech = Arc::new(ScriptedSpeech::new(&[]));
    let perception = Arc::new(StubPerception::with_failing_capture());
    let store = Arc::new(RecordingStore::default());

    let mut session = session(&speech, &perception, &store);
    session.run_once("describe the scene").await.unwrap();

    assert!(session.state().last_scene.is_none());
    assert!(speech
        .transcript()
        .iter()
        .any(|t| t == SENSOR_UNAVAILABLE_REPLY));
}

#[tokio::test]
async fn broken_speaker_does_not_kill_the_session() {
    let speech = Arc::new(ScriptedSpeech::with_broken_speaker(&[
        "what do you see",
        "goodbye",
    ]));
    let perception = Arc::new(StubPerception::default());
    let store = Arc::new(RecordingStore::default());

    let mut session = session(&speech, &perception, &store);
    session.run().await.unwrap();

    assert!(!session.state().running);
    assert_eq!(perception.release_count.load(Ordering::SeqCst), 1);
    // The exchange was still recorded even though nothing could be spoken
    assert_eq!(store.exchanges.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn continuous_mode_describes_idle_scenes_once() {
    let speech = Arc::new(ScriptedSpeech::with_pauses(&[
        None,
        None,
        Some("goodbye"),
    ]));
    let perception = Arc::new(StubPerception::default());
    let store = Arc::new(RecordingStore::with_preferences(Preferences {
        continuous_mode: true,
        ..Preferences::default()
    }));

    let mut session = session(&speech, &perception, &store);
    session.run().await.unwrap();

    // Spoken on the first idle window, deduplicated on the second
    let ambient = speech
        .transcript()
        .iter()
        .filter(|t| *t == "A quiet room.")
        .count();
    assert_eq!(ambient, 1);
    assert_eq!(session.state().last_scene.as_deref(), Some("A quiet room."));
}

#[tokio::test]
async fn continuous_mode_describes_after_a_command_with_feedback_first() {
    let speech = Arc::new(ScriptedSpeech::new(&["what things are nearby", "goodbye"]));
    let perception = Arc::new(StubPerception::with_objects(&["chair"]));
    let store = Arc::new(RecordingStore::with_preferences(Preferences {
        continuous_mode: true,
        ..Preferences::default()
    }));

    let mut session = session(&speech, &perception, &store);
    session.run().await.unwrap();

    let transcript = speech.transcript();
    let answer = transcript
        .iter()
        .position(|t| t == "I can see chair.")
        .unwrap();
    let ambient = transcript.iter().position(|t| t == "A quiet room.").unwrap();
    assert!(answer < ambient);

    // No ambient description after the goodbye iteration
    assert_eq!(
        transcript.iter().filter(|t| *t == "A quiet room.").count(),
        1
    );
}

#[tokio::test]
async fn one_shot_command_runs_and_shuts_down() {
    let speech = Arc::new(ScriptedSpeech::new(&[]));
    let perception = Arc::new(StubPerception::with_texts(&["EXIT"]));
    let store = Arc::new(RecordingStore::default());

    let mut session = session(&speech, &perception, &store);
    session.run_once("read the sign").await.unwrap();

    assert!(speech.transcript().iter().any(|t| t.contains("1: EXIT.")));
    assert_eq!(speech.listen_calls.load(Ordering::SeqCst), 0);
    assert_eq!(perception.release_count.load(Ordering::SeqCst), 1);
    assert!(!session.state().running);
}
