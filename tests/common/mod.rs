//! Shared test doubles for the session loop and dispatcher

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use lumen::intent::Intent;
use lumen::navigation::{Location, Navigation, Route};
use lumen::perception::{BoundingBox, DetectedObject, Face, Frame, Perception, TextRegion};
use lumen::reasoning::Reasoning;
use lumen::speech::Speech;
use lumen::state::{Preferences, SessionState};
use lumen::store::Store;
use lumen::{Error, Result};

/// Speech double: scripted utterances in, recorded transcript out
///
/// `None` entries script a silent listen window; an exhausted script also
/// listens as silence.
pub struct ScriptedSpeech {
    utterances: Mutex<VecDeque<Option<String>>>,
    spoken: Mutex<Vec<String>>,
    pub listen_calls: AtomicUsize,
    fail_say: bool,
}

impl ScriptedSpeech {
    pub fn new(script: &[&str]) -> Self {
        Self {
            utterances: Mutex::new(script.iter().map(|s| Some((*s).to_string())).collect()),
            spoken: Mutex::new(Vec::new()),
            listen_calls: AtomicUsize::new(0),
            fail_say: false,
        }
    }

    pub fn with_pauses(script: &[Option<&str>]) -> Self {
        Self {
            utterances: Mutex::new(script.iter().map(|s| s.map(ToString::to_string)).collect()),
            spoken: Mutex::new(Vec::new()),
            listen_calls: AtomicUsize::new(0),
            fail_say: false,
        }
    }

    /// Every `say` call fails; listening still works
    pub fn with_broken_speaker(script: &[&str]) -> Self {
        Self {
            fail_say: true,
            ..Self::new(script)
        }
    }

    /// Everything spoken so far, in order
    pub fn transcript(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl Speech for ScriptedSpeech {
    async fn listen(&self, _timeout: Duration) -> Result<Option<String>> {
        self.listen_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.utterances.lock().unwrap().pop_front().flatten())
    }

    async fn say(&self, text: &str) -> Result<()> {
        if self.fail_say {
            return Err(Error::Tts("scripted speaker failure".to_string()));
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Perception double with canned analysis results
pub struct StubPerception {
    pub scene: String,
    pub objects: Vec<DetectedObject>,
    pub texts: Vec<TextRegion>,
    pub faces: Vec<Face>,
    frame_available: bool,
    fail_capture: bool,
    fail_analysis: bool,
    pub release_count: Arc<AtomicUsize>,
    /// `detailed` flags passed to `describe_scene`, in order
    pub detail_requests: Mutex<Vec<bool>>,
}

impl Default for StubPerception {
    fn default() -> Self {
        Self {
            scene: "A quiet room.".to_string(),
            objects: Vec::new(),
            texts: Vec::new(),
            faces: Vec::new(),
            frame_available: true,
            fail_capture: false,
            fail_analysis: false,
            release_count: Arc::new(AtomicUsize::new(0)),
            detail_requests: Mutex::new(Vec::new()),
        }
    }
}

impl StubPerception {
    pub fn with_objects(names: &[&str]) -> Self {
        Self {
            objects: names
                .iter()
                .map(|name| DetectedObject {
                    name: (*name).to_string(),
                    confidence: 0.9,
                    bbox: BoundingBox::default(),
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn with_texts(texts: &[&str]) -> Self {
        Self {
            texts: texts
                .iter()
                .map(|text| TextRegion {
                    text: (*text).to_string(),
                    confidence: 0.9,
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn with_faces(names: &[Option<&str>]) -> Self {
        Self {
            faces: names
                .iter()
                .map(|name| Face {
                    name: name.map(ToString::to_string),
                    confidence: 0.9,
                    bbox: BoundingBox::default(),
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Camera unavailable: every capture yields `None`
    pub fn without_frames() -> Self {
        Self {
            frame_available: false,
            ..Self::default()
        }
    }

    /// Broken camera: every capture errors
    pub fn with_failing_capture() -> Self {
        Self {
            fail_capture: true,
            ..Self::default()
        }
    }

    /// Frames come back fine, every analysis call errors
    pub fn with_failing_analysis() -> Self {
        Self {
            fail_analysis: true,
            ..Self::default()
        }
    }

    fn analysis_guard(&self) -> Result<()> {
        if self.fail_analysis {
            return Err(Error::Vision("scripted analysis failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Perception for StubPerception {
    async fn capture_frame(&self) -> Result<Option<Frame>> {
        if self.fail_capture {
            return Err(Error::Camera("scripted capture failure".to_string()));
        }
        if !self.frame_available {
            return Ok(None);
        }
        Ok(Some(Frame {
            data: vec![0xFF, 0xD8],
            mime_type: "image/jpeg".to_string(),
        }))
    }

    async fn detect_objects(&self, _frame: &Frame) -> Result<Vec<DetectedObject>> {
        self.analysis_guard()?;
        Ok(self.objects.clone())
    }

    async fn extract_text(&self, _frame: &Frame) -> Result<Vec<TextRegion>> {
        self.analysis_guard()?;
        Ok(self.texts.clone())
    }

    async fn recognize_faces(&self, _frame: &Frame) -> Result<Vec<Face>> {
        self.analysis_guard()?;
        Ok(self.faces.clone())
    }

    async fn describe_scene(&self, _frame: &Frame, detailed: bool) -> Result<String> {
        self.analysis_guard()?;
        self.detail_requests.lock().unwrap().push(detailed);
        Ok(self.scene.clone())
    }

    async fn release(&self) {
        self.release_count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Reasoning double
#[derive(Default)]
pub struct StubReasoning {
    pub intent: Option<Intent>,
    pub reply: Option<String>,
    /// Delay before classification answers, to exercise the budget
    pub delay: Option<Duration>,
}

impl StubReasoning {
    pub fn classifying(intent: Intent) -> Self {
        Self {
            intent: Some(intent),
            ..Self::default()
        }
    }

    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            ..Self::default()
        }
    }

    /// Fails every call
    pub fn failing() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Reasoning for StubReasoning {
    async fn classify_intent(&self, _utterance: &str, _state: &SessionState) -> Result<Intent> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.intent
            .clone()
            .ok_or_else(|| Error::Reasoning("scripted classification failure".to_string()))
    }

    async fn generate_response(&self, _prompt: &str, _state: &SessionState) -> Result<String> {
        self.reply
            .clone()
            .ok_or_else(|| Error::Reasoning("scripted reply failure".to_string()))
    }
}

/// Navigation double
#[derive(Default)]
pub struct StubNavigation {
    pub location: Option<Location>,
    pub route: Option<Route>,
}

impl StubNavigation {
    pub fn located() -> Self {
        Self {
            location: Some(Location {
                latitude: 52.52,
                longitude: 13.405,
                address: Some("Berlin, Germany".to_string()),
            }),
            route: None,
        }
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.route = Some(route);
        self
    }
}

#[async_trait]
impl Navigation for StubNavigation {
    async fn current_location(&self) -> Result<Option<Location>> {
        Ok(self.location.clone())
    }

    async fn route(&self, _from: &Location, destination: &str) -> Result<Route> {
        self.route
            .clone()
            .ok_or_else(|| Error::Navigation(format!("destination not found: {destination}")))
    }
}

/// Store double recording everything written to it
pub struct RecordingStore {
    pub preferences: Mutex<Preferences>,
    pub contacts: Vec<String>,
    pub exchanges: Mutex<Vec<(String, String)>>,
    pub alerts: AtomicUsize,
    pub close_count: Arc<AtomicUsize>,
    fail_writes: bool,
}

impl Default for RecordingStore {
    fn default() -> Self {
        Self {
            preferences: Mutex::new(Preferences::default()),
            contacts: Vec::new(),
            exchanges: Mutex::new(Vec::new()),
            alerts: AtomicUsize::new(0),
            close_count: Arc::new(AtomicUsize::new(0)),
            fail_writes: false,
        }
    }
}

impl RecordingStore {
    pub fn with_contacts(contacts: &[&str]) -> Self {
        Self {
            contacts: contacts.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn with_preferences(preferences: Preferences) -> Self {
        Self {
            preferences: Mutex::new(preferences),
            ..Self::default()
        }
    }

    /// Every write fails; reads still work
    pub fn with_failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    fn write_guard(&self) -> Result<()> {
        if self.fail_writes {
            return Err(Error::Database("scripted write failure".to_string()));
        }
        Ok(())
    }
}

impl Store for RecordingStore {
    fn load_preferences(&self, _user_id: &str) -> Result<Preferences> {
        Ok(self.preferences.lock().unwrap().clone())
    }

    fn save_preferences(&self, _user_id: &str, preferences: &Preferences) -> Result<()> {
        self.write_guard()?;
        *self.preferences.lock().unwrap() = preferences.clone();
        Ok(())
    }

    fn emergency_contacts(&self, _user_id: &str) -> Result<Vec<String>> {
        Ok(self.contacts.clone())
    }

    fn append_conversation(&self, _user_id: &str, input: &str, response: &str) -> Result<()> {
        self.write_guard()?;
        self.exchanges
            .lock()
            .unwrap()
            .push((input.to_string(), response.to_string()));
        Ok(())
    }

    fn record_alert(
        &self,
        _user_id: &str,
        _contacts: &[String],
        _location: Option<&str>,
    ) -> Result<()> {
        self.write_guard()?;
        self.alerts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {
        self.close_count.fetch_add(1, Ordering::SeqCst);
    }
}
