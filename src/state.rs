//! Session state
//!
//! A single mutable record owned by the session loop. Handlers see it
//! read-only during their execution window and report mutations as
//! [`StateUpdate`] values, which the loop applies between iterations.

use serde::{Deserialize, Serialize};

/// How much detail spoken descriptions should carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    Brief,
    #[default]
    Normal,
    Detailed,
}

/// Persisted user preferences, loaded from the store at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// TTS speed multiplier
    pub voice_speed: f32,

    /// Description verbosity
    pub detail_level: DetailLevel,

    /// Spoken language code (e.g. "en")
    pub language: String,

    /// Unprompted scene description once per idle iteration
    pub continuous_mode: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            voice_speed: 1.0,
            detail_level: DetailLevel::Normal,
            language: "en".to_string(),
            continuous_mode: false,
        }
    }
}

/// Phase of the perceive-classify-dispatch-act cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Listening,
    Classifying,
    Dispatching,
    Executing,
    ShuttingDown,
    Terminated,
}

/// Mutable per-session record
#[derive(Debug, Clone)]
pub struct SessionState {
    /// User preferences
    pub preferences: Preferences,

    /// Ordered emergency contact list
    pub emergency_contacts: Vec<String>,

    /// Most recent scene description, if any
    pub last_scene: Option<String>,

    /// Loop continuation flag
    pub running: bool,

    /// Current cycle phase (observability only)
    pub phase: SessionPhase,
}

impl SessionState {
    /// Fresh state from loaded preferences and contacts
    #[must_use]
    pub const fn new(preferences: Preferences, emergency_contacts: Vec<String>) -> Self {
        Self {
            preferences,
            emergency_contacts,
            last_scene: None,
            running: true,
            phase: SessionPhase::Idle,
        }
    }

    /// Record a phase transition
    pub fn enter(&mut self, phase: SessionPhase) {
        tracing::trace!(from = ?self.phase, to = ?phase, "session phase");
        self.phase = phase;
    }

    /// Apply one handler-reported update
    pub fn apply(&mut self, update: StateUpdate) {
        match update {
            StateUpdate::LastScene(description) => {
                self.last_scene = Some(description);
            }
            StateUpdate::Terminate => {
                self.running = false;
            }
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(Preferences::default(), Vec::new())
    }
}

/// A mutation reported by a handler and applied by the loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateUpdate {
    /// Replace the most recent scene description
    LastScene(String),
    /// Stop the session loop after this iteration
    Terminate,
}
