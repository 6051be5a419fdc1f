//! Session loop
//!
//! The perceive-classify-dispatch-act cycle. One [`Session`] owns the
//! mutable state, the classifier, the dispatcher and the collaborators;
//! it runs until the user says goodbye or the process receives Ctrl+C,
//! and releases the camera and the store exactly once on the way out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::dispatch::{CapabilityContext, Dispatcher};
use crate::intent::IntentClassifier;
use crate::navigation::Navigation;
use crate::perception::Perception;
use crate::reasoning::Reasoning;
use crate::speech::Speech;
use crate::state::{SessionPhase, SessionState};
use crate::store::Store;
use crate::Result;

/// How long one iteration listens for a command
pub const LISTEN_WINDOW: Duration = Duration::from_secs(5);

/// Spoken greeting at session start
pub const GREETING: &str = "Hello, I am ready to help. What would you like me to do?";

/// Spoken farewell when the session is interrupted from outside
const INTERRUPT_FAREWELL: &str = "Shutting down. Goodbye.";

/// Releases the camera and the store exactly once, no matter how many
/// shutdown paths reach it
pub struct ResourceGuard {
    perception: Arc<dyn Perception>,
    store: Arc<dyn Store>,
    released: AtomicBool,
}

impl ResourceGuard {
    #[must_use]
    pub fn new(perception: Arc<dyn Perception>, store: Arc<dyn Store>) -> Self {
        Self {
            perception,
            store,
            released: AtomicBool::new(false),
        }
    }

    /// Release both resources; only the first call does anything
    pub async fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }

        self.perception.release().await;
        self.store.close();
        tracing::info!("resources released");
    }
}

/// One assistant session over its collaborators
pub struct Session {
    state: SessionState,
    classifier: IntentClassifier,
    dispatcher: Dispatcher,
    speech: Arc<dyn Speech>,
    perception: Arc<dyn Perception>,
    reasoning: Arc<dyn Reasoning>,
    navigation: Arc<dyn Navigation>,
    store: Arc<dyn Store>,
    resources: ResourceGuard,
    user_id: String,
    listen_window: Duration,
}

impl Session {
    /// Build a session, loading the user's preferences and contacts
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read
    pub fn new(
        speech: Arc<dyn Speech>,
        perception: Arc<dyn Perception>,
        reasoning: Arc<dyn Reasoning>,
        navigation: Arc<dyn Navigation>,
        store: Arc<dyn Store>,
        classifier: IntentClassifier,
        user_id: String,
    ) -> Result<Self> {
        let preferences = store.load_preferences(&user_id)?;
        let contacts = store.emergency_contacts(&user_id)?;
        let state = SessionState::new(preferences, contacts);

        let resources = ResourceGuard::new(Arc::clone(&perception), Arc::clone(&store));

        Ok(Self {
            state,
            classifier,
            dispatcher: Dispatcher::new(),
            speech,
            perception,
            reasoning,
            navigation,
            store,
            resources,
            user_id,
            listen_window: LISTEN_WINDOW,
        })
    }

    /// Override the per-iteration listen window
    #[must_use]
    pub const fn with_listen_window(mut self, window: Duration) -> Self {
        self.listen_window = window;
        self
    }

    /// Current session state, for inspection
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Run the loop until exit or Ctrl+C
    ///
    /// # Errors
    ///
    /// Returns error only on setup failure; per-iteration failures are
    /// contained and logged
    pub async fn run(&mut self) -> Result<()> {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(()).await;
            }
        });

        self.say_logged(GREETING).await;
        tracing::info!(user_id = %self.user_id, "session started");

        let mut interrupted = false;
        while self.state.running {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("interrupt received");
                    interrupted = true;
                    break;
                }
                () = self.step() => {}
            }
        }

        if interrupted {
            self.say_logged(INTERRUPT_FAREWELL).await;
        }

        self.shutdown().await;
        Ok(())
    }

    /// Process a single typed command and shut down
    ///
    /// Used by the one-shot diagnostic mode; skips listening entirely.
    ///
    /// # Errors
    ///
    /// Returns error only on setup failure
    pub async fn run_once(&mut self, command: &str) -> Result<()> {
        tracing::info!(command = %command, "one-shot command");
        self.process_command(command).await;
        self.shutdown().await;
        Ok(())
    }

    /// One loop iteration: listen, then act on what was heard
    async fn step(&mut self) {
        self.state.enter(SessionPhase::Listening);

        match self.speech.listen(self.listen_window).await {
            Ok(Some(utterance)) => {
                tracing::info!(utterance = %utterance, "command heard");
                self.process_command(&utterance).await;
                // Command feedback first, then the ambient description
                if self.state.running && self.state.preferences.continuous_mode {
                    self.ambient_update().await;
                }
            }
            Ok(None) => {
                self.state.enter(SessionPhase::Idle);
                if self.state.preferences.continuous_mode {
                    self.ambient_update().await;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "listen failed");
                // Keep the loop alive; do not spin on a broken microphone
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }

    /// Classify and dispatch one utterance, then apply its state updates
    async fn process_command(&mut self, utterance: &str) {
        self.state.enter(SessionPhase::Classifying);
        let intent = self.classifier.classify(utterance, &self.state).await;

        // The context borrows the state for the whole dispatch, so both
        // phase transitions happen before it is built
        self.state.enter(SessionPhase::Dispatching);
        self.state.enter(SessionPhase::Executing);

        let ctx = CapabilityContext {
            state: &self.state,
            speech: self.speech.as_ref(),
            perception: self.perception.as_ref(),
            reasoning: self.reasoning.as_ref(),
            navigation: self.navigation.as_ref(),
            store: self.store.as_ref(),
            resources: &self.resources,
            user_id: &self.user_id,
        };
        let result = self.dispatcher.dispatch(&intent, &ctx).await;

        if let Err(e) = self
            .store
            .append_conversation(&self.user_id, utterance, &result.message)
        {
            tracing::warn!(error = %e, "failed to record exchange");
        }

        for update in result.updates {
            self.state.apply(update);
        }

        self.state.enter(SessionPhase::Idle);
    }

    /// Unprompted brief scene description, spoken only when the scene changed
    async fn ambient_update(&mut self) {
        let frame = match self.perception.capture_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "ambient capture failed");
                return;
            }
        };

        let description = match self.perception.describe_scene(&frame, false).await {
            Ok(description) => description,
            Err(e) => {
                tracing::warn!(error = %e, "ambient description failed");
                return;
            }
        };

        if self.state.last_scene.as_deref() == Some(description.as_str()) {
            return;
        }

        self.say_logged(&description).await;
        self.state
            .apply(crate::state::StateUpdate::LastScene(description));
    }

    /// Release resources and finish the session
    async fn shutdown(&mut self) {
        self.state.enter(SessionPhase::ShuttingDown);
        self.resources.release().await;
        self.state.enter(SessionPhase::Terminated);
        self.state.running = false;
        tracing::info!("session ended");
    }

    /// Speak, logging failures instead of propagating them
    async fn say_logged(&self, text: &str) {
        if let Err(e) = self.speech.say(text).await {
            tracing::error!(error = %e, "failed to speak");
        }
    }
}
