//! Intent dispatch
//!
//! Routes a classified [`Intent`] to its capability handler and contains
//! handler failures: a failing handler is logged and answered with a generic
//! spoken apology, never allowed to unwind the session loop.

use async_trait::async_trait;

use crate::handlers::{
    EmergencyHandler, ExitHandler, FacesHandler, GeneralHandler, NavigateHandler, ObjectsHandler,
    ReadTextHandler, SceneHandler,
};
use crate::intent::{Intent, IntentKind};
use crate::navigation::Navigation;
use crate::perception::Perception;
use crate::reasoning::Reasoning;
use crate::session::ResourceGuard;
use crate::speech::Speech;
use crate::state::{SessionState, StateUpdate};
use crate::store::Store;
use crate::Result;

/// Spoken reply when a handler fails
pub const FAILURE_REPLY: &str = "Sorry, I could not complete that. Please try again.";

/// Spoken reply when the command cannot be understood
pub const REPEAT_REPLY: &str = "I did not understand that. Could you repeat your command?";

/// What a handler produced: the reply it spoke plus any state mutations
/// for the loop to apply
#[derive(Debug)]
pub struct CapabilityResult {
    pub message: String,
    pub updates: Vec<StateUpdate>,
}

impl CapabilityResult {
    /// Result with no state updates
    #[must_use]
    pub fn spoken(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            updates: Vec::new(),
        }
    }

    /// Attach a state update
    #[must_use]
    pub fn with_update(mut self, update: StateUpdate) -> Self {
        self.updates.push(update);
        self
    }
}

/// Read-only view of the session handed to a handler for one invocation
pub struct CapabilityContext<'a> {
    pub state: &'a SessionState,
    pub speech: &'a dyn Speech,
    pub perception: &'a dyn Perception,
    pub reasoning: &'a dyn Reasoning,
    pub navigation: &'a dyn Navigation,
    pub store: &'a dyn Store,
    pub resources: &'a ResourceGuard,
    pub user_id: &'a str,
}

impl CapabilityContext<'_> {
    /// Speak a reply, logging delivery failures instead of propagating them
    pub async fn say(&self, text: &str) {
        if let Err(e) = self.speech.say(text).await {
            tracing::error!(error = %e, "failed to deliver spoken reply");
        }
    }
}

/// One capability behind an intent kind
#[async_trait]
pub trait Capability: Send + Sync {
    /// Execute the capability, speaking its reply through the context
    async fn invoke(
        &self,
        intent: &Intent,
        ctx: &CapabilityContext<'_>,
    ) -> Result<CapabilityResult>;
}

/// Routes intents to their handlers
pub struct Dispatcher {
    scene: SceneHandler,
    read_text: ReadTextHandler,
    objects: ObjectsHandler,
    faces: FacesHandler,
    navigate: NavigateHandler,
    emergency: EmergencyHandler,
    exit: ExitHandler,
    general: GeneralHandler,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scene: SceneHandler,
            read_text: ReadTextHandler,
            objects: ObjectsHandler,
            faces: FacesHandler,
            navigate: NavigateHandler,
            emergency: EmergencyHandler,
            exit: ExitHandler,
            general: GeneralHandler,
        }
    }

    /// Dispatch one intent, containing any handler failure
    ///
    /// Always yields a result; a failing handler is answered with
    /// [`FAILURE_REPLY`] and produces no state updates.
    pub async fn dispatch(
        &self,
        intent: &Intent,
        ctx: &CapabilityContext<'_>,
    ) -> CapabilityResult {
        let handler: &dyn Capability = match intent.kind {
            IntentKind::DescribeScene => &self.scene,
            IntentKind::ReadText => &self.read_text,
            IntentKind::RecognizeObjects => &self.objects,
            IntentKind::RecognizePeople => &self.faces,
            IntentKind::Navigate => &self.navigate,
            IntentKind::Emergency => &self.emergency,
            IntentKind::Exit => &self.exit,
            IntentKind::GeneralQuestion => &self.general,
            IntentKind::Unknown => {
                ctx.say(REPEAT_REPLY).await;
                return CapabilityResult::spoken(REPEAT_REPLY);
            }
        };

        tracing::info!(kind = intent.kind.as_str(), "dispatching command");

        match handler.invoke(intent, ctx).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(kind = intent.kind.as_str(), error = %e, "handler failed");
                ctx.say(FAILURE_REPLY).await;
                CapabilityResult::spoken(FAILURE_REPLY)
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
