//! Session exit

use async_trait::async_trait;

use crate::dispatch::{Capability, CapabilityContext, CapabilityResult};
use crate::intent::Intent;
use crate::state::StateUpdate;
use crate::Result;

/// Spoken farewell on exit
pub const FAREWELL_REPLY: &str = "Goodbye. Take care.";

/// Says goodbye, releases resources and stops the loop
pub struct ExitHandler;

#[async_trait]
impl Capability for ExitHandler {
    async fn invoke(
        &self,
        _intent: &Intent,
        ctx: &CapabilityContext<'_>,
    ) -> Result<CapabilityResult> {
        ctx.say(FAREWELL_REPLY).await;

        // The loop also releases on shutdown; the guard makes both safe
        ctx.resources.release().await;

        Ok(CapabilityResult::spoken(FAREWELL_REPLY).with_update(StateUpdate::Terminate))
    }
}
