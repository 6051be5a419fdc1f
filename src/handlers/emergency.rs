//! Emergency response
//!
//! This handler must always end with spoken reassurance. Every collaborator
//! call inside it is contained locally; it never returns an error.

use async_trait::async_trait;

use crate::dispatch::{Capability, CapabilityContext, CapabilityResult};
use crate::intent::Intent;
use crate::Result;

/// Alerts contacts and reassures the user
pub struct EmergencyHandler;

#[async_trait]
impl Capability for EmergencyHandler {
    async fn invoke(
        &self,
        _intent: &Intent,
        ctx: &CapabilityContext<'_>,
    ) -> Result<CapabilityResult> {
        ctx.say("I understand this is an emergency.").await;

        let location = match ctx.navigation.current_location().await {
            Ok(loc) => loc,
            Err(e) => {
                tracing::warn!(error = %e, "location lookup failed during emergency");
                None
            }
        };
        let location_text = location.as_ref().and_then(|l| l.address.clone());

        let contacts = &ctx.state.emergency_contacts;

        if let Err(e) = ctx
            .store
            .record_alert(ctx.user_id, contacts, location_text.as_deref())
        {
            tracing::error!(error = %e, "failed to record emergency alert");
        }

        let mut message = if contacts.is_empty() {
            "You have no emergency contacts configured, but please stay calm \
             and ask people nearby for help."
                .to_string()
        } else {
            format!(
                "I am alerting your {} emergency contact{} now. Help is on the way.",
                contacts.len(),
                if contacts.len() == 1 { "" } else { "s" }
            )
        };

        if let Some(address) = location_text {
            message.push_str(&format!(" Your location is {address}."));
        }

        message.push_str(" Stay calm, I am here with you.");

        ctx.say(&message).await;
        Ok(CapabilityResult::spoken(message))
    }
}
