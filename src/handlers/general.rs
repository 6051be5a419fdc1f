//! General questions

use async_trait::async_trait;

use crate::dispatch::{Capability, CapabilityContext, CapabilityResult};
use crate::intent::Intent;
use crate::Result;

/// Spoken reply when the reasoning backend cannot answer
pub const NO_ANSWER_REPLY: &str = "I am sorry, I cannot answer that right now.";

/// Answers free-form questions through the reasoning collaborator
pub struct GeneralHandler;

#[async_trait]
impl Capability for GeneralHandler {
    async fn invoke(
        &self,
        intent: &Intent,
        ctx: &CapabilityContext<'_>,
    ) -> Result<CapabilityResult> {
        let Some(query) = intent.param_str("query") else {
            ctx.say(NO_ANSWER_REPLY).await;
            return Ok(CapabilityResult::spoken(NO_ANSWER_REPLY));
        };

        let message = match ctx.reasoning.generate_response(query, ctx.state).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "response generation failed");
                NO_ANSWER_REPLY.to_string()
            }
        };

        ctx.say(&message).await;
        Ok(CapabilityResult::spoken(message))
    }
}
