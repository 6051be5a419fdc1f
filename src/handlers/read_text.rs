//! Text reading

use async_trait::async_trait;

use crate::dispatch::{Capability, CapabilityContext, CapabilityResult};
use crate::intent::Intent;
use crate::Result;

use super::capture_or_report;

/// Most text snippets read aloud in one reply
const MAX_TEXTS: usize = 5;

/// Reads visible text aloud
pub struct ReadTextHandler;

#[async_trait]
impl Capability for ReadTextHandler {
    async fn invoke(
        &self,
        _intent: &Intent,
        ctx: &CapabilityContext<'_>,
    ) -> Result<CapabilityResult> {
        ctx.say("Let me read that for you.").await;

        let frame = match capture_or_report(ctx).await {
            Ok(frame) => frame,
            Err(result) => return Ok(result),
        };

        let texts = ctx.perception.extract_text(&frame).await?;

        let message = if texts.is_empty() {
            "I do not see any readable text.".to_string()
        } else {
            let mut parts = vec![format!(
                "I found {} piece{} of text.",
                texts.len().min(MAX_TEXTS),
                if texts.len() == 1 { "" } else { "s" }
            )];
            for (i, region) in texts.iter().take(MAX_TEXTS).enumerate() {
                parts.push(format!("{}: {}.", i + 1, region.text));
            }
            parts.join(" ")
        };

        ctx.say(&message).await;
        Ok(CapabilityResult::spoken(message))
    }
}
