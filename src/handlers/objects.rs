//! Object recognition

use async_trait::async_trait;

use crate::dispatch::{Capability, CapabilityContext, CapabilityResult};
use crate::intent::Intent;
use crate::Result;

use super::capture_or_report;

/// Most objects named in one reply
const MAX_OBJECTS: usize = 5;

/// Names the objects in view, most prominent first
pub struct ObjectsHandler;

#[async_trait]
impl Capability for ObjectsHandler {
    async fn invoke(
        &self,
        _intent: &Intent,
        ctx: &CapabilityContext<'_>,
    ) -> Result<CapabilityResult> {
        ctx.say("Let me see what is there.").await;

        let frame = match capture_or_report(ctx).await {
            Ok(frame) => frame,
            Err(result) => return Ok(result),
        };

        let objects = ctx.perception.detect_objects(&frame).await?;

        let message = if objects.is_empty() {
            "I do not see any distinct objects.".to_string()
        } else {
            // Detector order is the ranking; no re-sorting
            let names: Vec<&str> = objects
                .iter()
                .take(MAX_OBJECTS)
                .map(|o| o.name.as_str())
                .collect();
            format!("I can see {}.", names.join(", "))
        };

        ctx.say(&message).await;
        Ok(CapabilityResult::spoken(message))
    }
}
