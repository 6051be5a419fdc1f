//! Face recognition

use async_trait::async_trait;

use crate::dispatch::{Capability, CapabilityContext, CapabilityResult};
use crate::intent::Intent;
use crate::Result;

use super::capture_or_report;

/// Reports who is in view
pub struct FacesHandler;

#[async_trait]
impl Capability for FacesHandler {
    async fn invoke(
        &self,
        _intent: &Intent,
        ctx: &CapabilityContext<'_>,
    ) -> Result<CapabilityResult> {
        ctx.say("Let me check who is there.").await;

        let frame = match capture_or_report(ctx).await {
            Ok(frame) => frame,
            Err(result) => return Ok(result),
        };

        let faces = ctx.perception.recognize_faces(&frame).await?;

        let message = if faces.is_empty() {
            "I do not see anyone in front of you.".to_string()
        } else {
            let labels: Vec<&str> = faces.iter().map(crate::perception::Face::label).collect();
            if faces.len() == 1 {
                format!("I can see one person: {}.", labels[0])
            } else {
                format!("I can see {} people: {}.", faces.len(), labels.join(", "))
            }
        };

        ctx.say(&message).await;
        Ok(CapabilityResult::spoken(message))
    }
}
