//! Scene description

use async_trait::async_trait;

use crate::dispatch::{Capability, CapabilityContext, CapabilityResult};
use crate::intent::Intent;
use crate::state::{DetailLevel, StateUpdate};
use crate::Result;

use super::capture_or_report;

/// Objects folded into a scene description
const MAX_SCENE_OBJECTS: usize = 5;

/// Text snippets folded into a scene description
const MAX_SCENE_TEXTS: usize = 2;

/// Describes the surroundings through the camera
pub struct SceneHandler;

#[async_trait]
impl Capability for SceneHandler {
    async fn invoke(
        &self,
        intent: &Intent,
        ctx: &CapabilityContext<'_>,
    ) -> Result<CapabilityResult> {
        ctx.say("Let me take a look around.").await;

        let frame = match capture_or_report(ctx).await {
            Ok(frame) => frame,
            Err(result) => return Ok(result),
        };

        // A per-command detail request wins over the stored preference
        let level = ctx.state.preferences.detail_level;
        let detailed = intent
            .param_bool("detailed")
            .unwrap_or(level == DetailLevel::Detailed);
        let caption = ctx.perception.describe_scene(&frame, detailed).await?;

        let mut message = caption.clone();

        // Enrichment is best effort; the caption alone is a valid answer
        if level != DetailLevel::Brief {
            match ctx.perception.detect_objects(&frame).await {
                Ok(objects) if !objects.is_empty() => {
                    let names: Vec<&str> = objects
                        .iter()
                        .take(MAX_SCENE_OBJECTS)
                        .map(|o| o.name.as_str())
                        .collect();
                    message.push_str(&format!(" I can see {}.", names.join(", ")));
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "object enrichment failed"),
            }

            match ctx.perception.extract_text(&frame).await {
                Ok(texts) if !texts.is_empty() => {
                    let snippets: Vec<String> = texts
                        .iter()
                        .take(MAX_SCENE_TEXTS)
                        .map(|t| format!("\"{}\"", t.text))
                        .collect();
                    message.push_str(&format!(" There is text reading {}.", snippets.join(" and ")));
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "text enrichment failed"),
            }
        }

        ctx.say(&message).await;

        Ok(CapabilityResult::spoken(message).with_update(StateUpdate::LastScene(caption)))
    }
}
