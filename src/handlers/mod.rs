//! Capability handlers
//!
//! One handler per intent kind. Handlers announce what they are doing,
//! do their work through the collaborator traits, speak the outcome, and
//! report state mutations back to the loop. A handler that cannot finish
//! returns an error for the dispatcher to contain.

mod emergency;
mod exit;
mod faces;
mod general;
mod navigate;
mod objects;
mod read_text;
mod scene;

pub use emergency::EmergencyHandler;
pub use exit::{ExitHandler, FAREWELL_REPLY};
pub use faces::FacesHandler;
pub use general::GeneralHandler;
pub use navigate::NavigateHandler;
pub use objects::ObjectsHandler;
pub use read_text::ReadTextHandler;
pub use scene::SceneHandler;

use crate::dispatch::{CapabilityContext, CapabilityResult};
use crate::perception::Frame;

/// Spoken reply when no frame can be captured
pub const SENSOR_UNAVAILABLE_REPLY: &str =
    "The camera is not available right now, so I cannot see anything.";

/// Capture a frame, or speak the sensor-unavailable reply
///
/// Vision handlers share this preamble; a missing or broken camera is an
/// answered outcome, not a failure.
pub(crate) async fn capture_or_report(
    ctx: &CapabilityContext<'_>,
) -> Result<Frame, CapabilityResult> {
    match ctx.perception.capture_frame().await {
        Ok(Some(frame)) => return Ok(frame),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "frame capture failed"),
    }
    ctx.say(SENSOR_UNAVAILABLE_REPLY).await;
    Err(CapabilityResult::spoken(SENSOR_UNAVAILABLE_REPLY))
}
