//! Walking directions

use async_trait::async_trait;

use crate::dispatch::{Capability, CapabilityContext, CapabilityResult};
use crate::intent::Intent;
use crate::Result;

/// Spoken steps included in one reply
const MAX_SPOKEN_STEPS: usize = 3;

/// Spoken reply when the user's position cannot be determined
pub const NO_LOCATION_REPLY: &str =
    "I could not determine your current location, so I cannot give directions.";

/// Answers navigation requests with walking directions
pub struct NavigateHandler;

/// Fixed reply when a destination cannot be routed
#[must_use]
pub fn no_route_reply(destination: &str) -> String {
    format!("I could not find directions to {destination}.")
}

#[async_trait]
impl Capability for NavigateHandler {
    async fn invoke(
        &self,
        intent: &Intent,
        ctx: &CapabilityContext<'_>,
    ) -> Result<CapabilityResult> {
        let Some(destination) = intent.param_str("destination") else {
            let prompt = "Where would you like to go?";
            ctx.say(prompt).await;
            return Ok(CapabilityResult::spoken(prompt));
        };

        ctx.say(&format!("Finding directions to {destination}."))
            .await;

        let Some(origin) = ctx.navigation.current_location().await? else {
            ctx.say(NO_LOCATION_REPLY).await;
            return Ok(CapabilityResult::spoken(NO_LOCATION_REPLY));
        };

        // A destination that cannot be routed is an answered outcome
        let route = match ctx.navigation.route(&origin, destination).await {
            Ok(route) => route,
            Err(e) => {
                tracing::warn!(destination = %destination, error = %e, "routing failed");
                let message = no_route_reply(destination);
                ctx.say(&message).await;
                return Ok(CapabilityResult::spoken(message));
            }
        };

        let message = spoken_route_summary(destination, &route);
        ctx.say(&message).await;
        Ok(CapabilityResult::spoken(message))
    }
}

/// Compose the spoken summary for a route
fn spoken_route_summary(destination: &str, route: &crate::navigation::Route) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let meters = route.distance_meters.round() as u64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let minutes = (route.duration_secs / 60.0).ceil().max(1.0) as u64;

    let mut parts = vec![format!(
        "{destination} is about {meters} meters away, roughly {minutes} minute{} on foot.",
        if minutes == 1 { "" } else { "s" }
    )];

    for step in route.steps.iter().take(MAX_SPOKEN_STEPS) {
        parts.push(format!("{}.", step.instruction));
    }

    if route.steps.len() > MAX_SPOKEN_STEPS {
        parts.push("I will guide you through the rest as you walk.".to_string());
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{Route, RouteStep};

    #[test]
    fn test_route_summary_truncates_steps() {
        let route = Route {
            distance_meters: 412.3,
            duration_secs: 300.0,
            steps: (0..5)
                .map(|i| RouteStep {
                    instruction: format!("Step {i}"),
                    distance_meters: 80.0,
                })
                .collect(),
        };

        let summary = spoken_route_summary("the library", &route);
        assert!(summary.starts_with("the library is about 412 meters away, roughly 5 minutes"));
        assert!(summary.contains("Step 2."));
        assert!(!summary.contains("Step 3."));
        assert!(summary.contains("guide you through the rest"));
    }

    #[test]
    fn test_route_summary_singular_minute() {
        let route = Route {
            distance_meters: 50.0,
            duration_secs: 40.0,
            steps: Vec::new(),
        };

        let summary = spoken_route_summary("the corner", &route);
        assert!(summary.contains("roughly 1 minute on foot"));
    }
}
