//! Navigation collaborator
//!
//! Location lookup, geocoding and routing. The orchestration core consumes
//! the [`Navigation`] trait; [`OsmNavigation`] is the production
//! implementation over IP geolocation, Nominatim and OSRM.

use async_trait::async_trait;
use serde::Deserialize;

use crate::{Error, Result};

const IP_LOCATION_URL: &str = "https://ipapi.co/json/";
const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
const OSRM_URL: &str = "https://router.project-osrm.org/route/v1/foot";
const USER_AGENT: &str = concat!("lumen/", env!("CARGO_PKG_VERSION"));

/// A resolved geographic position
#[derive(Debug, Clone)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Human-readable address, when known
    pub address: Option<String>,
}

/// One step of a route
#[derive(Debug, Clone)]
pub struct RouteStep {
    /// Spoken instruction, e.g. "Turn left onto Main Street"
    pub instruction: String,
    /// Step length in meters
    pub distance_meters: f64,
}

/// A computed route
#[derive(Debug, Clone)]
pub struct Route {
    pub distance_meters: f64,
    pub duration_secs: f64,
    /// Ordered instruction steps
    pub steps: Vec<RouteStep>,
}

/// Contract for the navigation collaborator
#[async_trait]
pub trait Navigation: Send + Sync {
    /// Resolve the current location; `None` when it cannot be determined
    async fn current_location(&self) -> Result<Option<Location>>;

    /// Compute a route from a position to a spoken destination
    ///
    /// Fails when the destination cannot be geocoded or routing errors.
    async fn route(&self, from: &Location, destination: &str) -> Result<Route>;
}

/// IP geolocation response
#[derive(Debug, Deserialize)]
struct IpLocationResponse {
    latitude: f64,
    longitude: f64,
    city: Option<String>,
    country_name: Option<String>,
}

/// One Nominatim search hit
#[derive(Debug, Deserialize)]
struct GeocodeHit {
    lat: String,
    lon: String,
}

/// OSRM route response
#[derive(Debug, Deserialize)]
struct OsrmResponse {
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    distance: f64,
    name: String,
    maneuver: OsrmManeuver,
}

#[derive(Debug, Deserialize)]
struct OsrmManeuver {
    #[serde(rename = "type")]
    kind: String,
    modifier: Option<String>,
}

/// Production navigation over OpenStreetMap services
pub struct OsmNavigation {
    client: reqwest::Client,
}

impl OsmNavigation {
    /// Create a navigation client
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self { client })
    }

    /// Geocode a destination name to coordinates
    async fn geocode(&self, destination: &str) -> Result<Location> {
        let url = format!(
            "{NOMINATIM_URL}?q={}&format=json&limit=1",
            urlencoding::encode(destination)
        );

        let hits: Vec<GeocodeHit> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Navigation(format!("geocode request failed: {e}")))?
            .json()
            .await
            .map_err(|e| Error::Navigation(format!("geocode parse error: {e}")))?;

        let hit = hits
            .into_iter()
            .next()
            .ok_or_else(|| Error::Navigation(format!("destination not found: {destination}")))?;

        let latitude = hit
            .lat
            .parse()
            .map_err(|_| Error::Navigation("bad geocode latitude".to_string()))?;
        let longitude = hit
            .lon
            .parse()
            .map_err(|_| Error::Navigation("bad geocode longitude".to_string()))?;

        Ok(Location {
            latitude,
            longitude,
            address: Some(destination.to_string()),
        })
    }
}

#[async_trait]
impl Navigation for OsmNavigation {
    async fn current_location(&self) -> Result<Option<Location>> {
        let response = match self.client.get(IP_LOCATION_URL).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "IP geolocation unreachable");
                return Ok(None);
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "IP geolocation error");
            return Ok(None);
        }

        let loc: IpLocationResponse = response
            .json()
            .await
            .map_err(|e| Error::Navigation(format!("location parse error: {e}")))?;

        let address = match (loc.city, loc.country_name) {
            (Some(city), Some(country)) => Some(format!("{city}, {country}")),
            (Some(city), None) => Some(city),
            _ => None,
        };

        Ok(Some(Location {
            latitude: loc.latitude,
            longitude: loc.longitude,
            address,
        }))
    }

    async fn route(&self, from: &Location, destination: &str) -> Result<Route> {
        let to = self.geocode(destination).await?;

        let url = format!(
            "{OSRM_URL}/{},{};{},{}?steps=true&overview=false",
            from.longitude, from.latitude, to.longitude, to.latitude
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Navigation(format!("route request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Navigation(format!("routing error {status}")));
        }

        let osrm: OsrmResponse = response
            .json()
            .await
            .map_err(|e| Error::Navigation(format!("route parse error: {e}")))?;

        let route = osrm
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| Error::Navigation("no route found".to_string()))?;

        let steps = route
            .legs
            .into_iter()
            .flat_map(|leg| leg.steps)
            .map(|step| RouteStep {
                instruction: spoken_instruction(&step),
                distance_meters: step.distance,
            })
            .collect();

        Ok(Route {
            distance_meters: route.distance,
            duration_secs: route.duration,
            steps,
        })
    }
}

/// Turn an OSRM maneuver into a spoken instruction
fn spoken_instruction(step: &OsrmStep) -> String {
    let road = if step.name.is_empty() {
        String::new()
    } else {
        format!(" onto {}", step.name)
    };

    match (step.maneuver.kind.as_str(), step.maneuver.modifier.as_deref()) {
        ("depart", _) => format!("Head out{road}"),
        ("arrive", _) => "You have arrived at your destination".to_string(),
        ("turn" | "end of road" | "fork", Some(modifier)) => {
            format!("Turn {modifier}{road}")
        }
        ("continue", _) | (_, None) => format!("Continue{road}"),
        (_, Some(modifier)) => format!("Keep {modifier}{road}"),
    }
}
