//! Camera frame acquisition
//!
//! Pulls single JPEG snapshots from an IP camera's snapshot endpoint. A
//! missing or unreachable camera yields `None` rather than an error so the
//! handlers can report "sensor unavailable" and carry on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::{Error, Result};

use super::Frame;

/// Per-snapshot request timeout
const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetches frames from an IP camera snapshot URL
pub struct CameraClient {
    client: reqwest::Client,
    snapshot_url: String,
    released: AtomicBool,
}

impl CameraClient {
    /// Create a camera client for a snapshot endpoint
    ///
    /// With no URL configured the client starts released and every
    /// snapshot yields `None`.
    #[must_use]
    pub fn new(snapshot_url: String) -> Self {
        let released = snapshot_url.is_empty();
        if released {
            tracing::warn!("no camera configured, vision commands will report it unavailable");
        }

        Self {
            client: reqwest::Client::new(),
            snapshot_url,
            released: AtomicBool::new(released),
        }
    }

    /// Fetch one frame; `None` when the camera is unreachable or released
    ///
    /// # Errors
    ///
    /// Returns error only on response-decoding failure; transport failures
    /// map to `None` (sensor unavailable, not a collaborator fault)
    pub async fn snapshot(&self) -> Result<Option<Frame>> {
        if self.released.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let response = match self
            .client
            .get(&self.snapshot_url)
            .timeout(SNAPSHOT_TIMEOUT)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "camera unreachable");
                return Ok(None);
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "camera snapshot error");
            return Ok(None);
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();

        let data = response
            .bytes()
            .await
            .map_err(|e| Error::Camera(e.to_string()))?
            .to_vec();

        if data.is_empty() {
            tracing::warn!("camera returned empty frame");
            return Ok(None);
        }

        tracing::debug!(bytes = data.len(), mime = %mime_type, "frame captured");
        Ok(Some(Frame { data, mime_type }))
    }

    /// Release the camera handle; subsequent snapshots yield `None`
    pub fn release(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            tracing::debug!("camera released");
        }
    }
}
