//! Perception collaborator
//!
//! Frame acquisition plus object/text/face/scene analysis. The orchestration
//! core consumes the [`Perception`] trait only; [`RemotePerception`] is the
//! production implementation (IP-camera snapshots + a vision API).

mod camera;
mod vision;

use async_trait::async_trait;

use crate::Result;

pub use camera::CameraClient;
pub use vision::VisionClient;

/// Minimum confidence for extracted text to be reported
pub const TEXT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// A captured camera frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Encoded image bytes
    pub data: Vec<u8>,
    /// MIME type of the encoding (e.g. "image/jpeg")
    pub mime_type: String,
}

/// Bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A detected object, in the detector's own ranking order
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DetectedObject {
    pub name: String,
    pub confidence: f32,
    #[serde(default)]
    pub bbox: BoundingBox,
}

/// A region of extracted text
#[derive(Debug, Clone, serde::Deserialize)]
pub struct TextRegion {
    pub text: String,
    pub confidence: f32,
}

/// A recognized face
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Face {
    /// Resolved identity, if known
    pub name: Option<String>,
    pub confidence: f32,
    #[serde(default)]
    pub bbox: BoundingBox,
}

impl Face {
    /// Spoken label for this face
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown person")
    }
}

/// Contract for the perception collaborator
#[async_trait]
pub trait Perception: Send + Sync {
    /// Capture one frame; `None` when no frame is available
    async fn capture_frame(&self) -> Result<Option<Frame>>;

    /// Detect objects, ordered by the detector's own ranking
    async fn detect_objects(&self, frame: &Frame) -> Result<Vec<DetectedObject>>;

    /// Extract text regions at confidence >= [`TEXT_CONFIDENCE_THRESHOLD`]
    async fn extract_text(&self, frame: &Frame) -> Result<Vec<TextRegion>>;

    /// Recognize faces
    async fn recognize_faces(&self, frame: &Frame) -> Result<Vec<Face>>;

    /// Describe the scene, briefly or in detail
    async fn describe_scene(&self, frame: &Frame, detailed: bool) -> Result<String>;

    /// Release the sensor handle; must be safe to call more than once
    async fn release(&self);
}

/// Production perception: camera snapshots analyzed by a vision API
pub struct RemotePerception {
    camera: CameraClient,
    vision: VisionClient,
}

impl RemotePerception {
    /// Create a perception pipeline from its two backends
    #[must_use]
    pub const fn new(camera: CameraClient, vision: VisionClient) -> Self {
        Self { camera, vision }
    }
}

#[async_trait]
impl Perception for RemotePerception {
    async fn capture_frame(&self) -> Result<Option<Frame>> {
        self.camera.snapshot().await
    }

    async fn detect_objects(&self, frame: &Frame) -> Result<Vec<DetectedObject>> {
        self.vision.detect_objects(frame).await
    }

    async fn extract_text(&self, frame: &Frame) -> Result<Vec<TextRegion>> {
        let regions = self.vision.extract_text(frame).await?;
        Ok(regions
            .into_iter()
            .filter(|r| r.confidence >= TEXT_CONFIDENCE_THRESHOLD)
            .collect())
    }

    async fn recognize_faces(&self, frame: &Frame) -> Result<Vec<Face>> {
        self.vision.recognize_faces(frame).await
    }

    async fn describe_scene(&self, frame: &Frame, detailed: bool) -> Result<String> {
        self.vision.describe_scene(frame, detailed).await
    }

    async fn release(&self) {
        self.camera.release();
    }
}
