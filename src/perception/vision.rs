//! Vision API client for frame analysis
//!
//! Uses Claude's vision capabilities for scene description and for
//! structured object/text/face extraction (the model is asked for a JSON
//! array and the reply is parsed strictly; anything unparsable is an error
//! the handlers contain).

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

use super::{DetectedObject, Face, Frame, TextRegion};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const OBJECTS_PROMPT: &str = "List the distinct physical objects visible in this image, most prominent first. \
     Respond with only a JSON array of {\"name\": string, \"confidence\": number 0-1, \
     \"bbox\": {\"x\": number, \"y\": number, \"width\": number, \"height\": number}}.";

const TEXT_PROMPT: &str = "Extract every piece of readable text in this image. \
     Respond with only a JSON array of {\"text\": string, \"confidence\": number 0-1}.";

const FACES_PROMPT: &str = "Identify the human faces visible in this image. \
     Respond with only a JSON array of {\"name\": string or null, \"confidence\": number 0-1, \
     \"bbox\": {\"x\": number, \"y\": number, \"width\": number, \"height\": number}}. \
     Use null for name when the person cannot be identified.";

const BRIEF_SCENE_PROMPT: &str =
    "Describe this scene in one short sentence for a visually impaired listener.";

const DETAILED_SCENE_PROMPT: &str = "Describe this scene in 2-3 sentences for a visually impaired listener. \
     Mention the layout, notable objects, and any visible hazards.";

/// Vision client for frame analysis
pub struct VisionClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

/// Anthropic message request
#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

/// A message in the request
#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: Vec<ContentBlock<'a>>,
}

/// Content block (text or image)
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentBlock<'a> {
    #[serde(rename = "text")]
    Text { text: &'a str },
    #[serde(rename = "image")]
    Image { source: ImageSource<'a> },
}

/// Image source
#[derive(Debug, Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    source_type: &'a str,
    media_type: &'a str,
    data: String,
}

/// Anthropic message response
#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ResponseContent>,
}

/// Response content block
#[derive(Debug, Deserialize)]
struct ResponseContent {
    text: Option<String>,
}

impl VisionClient {
    /// Create a new vision client
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "Anthropic API key required for vision".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Create with a specific model
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Describe the scene in a frame
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or yields an empty reply
    pub async fn describe_scene(&self, frame: &Frame, detailed: bool) -> Result<String> {
        let prompt = if detailed {
            DETAILED_SCENE_PROMPT
        } else {
            BRIEF_SCENE_PROMPT
        };

        let description = self.analyze(frame, prompt, 300).await?;
        tracing::debug!(detailed, description = %description, "scene described");
        Ok(description)
    }

    /// Detect objects in a frame, most prominent first
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or the reply is not valid JSON
    pub async fn detect_objects(&self, frame: &Frame) -> Result<Vec<DetectedObject>> {
        let reply = self.analyze(frame, OBJECTS_PROMPT, 1024).await?;
        parse_json_reply(&reply).map_err(|e| Error::Vision(format!("object reply: {e}")))
    }

    /// Extract text regions from a frame
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or the reply is not valid JSON
    pub async fn extract_text(&self, frame: &Frame) -> Result<Vec<TextRegion>> {
        let reply = self.analyze(frame, TEXT_PROMPT, 1024).await?;
        parse_json_reply(&reply).map_err(|e| Error::Vision(format!("text reply: {e}")))
    }

    /// Recognize faces in a frame
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or the reply is not valid JSON
    pub async fn recognize_faces(&self, frame: &Frame) -> Result<Vec<Face>> {
        let reply = self.analyze(frame, FACES_PROMPT, 1024).await?;
        parse_json_reply(&reply).map_err(|e| Error::Vision(format!("face reply: {e}")))
    }

    /// Send one frame+prompt request and return the text reply
    async fn analyze(&self, frame: &Frame, prompt: &str, max_tokens: u32) -> Result<String> {
        let base64_data = base64::engine::general_purpose::STANDARD.encode(&frame.data);
        let media_type = normalize_mime_type(&frame.mime_type);

        let request = MessageRequest {
            model: &self.model,
            max_tokens,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentBlock::Image {
                        source: ImageSource {
                            source_type: "base64",
                            media_type,
                            data: base64_data,
                        },
                    },
                    ContentBlock::Text { text: prompt },
                ],
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Vision(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Vision(format!("API error {status}: {body}")));
        }

        let result: MessageResponse = response
            .json()
            .await
            .map_err(|e| Error::Vision(format!("parse error: {e}")))?;

        let reply = result
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join(" ");

        if reply.is_empty() {
            return Err(Error::Vision("empty response from vision API".to_string()));
        }

        Ok(reply)
    }
}

/// Parse a JSON array out of a model reply, tolerating code fences
fn parse_json_reply<T: serde::de::DeserializeOwned>(reply: &str) -> serde_json::Result<Vec<T>> {
    let trimmed = reply
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    serde_json::from_str(trimmed)
}

/// Normalize MIME type for the vision API
fn normalize_mime_type(mime_type: &str) -> &'static str {
    match mime_type.to_lowercase().as_str() {
        "image/png" => "image/png",
        "image/gif" => "image/gif",
        "image/webp" => "image/webp",
        // jpeg, jpg, and any unknown type default to jpeg
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_reply_plain() {
        let objects: Vec<DetectedObject> = parse_json_reply(
            r#"[{"name": "chair", "confidence": 0.92}, {"name": "table", "confidence": 0.88}]"#,
        )
        .unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].name, "chair");
    }

    #[test]
    fn test_parse_json_reply_fenced() {
        let texts: Vec<TextRegion> =
            parse_json_reply("```json\n[{\"text\": \"EXIT\", \"confidence\": 0.99}]\n```").unwrap();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].text, "EXIT");
    }

    #[test]
    fn test_parse_json_reply_malformed() {
        let result: serde_json::Result<Vec<TextRegion>> = parse_json_reply("I see a chair.");
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_mime_type() {
        assert_eq!(normalize_mime_type("image/png"), "image/png");
        assert_eq!(normalize_mime_type("image/jpg"), "image/jpeg");
        assert_eq!(normalize_mime_type("application/octet-stream"), "image/jpeg");
    }
}
