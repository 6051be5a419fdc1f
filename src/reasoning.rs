//! Reasoning collaborator
//!
//! Language-understanding and response generation. The orchestration core
//! consumes the [`Reasoning`] trait; [`LanguageModel`] is the production
//! implementation against an OpenAI-compatible chat completions endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::intent::{Intent, IntentKind};
use crate::state::SessionState;
use crate::{Error, Result};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

const ASSISTANT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant for visually impaired people. Keep responses short, \
     concrete, and suitable for being read aloud.";

/// Contract for the reasoning collaborator
#[async_trait]
pub trait Reasoning: Send + Sync {
    /// Classify an utterance into an [`Intent`]
    ///
    /// May fail or time out; the classifier contains both.
    async fn classify_intent(&self, utterance: &str, state: &SessionState) -> Result<Intent>;

    /// Generate a conversational reply to a free-form prompt
    async fn generate_response(&self, prompt: &str, state: &SessionState) -> Result<String>;
}

/// Chat completions request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

/// A chat message
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat completions response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Production reasoning backend over an OpenAI-compatible endpoint
pub struct LanguageModel {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl LanguageModel {
    /// Create a new language model client
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for reasoning".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_url: DEFAULT_API_URL.to_string(),
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

    /// Create with a specific endpoint (for OpenAI-compatible routers)
    #[must_use]
    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }

    /// Send one chat completion and return the reply text
    async fn complete(
        &self,
        system: Option<&str>,
        user: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: user,
        });

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Reasoning(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Reasoning(format!("API error {status}: {body}")));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Reasoning(format!("parse error: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| Error::Reasoning("empty completion".to_string()))
    }
}

/// Build the intent-classification prompt with the fixed vocabulary
fn classification_prompt(utterance: &str, state: &SessionState) -> String {
    let vocabulary = [
        IntentKind::DescribeScene,
        IntentKind::ReadText,
        IntentKind::RecognizeObjects,
        IntentKind::Navigate,
        IntentKind::RecognizePeople,
        IntentKind::Emergency,
        IntentKind::Exit,
        IntentKind::GeneralQuestion,
        IntentKind::Unknown,
    ]
    .map(IntentKind::as_str)
    .join(", ");

    let last_scene = state.last_scene.as_deref().unwrap_or("none");

    format!(
        "User command: {utterance}\n\
         Last scene: {last_scene}\n\n\
         Classify the command and extract parameters (e.g. \"destination\" for navigation).\n\
         Intent options: {vocabulary}\n\n\
         Respond with only JSON: {{\"kind\": \"intent_name\", \"parameters\": {{}}}}"
    )
}

/// Strip optional code fences around a JSON reply
fn strip_fences(reply: &str) -> &str {
    reply
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

#[async_trait]
impl Reasoning for LanguageModel {
    async fn classify_intent(&self, utterance: &str, state: &SessionState) -> Result<Intent> {
        let prompt = classification_prompt(utterance, state);
        let reply = self.complete(None, &prompt, 0.1, 100).await?;

        let intent: Intent = serde_json::from_str(strip_fences(&reply))
            .map_err(|e| Error::Reasoning(format!("malformed intent reply: {e}")))?;

        Ok(intent)
    }

    async fn generate_response(&self, prompt: &str, _state: &SessionState) -> Result<String> {
        self.complete(Some(ASSISTANT_SYSTEM_PROMPT), prompt, 0.7, 200)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_prompt_lists_vocabulary() {
        let state = SessionState::default();
        let prompt = classification_prompt("where am I", &state);
        assert!(prompt.contains("describe_scene"));
        assert!(prompt.contains("recognize_people"));
        assert!(prompt.contains("general_question"));
    }

    #[test]
    fn test_intent_reply_parses() {
        let reply = r#"{"kind": "navigate", "parameters": {"destination": "the library"}}"#;
        let intent: Intent = serde_json::from_str(strip_fences(reply)).unwrap();
        assert_eq!(intent.kind, IntentKind::Navigate);
        assert_eq!(intent.param_str("destination"), Some("the library"));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        // Kinds outside the fixed vocabulary must fail parsing so the
        // classifier falls back to keywords
        let reply = r#"{"kind": "make_coffee", "parameters": {}}"#;
        assert!(serde_json::from_str::<Intent>(reply).is_err());
    }
}
