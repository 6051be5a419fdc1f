//! Configuration
//!
//! Settings resolve in order: built-in defaults, then the TOML config file,
//! then `LUMEN_*` environment variables. API keys also fall back to the
//! conventional `OPENAI_API_KEY` / `ANTHROPIC_API_KEY` variables.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::{Error, Result};

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// User whose preferences and history this session belongs to
    pub user_id: String,

    /// SQLite database path
    pub database_path: PathBuf,

    /// OpenAI API key (transcription, synthesis, reasoning)
    pub openai_api_key: String,

    /// Anthropic API key (vision)
    pub anthropic_api_key: String,

    /// IP camera snapshot URL
    pub camera_url: String,

    /// Chat model for classification and responses
    pub reasoning_model: String,

    /// Vision model for frame analysis
    pub vision_model: String,

    /// Transcription model
    pub stt_model: String,

    /// Synthesis model
    pub tts_model: String,

    /// Synthesis voice
    pub tts_voice: String,

    /// Per-iteration listen window, seconds
    pub listen_window_secs: u64,

    /// Remote classification budget, seconds
    pub classify_budget_secs: u64,

    /// Ask the language model to classify; keywords remain the fallback
    pub remote_classification: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_id: "default".to_string(),
            database_path: default_database_path(),
            openai_api_key: String::new(),
            anthropic_api_key: String::new(),
            camera_url: String::new(),
            reasoning_model: "gpt-4o-mini".to_string(),
            vision_model: "claude-sonnet-4-20250514".to_string(),
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "nova".to_string(),
            listen_window_secs: 5,
            classify_budget_secs: 10,
            remote_classification: true,
        }
    }
}

/// Partial config as read from the TOML file; every field optional
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    user_id: Option<String>,
    database_path: Option<PathBuf>,
    openai_api_key: Option<String>,
    anthropic_api_key: Option<String>,
    camera_url: Option<String>,
    reasoning_model: Option<String>,
    vision_model: Option<String>,
    stt_model: Option<String>,
    tts_model: Option<String>,
    tts_voice: Option<String>,
    listen_window_secs: Option<u64>,
    classify_budget_secs: Option<u64>,
    remote_classification: Option<bool>,
}

impl Config {
    /// Load configuration from defaults, file and environment
    ///
    /// # Errors
    ///
    /// Returns error if an explicitly given file is missing or malformed
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                config.overlay_file(&toml::from_str::<FileConfig>(&raw)?);
            }
            None => {
                // Default location is optional
                if let Some(path) = default_config_path() {
                    if let Ok(raw) = std::fs::read_to_string(&path) {
                        config.overlay_file(&toml::from_str::<FileConfig>(&raw)?);
                        tracing::debug!(path = %path.display(), "config file loaded");
                    }
                }
            }
        }

        config.overlay_env();
        Ok(config)
    }

    fn overlay_file(&mut self, file: &FileConfig) {
        if let Some(v) = &file.user_id {
            self.user_id.clone_from(v);
        }
        if let Some(v) = &file.database_path {
            self.database_path.clone_from(v);
        }
        if let Some(v) = &file.openai_api_key {
            self.openai_api_key.clone_from(v);
        }
        if let Some(v) = &file.anthropic_api_key {
            self.anthropic_api_key.clone_from(v);
        }
        if let Some(v) = &file.camera_url {
            self.camera_url.clone_from(v);
        }
        if let Some(v) = &file.reasoning_model {
            self.reasoning_model.clone_from(v);
        }
        if let Some(v) = &file.vision_model {
            self.vision_model.clone_from(v);
        }
        if let Some(v) = &file.stt_model {
            self.stt_model.clone_from(v);
        }
        if let Some(v) = &file.tts_model {
            self.tts_model.clone_from(v);
        }
        if let Some(v) = &file.tts_voice {
            self.tts_voice.clone_from(v);
        }
        if let Some(v) = file.listen_window_secs {
            self.listen_window_secs = v;
        }
        if let Some(v) = file.classify_budget_secs {
            self.classify_budget_secs = v;
        }
        if let Some(v) = file.remote_classification {
            self.remote_classification = v;
        }
    }

    fn overlay_env(&mut self) {
        if let Ok(v) = std::env::var("LUMEN_USER_ID") {
            self.user_id = v;
        }
        if let Ok(v) = std::env::var("LUMEN_DATABASE_PATH") {
            self.database_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("LUMEN_OPENAI_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY")) {
            self.openai_api_key = v;
        }
        if let Ok(v) =
            std::env::var("LUMEN_ANTHROPIC_API_KEY").or_else(|_| std::env::var("ANTHROPIC_API_KEY"))
        {
            self.anthropic_api_key = v;
        }
        if let Ok(v) = std::env::var("LUMEN_CAMERA_URL") {
            self.camera_url = v;
        }
        if let Ok(v) = std::env::var("LUMEN_REASONING_MODEL") {
            self.reasoning_model = v;
        }
        if let Ok(v) = std::env::var("LUMEN_VISION_MODEL") {
            self.vision_model = v;
        }
        if let Ok(v) = std::env::var("LUMEN_REMOTE_CLASSIFICATION") {
            self.remote_classification = v != "0" && !v.eq_ignore_ascii_case("false");
        }
    }
}

/// Default config file path under the platform config directory
fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "lumen").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Default database path under the platform data directory
fn default_database_path() -> PathBuf {
    ProjectDirs::from("", "", "lumen")
        .map_or_else(|| PathBuf::from("lumen.db"), |dirs| dirs.data_dir().join("lumen.db"))
}
