//! Speech collaborator
//!
//! Voice input and spoken output. The orchestration core consumes the
//! [`Speech`] trait; [`VoiceGateway`] is the production implementation
//! combining microphone capture, Whisper transcription, speech synthesis
//! and playback.

pub mod capture;
pub mod playback;
pub mod stt;
pub mod tts;

use std::time::Duration;

use async_trait::async_trait;

use crate::{Error, Result};

pub use capture::{samples_to_wav, Microphone, SAMPLE_RATE};
pub use playback::Speaker;
pub use stt::SpeechToText;
pub use tts::TextToSpeech;

/// Budget for synthesizing one utterance
const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(15);

/// Contract for the speech collaborator
///
/// Both operations are bounded: `listen` by its window, `say` by the
/// synthesis budget plus the clip length.
#[async_trait]
pub trait Speech: Send + Sync {
    /// Listen for one command; `None` when the window passes in silence
    async fn listen(&self, timeout: Duration) -> Result<Option<String>>;

    /// Speak a message aloud
    async fn say(&self, text: &str) -> Result<()>;
}

/// Production speech pipeline over the default audio devices
pub struct VoiceGateway {
    mic: Microphone,
    speaker: Speaker,
    stt: SpeechToText,
    tts: TextToSpeech,
}

impl VoiceGateway {
    /// Create a gateway, verifying audio devices exist
    ///
    /// # Errors
    ///
    /// Returns error if input or output devices are unavailable
    pub fn new(stt: SpeechToText, tts: TextToSpeech) -> Result<Self> {
        Ok(Self {
            mic: Microphone::open()?,
            speaker: Speaker::open()?,
            stt,
            tts,
        })
    }
}

#[async_trait]
impl Speech for VoiceGateway {
    async fn listen(&self, timeout: Duration) -> Result<Option<String>> {
        let mic = self.mic;
        let samples = tokio::task::spawn_blocking(move || mic.record(timeout))
            .await
            .map_err(|e| Error::Audio(format!("capture task failed: {e}")))??;

        let Some(samples) = samples else {
            return Ok(None);
        };

        let wav = samples_to_wav(&samples, SAMPLE_RATE)?;
        let transcript = self.stt.transcribe(wav).await?;

        if transcript.is_empty() {
            return Ok(None);
        }

        Ok(Some(transcript))
    }

    async fn say(&self, text: &str) -> Result<()> {
        tracing::info!(text = %text, "speaking");

        let audio = tokio::time::timeout(SYNTHESIS_TIMEOUT, self.tts.synthesize(text))
            .await
            .map_err(|_| Error::Tts("synthesis timed out".to_string()))??;

        let speaker = self.speaker;
        tokio::task::spawn_blocking(move || speaker.play_mp3(&audio))
            .await
            .map_err(|e| Error::Audio(format!("playback task failed: {e}")))??;

        Ok(())
    }
}
