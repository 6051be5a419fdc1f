//! Microphone capture with utterance endpointing
//!
//! Capture runs blocking on a dedicated thread (cpal streams are not `Send`);
//! the gateway wraps [`Microphone::record`] in `spawn_blocking`.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleRate;

use crate::{Error, Result};

/// Sample rate for capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// RMS energy above which a chunk counts as speech
const SPEECH_RMS_THRESHOLD: f32 = 0.01;

/// Trailing silence that ends an utterance
const TRAILING_SILENCE: Duration = Duration::from_millis(800);

/// Hard cap on a single utterance
const MAX_UTTERANCE: Duration = Duration::from_secs(10);

/// Poll interval while capturing
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Records single utterances from the default input device
#[derive(Clone, Copy)]
pub struct Microphone;

impl Microphone {
    /// Create a microphone, verifying an input device exists
    ///
    /// # Errors
    ///
    /// Returns error if no suitable input device is available
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "microphone ready"
        );

        Ok(Self)
    }

    /// Record one utterance, blocking
    ///
    /// Waits up to `timeout` for speech to start; `None` if only silence was
    /// heard. Once speech starts, recording ends after [`TRAILING_SILENCE`]
    /// of quiet or [`MAX_UTTERANCE`] overall.
    ///
    /// # Errors
    ///
    /// Returns error if the audio stream cannot be opened
    pub fn record(&self, timeout: Duration) -> Result<Option<Vec<f32>>> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device".to_string()))?;

        let supported = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable input config found".to_string()))?;

        let config = supported.with_sample_rate(SampleRate(SAMPLE_RATE)).config();

        let buffer: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));
        let writer = Arc::clone(&buffer);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = writer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        let mut utterance: Vec<f32> = Vec::new();
        let mut speech_started: Option<Instant> = None;
        let mut last_speech = Instant::now();
        let wait_start = Instant::now();

        loop {
            std::thread::sleep(POLL_INTERVAL);

            let chunk = buffer
                .lock()
                .map(|mut buf| std::mem::take(&mut *buf))
                .unwrap_or_default();

            let voiced = rms(&chunk) > SPEECH_RMS_THRESHOLD;

            match speech_started {
                None => {
                    if voiced {
                        speech_started = Some(Instant::now());
                        last_speech = Instant::now();
                        utterance.extend_from_slice(&chunk);
                    } else if wait_start.elapsed() >= timeout {
                        // Silence only: no command this iteration
                        drop(stream);
                        return Ok(None);
                    }
                }
                Some(started) => {
                    utterance.extend_from_slice(&chunk);
                    if voiced {
                        last_speech = Instant::now();
                    }

                    if last_speech.elapsed() >= TRAILING_SILENCE
                        || started.elapsed() >= MAX_UTTERANCE
                    {
                        break;
                    }
                }
            }
        }

        drop(stream);
        tracing::debug!(samples = utterance.len(), "utterance captured");
        Ok(Some(utterance))
    }
}

/// RMS energy of a sample chunk
fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    mean.sqrt()
}

/// Convert f32 samples to WAV bytes for the transcription API
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_silence_is_zero() {
        assert!(rms(&[]) < f32::EPSILON);
        assert!(rms(&[0.0; 1600]) < SPEECH_RMS_THRESHOLD);
    }

    #[test]
    fn test_rms_tone_exceeds_threshold() {
        let tone: Vec<f32> = (0..1600)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f32 / SAMPLE_RATE as f32;
                0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
            })
            .collect();
        assert!(rms(&tone) > SPEECH_RMS_THRESHOLD);
    }

    #[test]
    fn test_samples_to_wav_header() {
        let wav = samples_to_wav(&[0.0, 0.5, -0.5], SAMPLE_RATE).unwrap();
        assert_eq!(&wav[..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
    }
}
