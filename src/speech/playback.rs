//! Audio playback through the default output device
//!
//! Playback is blocking (cpal streams are not `Send`); the gateway wraps
//! [`Speaker::play_mp3`] in `spawn_blocking`.

use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::{Error, Result};

/// Plays synthesized speech on the default output device
#[derive(Clone, Copy)]
pub struct Speaker;

impl Speaker {
    /// Create a speaker, verifying an output device exists
    ///
    /// # Errors
    ///
    /// Returns error if no output device is available
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            "speaker ready"
        );

        Ok(Self)
    }

    /// Decode MP3 bytes and play them to completion, blocking
    ///
    /// # Errors
    ///
    /// Returns error if decoding fails or the output stream cannot be opened
    pub fn play_mp3(&self, data: &[u8]) -> Result<()> {
        let (samples, sample_rate, channels) = decode_mp3(data)?;
        play_samples(&samples, sample_rate, channels)
    }
}

/// Decode MP3 bytes into interleaved f32 samples
fn decode_mp3(data: &[u8]) -> Result<(Vec<f32>, u32, u16)> {
    let mut decoder = minimp3::Decoder::new(std::io::Cursor::new(data));
    let mut samples = Vec::new();
    let mut sample_rate = 0u32;
    let mut channels = 0u16;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                #[allow(clippy::cast_sign_loss)]
                {
                    sample_rate = frame.sample_rate as u32;
                }
                #[allow(clippy::cast_possible_truncation)]
                {
                    channels = frame.channels as u16;
                }
                samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    if samples.is_empty() || sample_rate == 0 {
        return Err(Error::Audio("no audio frames decoded".to_string()));
    }

    Ok((samples, sample_rate, channels.max(1)))
}

/// Play interleaved samples to completion on the default output device
fn play_samples(samples: &[f32], sample_rate: u32, channels: u16) -> Result<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device".to_string()))?;

    let config = cpal::StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let source: Vec<f32> = samples.to_vec();
    let mut position = 0usize;

    let stream = device
        .build_output_stream(
            &config,
            move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for sample in out.iter_mut() {
                    *sample = source.get(position).copied().unwrap_or(0.0);
                    position += 1;
                }
            },
            |err| {
                tracing::error!(error = %err, "audio playback error");
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;

    // Sleep for the clip duration plus a small tail
    #[allow(clippy::cast_precision_loss)]
    let secs = samples.len() as f64 / f64::from(sample_rate) / f64::from(channels);
    std::thread::sleep(Duration::from_secs_f64(secs + 0.2));

    drop(stream);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_mp3_rejects_garbage() {
        assert!(decode_mp3(&[0u8; 64]).is_err());
    }
}
