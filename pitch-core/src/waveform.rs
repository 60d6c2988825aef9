//! # Waveform Module
//!
//! The sampled audio handed to the estimator by the audio loader: one or
//! more channels of equal length plus a sample rate.

use anyhow::{Result, anyhow, bail};

/// Default chunk length used when a long sample is analysed piecewise
/// (ten seconds at 44.1 kHz).
pub const DEFAULT_MAX_CHUNK_LEN: usize = 441_000;

/// Multi-channel audio with a sample rate.
///
/// Construction checks the caller contract once, so the analysis stages can
/// rely on at least one non-empty channel, equal channel lengths and a
/// positive sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl Waveform {
    /// Creates a waveform from per-channel sample buffers.
    ///
    /// # Arguments
    /// * `channels` - Sample buffers, one per channel
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Returns
    /// * `Ok(waveform)` - Validated waveform
    /// * `Err(e)` - No channels, empty or mismatched channels, or a zero sample rate
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            bail!("Sample rate must be positive");
        }
        let length = channels
            .first()
            .map(Vec::len)
            .ok_or_else(|| anyhow!("Waveform needs at least one channel"))?;
        if length == 0 {
            bail!("Waveform channels must not be empty");
        }
        if let Some(index) = channels.iter().position(|c| c.len() != length) {
            bail!(
                "Channel {} has {} samples, expected {}",
                index,
                channels[index].len(),
                length
            );
        }
        Ok(Self { channels, sample_rate })
    }

    /// Creates a single-channel waveform.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::new(vec![samples], sample_rate)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Averages all channels into one buffer.
    pub fn mix_to_mono(&self) -> Vec<f32> {
        if let [only] = self.channels.as_slice() {
            return only.clone();
        }
        let channel_count = self.channels.len() as f32;
        (0..self.len())
            .map(|i| self.channels.iter().map(|c| c[i]).sum::<f32>() / channel_count)
            .collect()
    }

    /// Splits the waveform into consecutive chunks of at most `max_len` samples.
    ///
    /// Long recordings are analysed chunk by chunk to bound the memory of the
    /// multi-resolution spectra. A `max_len` of zero yields the whole
    /// waveform as one chunk.
    pub fn chunks(&self, max_len: usize) -> Vec<Waveform> {
        if max_len == 0 || self.len() <= max_len {
            return vec![self.clone()];
        }
        (0..self.len())
            .step_by(max_len)
            .map(|start| {
                let end = (start + max_len).min(self.len());
                Waveform {
                    channels: self.channels.iter().map(|c| c[start..end].to_vec()).collect(),
                    sample_rate: self.sample_rate,
                }
            })
            .collect()
    }
}
