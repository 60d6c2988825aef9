//! # Pitch Estimation Module
//!
//! Entry point of the SWIPE' pitch tracker: turns a waveform into a
//! per-frame fundamental-frequency curve and a matching confidence curve.
//!
//! ## Pipeline
//! 1. Candidate grid and harmonic kernels, taken from a shared [`KernelCache`]
//! 2. Square-root amplitude spectra at several power-of-two window sizes
//! 3. Normalized kernel/spectrum correlation per candidate and frame
//! 4. Per-frame selection of the best-scoring candidate
//!
//! Frames are spaced by half the smallest analysed window. The engine is
//! synchronous and spawns no threads; run it off latency-sensitive threads.

use std::sync::Arc;

use crate::cache::KernelCache;
use crate::config::FundamentalConfig;
use crate::correlation::correlation_matrix;
use crate::spectrum::MultiResolutionSpectrum;
use crate::waveform::Waveform;

/// Estimated fundamental frequency and confidence, one entry per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Fundamental {
    freq: Vec<f32>,
    corr: Vec<f32>,
}

impl Fundamental {
    /// Single-frame result used when no kernels can be built.
    pub fn fallback(min_fundamental: f32) -> Self {
        Self {
            freq: vec![min_fundamental],
            corr: vec![0.0],
        }
    }

    /// Frequency of each frame in Hz.
    pub fn freq(&self) -> &[f32] {
        &self.freq
    }

    /// Correlation score of each frame; at most 1.
    pub fn corr(&self) -> &[f32] {
        &self.corr
    }

    pub fn len(&self) -> usize {
        self.freq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freq.is_empty()
    }
}

/// Picks the best-scoring candidate of every frame.
///
/// Ties go to the lowest candidate.
///
/// # Arguments
/// * `candidates` - Candidate frequencies in Hz
/// * `matrix` - `matrix[candidate][frame]` scores, rows of equal length
pub fn pick(candidates: &[f32], matrix: &[Vec<f32>]) -> Fundamental {
    let length = matrix.iter().map(Vec::len).min().unwrap_or(0);

    let (freq, corr) = (0..length)
        .map(|frame| {
            let (best, score) = matrix.iter().enumerate().skip(1).fold(
                (0, matrix[0][frame]),
                |(best, score), (candidate, row)| {
                    if row[frame] > score {
                        (candidate, row[frame])
                    } else {
                        (best, score)
                    }
                },
            );
            (candidates[best], score)
        })
        .unzip();

    Fundamental { freq, corr }
}

/// Estimates the fundamental frequency curve of a waveform.
///
/// A configuration that cannot produce kernels (no samples per semitone, an
/// inverted range, a fundamental too low for the largest window) yields
/// [`Fundamental::fallback`] instead of an error.
///
/// # Arguments
/// * `waveform` - Input audio; channels are averaged to mono
/// * `config` - Estimator configuration
/// * `cache` - Kernel cache shared between calls
pub fn estimate_fundamental(
    waveform: &Waveform,
    config: &FundamentalConfig,
    cache: &KernelCache,
) -> Fundamental {
    let sample_rate = waveform.sample_rate();
    let Some(kernels) = cache.get_kernel(config, sample_rate) else {
        log::warn!(
            "[SWIPE] No kernels for {:?}, returning fallback curve",
            config
        );
        return Fundamental::fallback(config.min_fundamental);
    };

    let signal = waveform.mix_to_mono();
    let spectrum = MultiResolutionSpectrum::analyze(&signal, sample_rate, &kernels);
    let matrix = correlation_matrix(&kernels, &spectrum, sample_rate);
    let fundamental = pick(&kernels.candidate_frequencies, &matrix);

    log::debug!(
        "[SWIPE] Estimated {} frames from {} samples over {} candidates",
        fundamental.len(),
        signal.len(),
        kernels.candidate_count()
    );
    fundamental
}

/// Pitch estimator holding an injected kernel cache.
#[derive(Debug, Clone, Default)]
pub struct FundamentalEstimator {
    cache: Arc<KernelCache>,
}

impl FundamentalEstimator {
    /// Creates an estimator with its own, empty kernel cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an estimator that shares `cache` with other users.
    pub fn with_cache(cache: Arc<KernelCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<KernelCache> {
        &self.cache
    }

    pub fn estimate(&self, waveform: &Waveform, config: &FundamentalConfig) -> Fundamental {
        estimate_fundamental(waveform, config, &self.cache)
    }

    /// Estimates a long waveform chunk by chunk.
    ///
    /// # Returns
    /// * One curve per chunk of at most `max_chunk_len` samples, in order
    pub fn estimate_chunked(
        &self,
        waveform: &Waveform,
        config: &FundamentalConfig,
        max_chunk_len: usize,
    ) -> Vec<Fundamental> {
        waveform
            .chunks(max_chunk_len)
            .iter()
            .map(|chunk| self.estimate(chunk, config))
            .collect()
    }
}
