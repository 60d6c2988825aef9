//! # Multi-Resolution Spectrum Module
//!
//! Short-time spectra of the waveform at every power-of-two window size the
//! candidate fundamentals call for, resampled onto the kernels' ERB axis.
//!
//! ## Features
//! - High-performance FFT using RustFFT, one planner shared by all window sizes
//! - Hann windowing with 50% overlap
//! - Square-root amplitude spectrum, truncated at the harmonic frequency cap
//! - Linear interpolation onto the ERB axis and per-frame norms

use rustfft::{FftPlanner, num_complex::Complex};

use crate::guard::{clamp_index, floor_eps};
use crate::kernel::KernelData;

/// log2 of the largest analysis window; 2^20 samples is about 24 s at 44.1 kHz.
pub const MAX_WINDOW_LOG2: i32 = 20;

/// Window size (in samples) best suited to a candidate fundamental.
///
/// A Hann window has a main-lobe half width of `k = 2` bins, so a window of
/// `4k / f0` seconds, i.e. `8 * sample_rate / f0` samples, resolves `f0`.
pub fn ideal_window_size(sample_rate: u32, fundamental: f32) -> f32 {
    8.0 * sample_rate as f32 / fundamental
}

/// Spectra of one window size.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumLevel {
    /// Window length in samples; the hop is half of it.
    pub window_size: usize,
    /// `frames[p][i]`: value of frame `p` at ERB bin `i`.
    pub frames: Vec<Vec<f32>>,
    /// Euclidean norm of each frame, floored at `EPS`.
    pub norms: Vec<f32>,
}

/// Spectra of the waveform at consecutive power-of-two window sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiResolutionSpectrum {
    /// log2 of the smallest window size.
    pub min_log2: i32,
    /// One level per window size, smallest first, each twice the previous.
    pub levels: Vec<SpectrumLevel>,
}

impl MultiResolutionSpectrum {
    /// Analyses a mono signal at every window size the kernels' candidates need.
    ///
    /// # Arguments
    /// * `signal` - Mono samples
    /// * `sample_rate` - Sample rate in Hz
    /// * `kernels` - Kernel data providing the candidates, harmonic cap and ERB axis
    pub fn analyze(signal: &[f32], sample_rate: u32, kernels: &KernelData) -> Self {
        let ideal_sizes: Vec<f32> = kernels
            .candidate_frequencies
            .iter()
            .map(|&f0| ideal_window_size(sample_rate, f0))
            .collect();
        let (min_log2, max_log2) = window_log2_range(&ideal_sizes);

        let mut planner = FftPlanner::new();
        let levels = (min_log2..=max_log2)
            .map(|log2| {
                let window_size = 1usize << log2;
                let spectra = sqrt_magnitude_frames(
                    &mut planner,
                    signal,
                    window_size,
                    sample_rate,
                    kernels.max_harmonic_frequency,
                );
                let frames: Vec<Vec<f32>> = spectra
                    .iter()
                    .map(|spectrum| {
                        resample_to_axis(spectrum, &kernels.frequency_axis, sample_rate, window_size)
                    })
                    .collect();
                let norms = frames.iter().map(|frame| frame_norm(frame)).collect();
                SpectrumLevel {
                    window_size,
                    frames,
                    norms,
                }
            })
            .collect::<Vec<_>>();

        log::debug!(
            "[SWIPE] Analysed {} samples at window sizes 2^{}..=2^{}",
            signal.len(),
            min_log2,
            max_log2
        );

        Self { min_log2, levels }
    }

    /// Position of the level whose window size is `2^log2`, clamped to the analysed range.
    pub fn level_index(&self, log2: i32) -> usize {
        clamp_index((log2 - self.min_log2) as i64, self.levels.len())
    }
}

/// Smallest and largest power-of-two exponent covering the ideal window sizes.
///
/// The lower exponent is at least 1 so every window has a non-zero hop.
pub fn window_log2_range(ideal_sizes: &[f32]) -> (i32, i32) {
    let min = ideal_sizes.iter().copied().fold(f32::INFINITY, f32::min);
    let max = ideal_sizes.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let min_log2 = (min.log2().floor() as i32).max(1);
    let max_log2 = (max.log2().ceil() as i32).max(min_log2);
    (min_log2, max_log2)
}

/// Creates a symmetric Hann window of `n` points.
pub fn hann_window(n: usize) -> Vec<f32> {
    if n <= 1 {
        return vec![1.0; n];
    }
    let n_minus_1 = (n - 1) as f32;
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n_minus_1).cos()))
        .collect()
}

/// Square-root magnitude spectra of half-overlapping Hann-windowed frames.
///
/// The signal is zero-padded by half a window on both ends so the first and
/// last frames are centred on the signal edges. Only full frames are taken.
/// Each spectrum keeps the bins up to `max_harmonic_frequency`.
pub fn sqrt_magnitude_frames(
    planner: &mut FftPlanner<f32>,
    signal: &[f32],
    window_size: usize,
    sample_rate: u32,
    max_harmonic_frequency: f32,
) -> Vec<Vec<f32>> {
    let half = window_size / 2;
    let hop = half.max(1);
    let window = hann_window(window_size);
    let fft = planner.plan_fft_forward(window_size);

    let mut padded = vec![0.0_f32; signal.len() + 2 * half];
    padded[half..half + signal.len()].copy_from_slice(signal);

    let magnitude_len = window_size / 2 + 1;
    let nyquist = sample_rate as f32 / 2.0;
    let kept_bins = ((magnitude_len as f32 * max_harmonic_frequency / nyquist).round() as usize)
        .clamp(1, magnitude_len);

    padded
        .windows(window_size)
        .step_by(hop)
        .map(|frame| {
            let mut buffer: Vec<Complex<f32>> = frame
                .iter()
                .zip(&window)
                .map(|(&sample, &w)| Complex { re: sample * w, im: 0.0 })
                .collect();
            fft.process(&mut buffer);
            buffer
                .iter()
                .take(kept_bins)
                // Rooted per FFT bin, ahead of the ERB interpolation.
                .map(|c| c.norm().sqrt()) // .norm() is sqrt(re^2 + im^2)
                .collect()
        })
        .collect()
}

/// Linearly interpolates an FFT-bin spectrum at the given frequencies.
///
/// Bin `k` of a `window_size`-point FFT sits at `k * sample_rate / window_size`
/// Hz. Positions past the last bin read the last bin.
pub fn resample_to_axis(
    spectrum: &[f32],
    frequency_axis: &[f32],
    sample_rate: u32,
    window_size: usize,
) -> Vec<f32> {
    let bin_width = sample_rate as f32 / window_size as f32;
    let last = spectrum.len().saturating_sub(1) as f32;

    frequency_axis
        .iter()
        .map(|&frequency| {
            let position = (frequency / bin_width).clamp(0.0, last);
            let lower = position.floor();
            let upper = position.ceil();
            let lower_value = spectrum[lower as usize];
            let upper_value = spectrum[upper as usize];
            lower_value + (upper_value - lower_value) * (position - lower)
        })
        .collect()
}

fn frame_norm(frame: &[f32]) -> f32 {
    floor_eps(frame.iter().map(|v| v * v).sum::<f32>().sqrt())
}
