//! # Harmonic Kernel Module
//!
//! Builds the SWIPE' harmonic kernels: one weighting template per candidate
//! fundamental, laid out on an ERB-spaced frequency axis.
//!
//! Each kernel places a cosine lobe on the fundamental and on every prime
//! harmonic up to the harmonic frequency cap. The lobe is full weight within
//! a quarter of the fundamental around the harmonic and half weight in the
//! flanks out to three quarters, so the negative half-periods between
//! harmonics penalise energy that does not belong to the candidate.
//!
//! Reference: Camacho, A. & Harris, J. G. (2008). A sawtooth waveform
//! inspired pitch estimator for speech and music. *JASA* 124(3), 1638–1652.

use std::f32::consts::PI;

use crate::candidates::candidate_frequencies;
use crate::config::FundamentalConfig;
use crate::guard::{clamp_index, floor_eps};
use crate::scale::{erb_from_frequency, frequency_from_erb};
use crate::spectrum::{MAX_WINDOW_LOG2, ideal_window_size};

/// Kernels and the axes they were built on.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelData {
    /// Candidate fundamental frequencies in Hz, strictly increasing.
    pub candidate_frequencies: Vec<f32>,
    /// Effective harmonic cap in Hz (never above Nyquist).
    pub max_harmonic_frequency: f32,
    /// ERB-spaced frequency bins in Hz; the first bin is 0 Hz.
    pub frequency_axis: Vec<f32>,
    /// One kernel per candidate, each `frequency_axis.len()` long.
    pub kernels: Vec<Vec<f32>>,
    /// Frequency-weighted norm of each kernel, floored at `EPS`.
    pub kernel_norms: Vec<f32>,
}

impl KernelData {
    /// Builds the kernels for a configuration and sample rate.
    ///
    /// # Returns
    /// * `Some(data)` - Kernels for every candidate
    /// * `None` - The configuration cannot produce a candidate grid or ERB axis,
    ///   or its lowest candidate needs a window above `2^MAX_WINDOW_LOG2` samples
    pub fn build(config: &FundamentalConfig, sample_rate: u32) -> Option<Self> {
        let candidate_frequencies = candidate_frequencies(
            config.min_fundamental,
            config.max_fundamental,
            config.semitone_sample_num,
        )?;
        if !(config.erbs_step > 0.0) || !config.erbs_step.is_finite() {
            return None;
        }
        let lowest = *candidate_frequencies.first()?;
        let window_log2 = ideal_window_size(sample_rate, lowest).log2().ceil();
        if !(window_log2 <= MAX_WINDOW_LOG2 as f32) {
            log::warn!(
                "[KERNEL] Lowest candidate {} Hz needs a 2^{} sample window, limit is 2^{}",
                lowest,
                window_log2,
                MAX_WINDOW_LOG2
            );
            return None;
        }

        let max_harmonic_frequency = config.max_harmonic_frequency.min(sample_rate as f32 / 2.0);
        let axis = ErbAxis::new(max_harmonic_frequency, config.erbs_step);

        let kernels: Vec<Vec<f32>> = candidate_frequencies
            .iter()
            .map(|&f0| harmonic_kernel(f0, max_harmonic_frequency, &axis))
            .collect();
        let kernel_norms = kernels
            .iter()
            .map(|kernel| kernel_norm(kernel, &axis.frequencies))
            .collect();

        log::debug!(
            "[KERNEL] Built {} kernels over {} ERB bins (max harmonic {:.1} Hz)",
            kernels.len(),
            axis.frequencies.len(),
            max_harmonic_frequency
        );

        Some(Self {
            candidate_frequencies,
            max_harmonic_frequency,
            frequency_axis: axis.frequencies,
            kernels,
            kernel_norms,
        })
    }

    pub fn candidate_count(&self) -> usize {
        self.candidate_frequencies.len()
    }
}

/// ERB-spaced frequency axis with its bin lookup.
struct ErbAxis {
    step: f32,
    frequencies: Vec<f32>,
}

impl ErbAxis {
    fn new(max_frequency: f32, step: f32) -> Self {
        let length = ((erb_from_frequency(max_frequency) / step).ceil() as usize).max(1);
        let frequencies = (0..length)
            .map(|i| frequency_from_erb(step * i as f32))
            .collect();
        Self { step, frequencies }
    }

    /// Bin index of `frequency`; the upper variant rounds one bin up.
    fn index_of(&self, frequency: f32, upper: bool) -> usize {
        let position = erb_from_frequency(frequency) / self.step;
        let index = if upper { position + 1.0 } else { position };
        clamp_index(index as i64, self.frequencies.len())
    }
}

/// Harmonic numbers used by a kernel: 1 followed by the primes up to `limit`.
pub fn harmonic_numbers(limit: usize) -> Vec<usize> {
    std::iter::once(1)
        .chain((2..=limit).filter(|&n| is_prime(n)))
        .collect()
}

fn is_prime(n: usize) -> bool {
    n >= 2 && (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
}

fn harmonic_kernel(f0: f32, max_harmonic_frequency: f32, axis: &ErbAxis) -> Vec<f32> {
    let limit = (max_harmonic_frequency / f0).ceil().max(0.0) as usize;
    let mut kernel = vec![0.0_f32; axis.frequencies.len()];

    for harmonic in harmonic_numbers(limit) {
        let center = f0 * harmonic as f32;
        let start = axis.index_of(center - 0.75 * f0, false);
        let inner_start = axis.index_of(center - 0.25 * f0, true);
        let inner_end = axis.index_of(center + 0.25 * f0, true);
        let end = axis.index_of(center + 0.75 * f0, true);

        for (weight, range) in [
            (0.5, start..inner_start),
            (1.0, inner_start..inner_end),
            (0.5, inner_end..end),
        ] {
            for i in range {
                kernel[i] += weight * (2.0 * PI * axis.frequencies[i] / f0).cos();
            }
        }
    }

    kernel
}

/// Norm of a kernel with each squared value divided by its bin frequency.
fn kernel_norm(kernel: &[f32], frequency_axis: &[f32]) -> f32 {
    let energy: f32 = kernel
        .iter()
        .zip(frequency_axis)
        .filter(|&(_, &f)| f != 0.0)
        .map(|(&k, &f)| k * k / f)
        .sum();
    floor_eps(energy.sqrt())
}
