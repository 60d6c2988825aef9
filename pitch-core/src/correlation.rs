//! Normalized correlation between each candidate's kernel and the spectra.

use crate::guard::{clamp_index, safe_div};
use crate::kernel::KernelData;
use crate::spectrum::{MultiResolutionSpectrum, SpectrumLevel, ideal_window_size};

/// Scores every candidate against every frame.
///
/// Each candidate is scored at the window size just below its ideal size
/// and, when the ideal size is not a power of two, blended with the next
/// larger one by the fractional part of `log2(ideal)`. Rows are upsampled to
/// the frame rate of the smallest analysed window and cut to a common length.
///
/// # Returns
/// * `matrix[candidate][frame]` correlation values
pub fn correlation_matrix(
    kernels: &KernelData,
    spectrum: &MultiResolutionSpectrum,
    sample_rate: u32,
) -> Vec<Vec<f32>> {
    let rows: Vec<Vec<f32>> = upsampled_rows(kernels, spectrum, sample_rate)
        .into_iter()
        .map(|(_, row)| row)
        .collect();

    let length = rows.iter().map(Vec::len).min().unwrap_or(0);
    rows.into_iter()
        .map(|mut row| {
            row.truncate(length);
            row
        })
        .collect()
}

/// Blended score rows of every candidate, each tagged with its level.
///
/// A row from level `l` has every value repeated `2^l` times, so all rows
/// run at the frame rate of level 0 but may differ in length.
fn upsampled_rows(
    kernels: &KernelData,
    spectrum: &MultiResolutionSpectrum,
    sample_rate: u32,
) -> Vec<(usize, Vec<f32>)> {
    kernels
        .candidate_frequencies
        .iter()
        .enumerate()
        .map(|(candidate, &f0)| {
            let weighted = weighted_kernel(&kernels.kernels[candidate], &kernels.frequency_axis);
            let norm = kernels.kernel_norms[candidate];

            let best_log2 = ideal_window_size(sample_rate, f0).log2();
            let int_log2 = best_log2.floor();
            let fraction = best_log2 - int_log2;
            let level = spectrum.level_index(int_log2 as i32);

            let primary = correlate_level(&weighted, norm, &spectrum.levels[level]);
            let blended = match spectrum.levels.get(level + 1) {
                Some(next) if fraction > 0.0 => {
                    let secondary = correlate_level(&weighted, norm, next);
                    blend(&primary, &secondary, fraction)
                }
                _ => primary,
            };

            (level, repeat_each(&blended, 1 << level))
        })
        .collect()
}

/// Kernel divided by the square root of each bin frequency; 0 Hz bins are zeroed.
fn weighted_kernel(kernel: &[f32], frequency_axis: &[f32]) -> Vec<f32> {
    kernel
        .iter()
        .zip(frequency_axis)
        .map(|(&k, &f)| safe_div(k, f.sqrt()))
        .collect()
}

fn correlate_level(weighted_kernel: &[f32], kernel_norm: f32, level: &SpectrumLevel) -> Vec<f32> {
    level
        .frames
        .iter()
        .zip(&level.norms)
        .map(|(frame, &frame_norm)| {
            let dot: f32 = frame.iter().zip(weighted_kernel).map(|(s, k)| s * k).sum();
            dot / kernel_norm / frame_norm
        })
        .collect()
}

/// Linear blend with a series at half the frame rate.
fn blend(primary: &[f32], secondary: &[f32], fraction: f32) -> Vec<f32> {
    primary
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let other = secondary[clamp_index((i / 2) as i64, secondary.len())];
            value * (1.0 - fraction) + other * fraction
        })
        .collect()
}

fn repeat_each(series: &[f32], times: usize) -> Vec<f32> {
    series
        .iter()
        .flat_map(|&value| std::iter::repeat_n(value, times))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FundamentalConfig;

    #[test]
    fn test_blend_aligns_half_rate_series() {
        let blended = blend(&[1.0, 1.0, 1.0, 1.0, 1.0], &[0.0, 2.0, 4.0], 0.25);
        assert_eq!(blended, vec![0.75, 0.75, 1.25, 1.25, 1.75]);
    }

    #[test]
    fn test_repeat_each() {
        assert_eq!(repeat_each(&[1.0, 2.0], 3), vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
        assert_eq!(repeat_each(&[1.0], 1), vec![1.0]);
    }

    #[test]
    fn test_weighted_kernel_skips_zero_frequency() {
        let weighted = weighted_kernel(&[3.0, 2.0, 1.0], &[0.0, 4.0, 16.0]);
        assert_eq!(weighted, vec![0.0, 1.0, 0.25]);
    }

    const SAMPLE_RATE: u32 = 16000;
    const SIGNAL_LEN: usize = 8000;

    fn analysed_sine() -> (KernelData, MultiResolutionSpectrum) {
        let config = FundamentalConfig {
            min_fundamental: 100.0,
            max_fundamental: 400.0,
            semitone_sample_num: 2,
            erbs_step: 0.2,
            max_harmonic_frequency: 2000.0,
        };
        let kernels = KernelData::build(&config, SAMPLE_RATE).unwrap();
        let signal: Vec<f32> = (0..SIGNAL_LEN)
            .map(|i| (2.0 * std::f32::consts::PI * 200.0 * i as f32 / SAMPLE_RATE as f32).sin())
            .collect();
        let spectrum = MultiResolutionSpectrum::analyze(&signal, SAMPLE_RATE, &kernels);
        (kernels, spectrum)
    }

    #[test]
    fn test_rows_run_at_smallest_window_rate() {
        let (kernels, spectrum) = analysed_sine();
        let smallest_window = spectrum.levels[0].window_size;
        let base_frames = SIGNAL_LEN / (smallest_window / 2) + 1;

        let rows = upsampled_rows(&kernels, &spectrum, SAMPLE_RATE);
        // 100..400 Hz at 16 kHz spans windows 2^8..=2^11.
        assert!(rows.iter().any(|&(level, _)| level > 0));
        for (level, row) in &rows {
            let repeat = 1usize << level;
            assert_eq!(row.len(), spectrum.levels[*level].frames.len() * repeat);
            assert!(
                row.len() >= base_frames && row.len() < base_frames + repeat,
                "Level {} row has {} frames, expected about {}",
                level,
                row.len(),
                base_frames
            );
            assert!(row.chunks(repeat).all(|run| run.iter().all(|&v| v == run[0])));
        }

        let matrix = correlation_matrix(&kernels, &spectrum, SAMPLE_RATE);
        assert!(matrix.iter().all(|row| row.len() == base_frames));
    }

    #[test]
    fn test_matrix_shape_and_bounds() {
        let (kernels, spectrum) = analysed_sine();
        let matrix = correlation_matrix(&kernels, &spectrum, SAMPLE_RATE);

        assert_eq!(matrix.len(), kernels.candidate_count());
        let length = matrix[0].len();
        assert!(length > 0);
        assert!(matrix.iter().all(|row| row.len() == length));
        // Cauchy-Schwarz: a normalized correlation never exceeds 1.
        assert!(matrix.iter().flatten().all(|&c| c.is_finite() && c <= 1.0 + 1e-4));
    }
}
