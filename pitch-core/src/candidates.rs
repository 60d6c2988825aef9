//! Candidate fundamental frequencies on a fractional-semitone grid.

use crate::scale::{frequency_from_semitone, semitone_from_frequency};

/// Builds the ordered candidate frequencies between two bounds.
///
/// Both bounds are rounded to the nearest whole semitone, then the range is
/// sampled `semitone_sample_num` times per semitone.
///
/// # Arguments
/// * `min_fundamental` - Lower bound in Hz
/// * `max_fundamental` - Upper bound in Hz
/// * `semitone_sample_num` - Candidates per semitone
///
/// # Returns
/// * `Some(candidates)` - Strictly increasing frequencies in Hz
/// * `None` - Zero samples per semitone, an inverted range, or a non-positive bound
pub fn candidate_frequencies(
    min_fundamental: f32,
    max_fundamental: f32,
    semitone_sample_num: u32,
) -> Option<Vec<f32>> {
    if semitone_sample_num < 1 || max_fundamental < min_fundamental {
        return None;
    }
    if !(min_fundamental > 0.0) || !max_fundamental.is_finite() {
        return None;
    }

    let start_semitone = semitone_from_frequency(min_fundamental).round_ties_even();
    let end_semitone = semitone_from_frequency(max_fundamental).round_ties_even();
    let step = 1.0 / semitone_sample_num as f32;
    let count = ((end_semitone - start_semitone) / step + 1.0).floor() as usize;

    Some(
        (0..count)
            .map(|i| frequency_from_semitone(start_semitone + i as f32 * step))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_is_strictly_increasing_and_bounded() {
        for &(min, max, n) in &[(40.0, 1000.0, 4), (130.0, 880.0, 8), (16.351, 8372.0, 16), (220.0, 220.0, 3)] {
            let grid = candidate_frequencies(min, max, n).unwrap();
            assert!(!grid.is_empty());
            assert!(grid.windows(2).all(|w| w[0] < w[1]), "not increasing for {min}..{max}");

            // Bounds are rounded to the nearest semitone, so allow half a semitone.
            let low = frequency_from_semitone(semitone_from_frequency(min) - 0.5) * 0.999;
            let high = frequency_from_semitone(semitone_from_frequency(max) + 0.5) * 1.001;
            assert!(grid.iter().all(|&f| f >= low && f <= high));
        }
    }

    #[test]
    fn test_grid_size() {
        // 40 Hz rounds to semitone 27, 1000 Hz to semitone 83.
        let grid = candidate_frequencies(40.0, 1000.0, 4).unwrap();
        assert_eq!(grid.len(), (83 - 27) * 4 + 1);

        let single = candidate_frequencies(440.0, 440.0, 8).unwrap();
        assert_eq!(single.len(), 1);
        assert!((single[0] - 440.0).abs() < 1e-3);
    }

    #[test]
    fn test_invalid_grid() {
        assert!(candidate_frequencies(40.0, 1000.0, 0).is_none());
        assert!(candidate_frequencies(40.0, 30.0, 4).is_none());
        assert!(candidate_frequencies(0.0, 30.0, 4).is_none());
    }
}
