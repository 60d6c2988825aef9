//! # Scale Conversions Module
//!
//! Conversions between linear frequency (Hz), the equal-tempered semitone
//! scale and the ERB-rate scale used to space the analysis bins.
//!
//! ## Features
//! - Semitone scale with A4 = 440 Hz = semitone 69 (MIDI numbering)
//! - ERB-rate scale: `21.4 * log10(1 + f / 229)`
//! - Nearest note lookup for labelling semitone reference lines
//! - Cent deviation between two frequencies

use once_cell::sync::Lazy;

use crate::guard::clamp_index;

/// Converts a frequency in Hz to a (fractional) semitone number.
pub fn semitone_from_frequency(frequency: f32) -> f32 {
    12.0 * (frequency / 440.0).log2() + 69.0
}

/// Converts a (fractional) semitone number to a frequency in Hz.
pub fn frequency_from_semitone(semitone: f32) -> f32 {
    440.0 * 2.0_f32.powf((semitone - 69.0) / 12.0)
}

/// Converts a frequency in Hz to the ERB-rate scale.
pub fn erb_from_frequency(frequency: f32) -> f32 {
    21.4 * (1.0 + frequency / 229.0).log10()
}

/// Converts an ERB-rate value back to a frequency in Hz.
pub fn frequency_from_erb(erbs: f32) -> f32 {
    229.0 * (10.0_f32.powf(erbs / 21.4) - 1.0)
}

/// A single equal-tempered note.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Note name (e.g., "A4", "C#3")
    pub name: String,
    /// Semitone number, 69 being A4
    pub semitone: u8,
    /// Frequency in Hz
    pub frequency: f32,
}

/// Every note of the MIDI range (C-1 to G9), computed once on first use.
static NOTES: Lazy<Vec<Note>> = Lazy::new(|| {
    const NOTE_NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    (0..=127u8)
        .map(|semitone| {
            // The octave number changes at C; semitone 0 is C-1.
            let octave = semitone as i32 / 12 - 1;
            Note {
                name: format!("{}{}", NOTE_NAMES[semitone as usize % 12], octave),
                semitone,
                frequency: frequency_from_semitone(semitone as f32),
            }
        })
        .collect()
});

/// Finds the equal-tempered note closest to `frequency`.
///
/// Frequencies outside the MIDI range map to the lowest or highest note.
///
/// # Arguments
/// * `frequency` - Input frequency in Hz
///
/// # Returns
/// * The closest note from the static table
pub fn nearest_note(frequency: f32) -> &'static Note {
    let semitone = semitone_from_frequency(frequency).round();
    // NaN (non-positive input) casts to 0.
    &NOTES[clamp_index(semitone as i64, NOTES.len())]
}

/// Deviation of `frequency` from `target` in cents (positive = sharp).
pub fn cents_between(frequency: f32, target: f32) -> f32 {
    1200.0 * (frequency / target).log2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_semitone_round_trip() {
        for &f in &[16.351_f32, 40.0, 130.0, 220.0, 440.0, 987.77, 8372.0] {
            let back = frequency_from_semitone(semitone_from_frequency(f));
            assert_relative_eq!(back, f, max_relative = 1e-3);
        }
    }

    #[test]
    fn test_erb_round_trip() {
        for &f in &[1.0_f32, 50.0, 229.0, 1000.0, 5000.0, 22050.0] {
            let back = frequency_from_erb(erb_from_frequency(f));
            assert_relative_eq!(back, f, max_relative = 1e-3);
        }
    }

    #[test]
    fn test_reference_points() {
        assert_relative_eq!(semitone_from_frequency(440.0), 69.0);
        assert_relative_eq!(frequency_from_semitone(81.0), 880.0, max_relative = 1e-5);
        assert_eq!(erb_from_frequency(0.0), 0.0);
        assert_eq!(frequency_from_erb(0.0), 0.0);
    }

    #[test]
    fn test_nearest_note() {
        assert_eq!(nearest_note(440.0).name, "A4");
        assert_eq!(nearest_note(261.0).name, "C4");
        assert_eq!(nearest_note(227.0).name, "A#3");
        assert_eq!(nearest_note(1.0).name, "C-1");
        assert_eq!(nearest_note(0.0).semitone, 0);
        assert_eq!(nearest_note(1.0e6).name, "G9");
    }

    #[test]
    fn test_cents_between() {
        assert_relative_eq!(cents_between(880.0, 440.0), 1200.0);
        assert!(cents_between(430.0, 440.0) < 0.0);
    }
}
