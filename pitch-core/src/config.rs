//! # Fundamental Configuration
//!
//! The settings block that drives the pitch tracker, with the defaults and
//! bounds used by the editor's preference page.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest fundamental the editor accepts (C0).
pub const MIN_FUNDAMENTAL: f32 = 16.351;
/// Highest fundamental the editor accepts (C9).
pub const MAX_FUNDAMENTAL: f32 = 8372.0;
/// Upper bound for `semitone_sample_num`.
pub const MAX_SEMITONE_SAMPLE_NUM: u32 = 16;
/// Upper bound for `max_harmonic_frequency`.
pub const MAX_MAX_HARMONIC_FREQUENCY: f32 = 22050.0;

/// Configuration of the fundamental-frequency estimator.
///
/// Every field has a default, so a partial JSON object deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FundamentalConfig {
    /// Lowest candidate fundamental in Hz.
    pub min_fundamental: f32,
    /// Highest candidate fundamental in Hz.
    pub max_fundamental: f32,
    /// Number of candidates per semitone.
    pub semitone_sample_num: u32,
    /// Resolution of the ERB frequency axis.
    pub erbs_step: f32,
    /// Highest harmonic frequency taken into account, in Hz.
    pub max_harmonic_frequency: f32,
}

impl Default for FundamentalConfig {
    fn default() -> Self {
        Self {
            min_fundamental: 130.0, // C3
            max_fundamental: 880.0, // A5
            semitone_sample_num: 8,
            erbs_step: 0.1,
            max_harmonic_frequency: 5000.0,
        }
    }
}

/// A rule of the preference page that a configuration breaks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigIssue {
    #[error("minimum fundamental {min} Hz must be below maximum fundamental {max} Hz")]
    InvertedRange { min: f32, max: f32 },
    #[error("fundamental {0} Hz is outside [{min}, {max}] Hz", min = MIN_FUNDAMENTAL, max = MAX_FUNDAMENTAL)]
    FundamentalOutOfRange(f32),
    #[error("semitone sample number {0} is outside [1, {max}]", max = MAX_SEMITONE_SAMPLE_NUM)]
    SemitoneSampleNumOutOfRange(u32),
    #[error("max harmonic frequency {harmonic} Hz must be at least max fundamental {fundamental} Hz")]
    HarmonicBelowFundamental { harmonic: f32, fundamental: f32 },
    #[error("max harmonic frequency {0} Hz exceeds {max} Hz", max = MAX_MAX_HARMONIC_FREQUENCY)]
    HarmonicTooHigh(f32),
    #[error("ERB step {0} must be positive")]
    NonPositiveErbsStep(f32),
}

impl FundamentalConfig {
    /// Checks the configuration against the preference-page rules.
    ///
    /// The estimator does not call this: it degrades to a fallback curve on
    /// a configuration it cannot build kernels for. This is for settings
    /// screens and loaders that want to report problems.
    ///
    /// # Returns
    /// * Every broken rule, empty when the configuration is valid
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if !(self.min_fundamental < self.max_fundamental) {
            issues.push(ConfigIssue::InvertedRange {
                min: self.min_fundamental,
                max: self.max_fundamental,
            });
        }
        for bound in [self.min_fundamental, self.max_fundamental] {
            if !(MIN_FUNDAMENTAL..=MAX_FUNDAMENTAL).contains(&bound) {
                issues.push(ConfigIssue::FundamentalOutOfRange(bound));
            }
        }
        if !(1..=MAX_SEMITONE_SAMPLE_NUM).contains(&self.semitone_sample_num) {
            issues.push(ConfigIssue::SemitoneSampleNumOutOfRange(self.semitone_sample_num));
        }
        if !(self.max_harmonic_frequency >= self.max_fundamental) {
            issues.push(ConfigIssue::HarmonicBelowFundamental {
                harmonic: self.max_harmonic_frequency,
                fundamental: self.max_fundamental,
            });
        }
        if self.max_harmonic_frequency > MAX_MAX_HARMONIC_FREQUENCY {
            issues.push(ConfigIssue::HarmonicTooHigh(self.max_harmonic_frequency));
        }
        if !(self.erbs_step > 0.0) {
            issues.push(ConfigIssue::NonPositiveErbsStep(self.erbs_step));
        }

        issues
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(FundamentalConfig::default().is_valid());
    }

    #[test]
    fn test_validate_reports_each_rule() {
        let config = FundamentalConfig {
            min_fundamental: 900.0,
            max_fundamental: 10000.0,
            semitone_sample_num: 0,
            erbs_step: 0.0,
            max_harmonic_frequency: 30000.0,
        };
        let issues = config.validate();
        assert!(issues.contains(&ConfigIssue::FundamentalOutOfRange(10000.0)));
        assert!(issues.contains(&ConfigIssue::SemitoneSampleNumOutOfRange(0)));
        assert!(issues.contains(&ConfigIssue::HarmonicTooHigh(30000.0)));
        assert!(issues.contains(&ConfigIssue::NonPositiveErbsStep(0.0)));
        assert!(!issues.iter().any(|i| matches!(i, ConfigIssue::InvertedRange { .. })));
    }

    #[test]
    fn test_inverted_range_and_low_harmonic() {
        let config = FundamentalConfig {
            min_fundamental: 40.0,
            max_fundamental: 30.0,
            max_harmonic_frequency: 20.0,
            ..FundamentalConfig::default()
        };
        let issues = config.validate();
        assert!(issues.contains(&ConfigIssue::InvertedRange { min: 40.0, max: 30.0 }));
        assert!(issues.contains(&ConfigIssue::HarmonicBelowFundamental {
            harmonic: 20.0,
            fundamental: 30.0,
        }));
    }

    #[test]
    fn test_issue_message() {
        let issue = ConfigIssue::NonPositiveErbsStep(-1.0);
        assert_eq!(issue.to_string(), "ERB step -1 must be positive");
    }
}
