// pitch-core/src/lib.rs

//! The core logic of the fundamental-frequency annotator.
//! This crate implements the SWIPE' pitch tracker: candidate grid,
//! harmonic kernels, multi-resolution spectra, correlation scoring
//! and pitch picking. It is completely headless, spawns no threads
//! and performs no I/O.

pub mod cache;
pub mod candidates;
pub mod config;
pub mod correlation;
pub mod guard;
pub mod kernel;
pub mod pitch;
pub mod scale;
pub mod spectrum;
pub mod waveform;

pub use cache::{KernelCache, KernelKey};
pub use config::{ConfigIssue, FundamentalConfig};
pub use kernel::KernelData;
pub use pitch::{Fundamental, FundamentalEstimator, estimate_fundamental};
pub use waveform::Waveform;
