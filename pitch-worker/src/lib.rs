// pitch-worker/src/lib.rs

//! Host-side helpers around the headless `pitch-core` engine.
//! Runs estimations on a dedicated background thread fed over
//! crossbeam channels, and loads and saves the estimator
//! settings as JSON.

pub mod settings;
pub mod worker;

pub use settings::{config_from_json, load_config, save_config};
pub use worker::{EstimationJob, EstimationOutcome, FundamentalWorker};
