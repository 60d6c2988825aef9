//! # Estimation Worker
//!
//! Runs fundamental-frequency estimation on a dedicated thread so callers
//! (an editor loading samples, a batch annotator) never block on the
//! CPU-bound analysis.
//!
//! - **Worker Thread**: owns a `FundamentalEstimator` and its kernel cache
//! - **Communication**: crossbeam channels for jobs, outcomes and shutdown

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, Sender};
use pitch_core::{Fundamental, FundamentalConfig, FundamentalEstimator, KernelCache, Waveform};

/// A waveform to analyse, tagged with a caller-chosen id.
#[derive(Debug, Clone)]
pub struct EstimationJob {
    pub id: u64,
    pub waveform: Waveform,
    pub config: FundamentalConfig,
}

/// The curve computed for a job.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationOutcome {
    pub id: u64,
    pub fundamental: Fundamental,
}

/// Background estimation thread management structure.
///
/// Jobs are processed in submission order. Dropping the worker signals the
/// thread to stop and waits for it.
#[derive(Debug)]
pub struct FundamentalWorker {
    job_tx: Sender<EstimationJob>,
    outcome_rx: Receiver<EstimationOutcome>,
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl FundamentalWorker {
    /// Starts the worker thread with a kernel cache it shares with the caller.
    ///
    /// # Returns
    /// * `Ok(worker)` - Worker ready to accept jobs
    /// * `Err(e)` - The thread could not be spawned
    pub fn spawn(cache: Arc<KernelCache>) -> Result<Self> {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<EstimationJob>();
        let (outcome_tx, outcome_rx) = crossbeam_channel::unbounded();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let estimator = FundamentalEstimator::with_cache(cache);

        let thread_handle = thread::Builder::new()
            .name("fundamental-worker".into())
            .spawn(move || {
                log::debug!("[WORKER] Entering estimation loop...");
                loop {
                    crossbeam_channel::select! {
                        recv(job_rx) -> msg => match msg {
                            Ok(job) => {
                                let outcome = run_job(&estimator, job);
                                if outcome_tx.send(outcome).is_err() {
                                    log::warn!("[WORKER] Failed to send estimation outcome");
                                    break;
                                }
                            }
                            Err(_) => {
                                log::debug!("[WORKER] Job channel closed");
                                break;
                            }
                        },
                        recv(shutdown_rx) -> _ => {
                            log::debug!("[WORKER] Received shutdown signal");
                            break;
                        },
                    }
                }
                log::debug!("[WORKER] Worker thread finished");
            })
            .context("Failed to spawn fundamental worker thread")?;

        Ok(Self {
            job_tx,
            outcome_rx,
            shutdown_tx,
            thread_handle: Some(thread_handle),
        })
    }

    /// Queues a job for the worker thread.
    pub fn submit(&self, job: EstimationJob) -> Result<()> {
        self.job_tx
            .send(job)
            .map_err(|_| anyhow!("Fundamental worker has stopped"))
    }

    /// Channel on which finished outcomes arrive, in submission order.
    pub fn outcomes(&self) -> &Receiver<EstimationOutcome> {
        &self.outcome_rx
    }

    /// Waits up to `timeout` for the next outcome.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<EstimationOutcome> {
        self.outcome_rx
            .recv_timeout(timeout)
            .context("No estimation outcome received")
    }

    /// Stops the worker thread and waits for it to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            let _ = self.shutdown_tx.try_send(());
            if handle.join().is_err() {
                log::warn!("[WORKER] Worker thread panicked");
            }
        }
    }
}

impl Drop for FundamentalWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Runs one job; a panicking estimation yields the fallback curve.
fn run_job(estimator: &FundamentalEstimator, job: EstimationJob) -> EstimationOutcome {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        estimator.estimate(&job.waveform, &job.config)
    }));
    let fundamental = match result {
        Ok(fundamental) => fundamental,
        Err(_) => {
            log::warn!("[WORKER] Estimation of job {} panicked, using fallback curve", job.id);
            Fundamental::fallback(job.config.min_fundamental)
        }
    };
    EstimationOutcome {
        id: job.id,
        fundamental,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const SAMPLE_RATE: u32 = 16000;
    const TIMEOUT: Duration = Duration::from_secs(30);

    fn test_config() -> FundamentalConfig {
        FundamentalConfig {
            min_fundamental: 100.0,
            max_fundamental: 400.0,
            semitone_sample_num: 2,
            erbs_step: 0.2,
            max_harmonic_frequency: 2000.0,
        }
    }

    fn sine(freq: f32) -> Waveform {
        let samples = (0..SAMPLE_RATE as usize / 4)
            .map(|i| (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
            .collect();
        Waveform::mono(samples, SAMPLE_RATE).unwrap()
    }

    #[test]
    fn test_outcomes_match_direct_estimation() {
        let cache = Arc::new(KernelCache::new());
        let worker = FundamentalWorker::spawn(Arc::clone(&cache)).unwrap();

        for (id, freq) in [(1, 200.0), (2, 300.0)] {
            worker
                .submit(EstimationJob {
                    id,
                    waveform: sine(freq),
                    config: test_config(),
                })
                .unwrap();
        }

        let first = worker.recv_timeout(TIMEOUT).unwrap();
        let second = worker.recv_timeout(TIMEOUT).unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        let direct = FundamentalEstimator::new().estimate(&sine(200.0), &test_config());
        assert_eq!(first.fundamental, direct);
        assert_eq!(cache.build_count(), 1);

        worker.shutdown();
    }

    #[test]
    fn test_invalid_config_yields_fallback() {
        let worker = FundamentalWorker::spawn(Arc::new(KernelCache::new())).unwrap();
        let config = FundamentalConfig {
            semitone_sample_num: 0,
            ..test_config()
        };
        worker
            .submit(EstimationJob {
                id: 7,
                waveform: sine(200.0),
                config,
            })
            .unwrap();
        let outcome = worker.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(outcome.id, 7);
        assert_eq!(outcome.fundamental, Fundamental::fallback(100.0));
    }

    #[test]
    fn test_drop_stops_thread() {
        let worker = FundamentalWorker::spawn(Arc::new(KernelCache::new())).unwrap();
        let outcomes = worker.outcomes().clone();
        drop(worker);
        // The sender side lives in the finished thread, so the channel is closed.
        assert!(outcomes.recv_timeout(TIMEOUT).is_err());
    }
}
