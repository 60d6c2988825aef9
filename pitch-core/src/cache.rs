//! # Kernel Cache Module
//!
//! Kernel construction is the most expensive configuration-dependent step
//! and only changes when the settings or the sample rate change, so the
//! last built [`KernelData`] is kept and shared between estimations.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::config::FundamentalConfig;
use crate::kernel::KernelData;

/// What a set of kernels was built for.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelKey {
    pub config: FundamentalConfig,
    pub sample_rate: u32,
}

#[derive(Debug)]
struct CachedKernel {
    key: KernelKey,
    data: Arc<KernelData>,
}

/// Holds the most recently built kernels.
///
/// The key check and the rebuild run under one lock: concurrent callers with
/// the same key wait for a single rebuild, and every caller receives a fully
/// built `Arc<KernelData>`. Entries are replaced wholesale and never mutated.
#[derive(Debug, Default)]
pub struct KernelCache {
    slot: Mutex<Option<CachedKernel>>,
    builds: AtomicUsize,
}

impl KernelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the kernels for `config` and `sample_rate`, rebuilding them
    /// only if the key differs from the cached one.
    ///
    /// # Returns
    /// * `Some(data)` - Shared kernels; the same `Arc` while the key is unchanged
    /// * `None` - The configuration cannot produce kernels (the cache is emptied)
    pub fn get_kernel(&self, config: &FundamentalConfig, sample_rate: u32) -> Option<Arc<KernelData>> {
        let mut slot = self.slot.lock();

        if let Some(cached) = slot.as_ref() {
            if cached.key.sample_rate == sample_rate && cached.key.config == *config {
                return Some(Arc::clone(&cached.data));
            }
        }

        self.builds.fetch_add(1, Ordering::Relaxed);
        log::debug!("[KERNEL] Rebuilding kernels for {:?} at {} Hz", config, sample_rate);

        match KernelData::build(config, sample_rate) {
            Some(data) => {
                let data = Arc::new(data);
                *slot = Some(CachedKernel {
                    key: KernelKey {
                        config: config.clone(),
                        sample_rate,
                    },
                    data: Arc::clone(&data),
                });
                Some(data)
            }
            None => {
                log::warn!("[KERNEL] Configuration cannot produce kernels: {:?}", config);
                *slot = None;
                None
            }
        }
    }

    /// Number of kernel builds attempted so far.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    /// Key of the cached kernels, if any.
    pub fn cached_key(&self) -> Option<KernelKey> {
        self.slot.lock().as_ref().map(|cached| cached.key.clone())
    }

    /// Drops the cached kernels.
    pub fn clear(&self) {
        *self.slot.lock() = None;
    }
}
