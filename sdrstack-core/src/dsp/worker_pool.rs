//! Optional worker-pool offload for FFT batches (§4.3, §5).
//!
//! The scanner's magnitude-spectrum computation is the only operation in
//! this crate permitted to suspend: it may hand the FFT off to a
//! process-wide `rayon` pool and await a single result. `FftJobHandle::join`
//! is the "awaitable single-operation interface" the spec describes;
//! shutting the pool down while a job is in flight is observed by the
//! caller as `DspError::WorkerCancelled`, matching "cancellation observable
//! as a rejected awaitable" (§5, §7).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use crate::errors::DspError;

#[derive(Clone)]
pub struct FftWorkerPool {
    pool: Arc<rayon::ThreadPool>,
    shutdown: Arc<AtomicBool>,
}

impl FftWorkerPool {
    pub fn new(num_threads: usize) -> Result<Self, DspError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| DspError::FilterDesignFailed {
                reason: format!("failed to start FFT worker pool: {e}"),
            })?;
        Ok(Self {
            pool: Arc::new(pool),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Least-loaded dispatch is delegated to rayon's own work-stealing
    /// scheduler; from the caller's point of view this is a single
    /// fire-and-await job.
    pub fn submit<F>(&self, job: F) -> FftJobHandle
    where
        F: FnOnce() -> Vec<f32> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let shutdown = self.shutdown.clone();
        self.pool.spawn(move || {
            if shutdown.load(Ordering::SeqCst) {
                let _ = tx.send(None);
                return;
            }
            let result = job();
            let _ = tx.send(Some(result));
        });
        FftJobHandle { rx }
    }

    /// Marks the pool as shut down; in-flight and future jobs resolve as
    /// cancelled. Existing threads are allowed to drain naturally.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

pub struct FftJobHandle {
    rx: mpsc::Receiver<Option<Vec<f32>>>,
}

impl FftJobHandle {
    pub fn join(self) -> Result<Vec<f32>, DspError> {
        match self.rx.recv() {
            Ok(Some(buffer)) => Ok(buffer),
            Ok(None) | Err(_) => Err(DspError::WorkerCancelled),
        }
    }
}
