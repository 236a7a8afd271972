//! Long-lived context object (§9 "global mutable state becomes a long-lived
//! context object passed explicitly").
//!
//! `DspContext` owns the FFT/window caches, the accelerator capability
//! registry, and (optionally) a worker pool for batched FFT offload. One
//! context is constructed per process/test and threaded explicitly through
//! the scanner, channelizer, and multi-station pipeline — nothing here is a
//! hidden global.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

use crate::dsp::accel::{AcceleratorRegistry, AcceleratorToggles};
use crate::dsp::worker_pool::FftWorkerPool;

/// Twiddle-factor table for the scalar radix-2 reference FFT, cached by
/// size so hot sizes never recompute trig (§4.1).
pub(crate) type TwiddleTable = Arc<Vec<Complex32>>;

pub struct DspContext {
    planner: Mutex<FftPlanner<f32>>,
    fft_cache: Mutex<HashMap<usize, Arc<dyn Fft<f32>>>>,
    twiddle_cache: Mutex<HashMap<usize, TwiddleTable>>,
    window_cache: Mutex<HashMap<(&'static str, usize), Arc<Vec<f32>>>>,
    pub accel: AcceleratorRegistry,
    worker_pool: Mutex<Option<FftWorkerPool>>,
}

impl DspContext {
    pub fn new() -> Self {
        Self {
            planner: Mutex::new(FftPlanner::new()),
            fft_cache: Mutex::new(HashMap::new()),
            twiddle_cache: Mutex::new(HashMap::new()),
            window_cache: Mutex::new(HashMap::new()),
            accel: AcceleratorRegistry::new(AcceleratorToggles::default()),
            worker_pool: Mutex::new(None),
        }
    }

    pub fn with_toggles(toggles: AcceleratorToggles) -> Self {
        let ctx = Self::new();
        ctx.accel.set_enabled(toggles.enabled);
        ctx.accel.set_validate(toggles.validate);
        ctx
    }

    /// Returns the cached forward rustfft plan for `size`, creating it if
    /// this is the first request for that size.
    pub(crate) fn rustfft_plan(&self, size: usize) -> Arc<dyn Fft<f32>> {
        let mut cache = self.fft_cache.lock().unwrap();
        cache
            .entry(size)
            .or_insert_with(|| self.planner.lock().unwrap().plan_fft_forward(size))
            .clone()
    }

    /// Returns the cached twiddle table for the scalar reference FFT of
    /// `size`, computing it once per size.
    pub(crate) fn twiddle_table(&self, size: usize) -> TwiddleTable {
        let mut cache = self.twiddle_cache.lock().unwrap();
        cache
            .entry(size)
            .or_insert_with(|| Arc::new(compute_twiddles(size)))
            .clone()
    }

    /// Returns the cached window coefficients for `(kind, size)`.
    pub(crate) fn window_table(
        &self,
        kind: &'static str,
        size: usize,
        compute: impl FnOnce() -> Vec<f32>,
    ) -> Arc<Vec<f32>> {
        let mut cache = self.window_cache.lock().unwrap();
        cache
            .entry((kind, size))
            .or_insert_with(|| Arc::new(compute()))
            .clone()
    }

    /// Installs a worker pool for batched FFT offload (§4.3, §5). Scans
    /// default to `None`, i.e. run FFTs inline on the caller's thread.
    pub fn install_worker_pool(&self, pool: FftWorkerPool) {
        *self.worker_pool.lock().unwrap() = Some(pool);
    }

    pub fn worker_pool(&self) -> Option<FftWorkerPool> {
        self.worker_pool.lock().unwrap().clone()
    }
}

fn compute_twiddles(size: usize) -> Vec<Complex32> {
    use std::f32::consts::PI;
    (0..size / 2)
        .map(|k| {
            let angle = -2.0 * PI * k as f32 / size as f32;
            Complex32::new(angle.cos(), angle.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twiddle_table_is_cached_and_reused() {
        let ctx = DspContext::new();
        let a = ctx.twiddle_table(1024);
        let b = ctx.twiddle_table(1024);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn window_table_computes_once() {
        let ctx = DspContext::new();
        use std::sync::atomic::{AtomicUsize, Ordering};
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let compute = || {
            CALLS.fetch_add(1, Ordering::SeqCst);
            vec![1.0, 2.0, 3.0]
        };
        let _ = ctx.window_table("hann", 3, compute);
        let _ = ctx.window_table("hann", 3, compute);
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }
}
