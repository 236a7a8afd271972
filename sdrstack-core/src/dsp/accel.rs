//! Runtime accelerator capability registry (§9 "Runtime accelerator
//! selection").
//!
//! Each DSP primitive that has an accelerated (SIMD/GPU-class) path names
//! the capability it needs; this registry tracks, per variant name, whether
//! its output has been observed degenerate for a given input shape and
//! whether the one-time warning for that variant has already fired. It is
//! owned by `DspContext` rather than living behind a process-wide `static`,
//! so tests construct their own registry and never interfere with each
//! other.

use std::collections::HashSet;
use std::sync::Mutex;

/// Toggles mirrored from user preferences (§6 "Runtime toggles").
#[derive(Debug, Clone, Copy)]
pub struct AcceleratorToggles {
    pub enabled: bool,
    pub validate: bool,
}

impl Default for AcceleratorToggles {
    fn default() -> Self {
        Self {
            enabled: true,
            // dev builds validate by default, release builds don't.
            validate: cfg!(debug_assertions),
        }
    }
}

/// Tracks, per accelerated variant, which input shapes have already been
/// observed to produce degenerate output (and therefore now take the
/// scalar path directly) plus whether the first-occurrence warning has
/// fired for that variant.
#[derive(Debug, Default)]
pub struct AcceleratorRegistry {
    toggles: Mutex<AcceleratorToggles>,
    degenerate_shapes: Mutex<HashSet<(&'static str, usize)>>,
    warned_variants: Mutex<HashSet<&'static str>>,
}

impl AcceleratorRegistry {
    pub fn new(toggles: AcceleratorToggles) -> Self {
        Self {
            toggles: Mutex::new(toggles),
            degenerate_shapes: Mutex::new(HashSet::new()),
            warned_variants: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.toggles.lock().unwrap().enabled
    }

    pub fn validate(&self) -> bool {
        self.toggles.lock().unwrap().validate
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.toggles.lock().unwrap().enabled = enabled;
    }

    pub fn set_validate(&self, validate: bool) {
        self.toggles.lock().unwrap().validate = validate;
    }

    /// True if `variant` has already been found to degenerate for `shape`
    /// (e.g. an FFT size) and should go straight to the scalar path.
    pub fn is_known_degenerate(&self, variant: &'static str, shape: usize) -> bool {
        self.degenerate_shapes
            .lock()
            .unwrap()
            .contains(&(variant, shape))
    }

    /// Record that `variant` degenerated for `shape`. Returns `true` the
    /// first time this variant has ever been marked degenerate (i.e. the
    /// caller should emit the one-time warning).
    pub fn mark_degenerate(&self, variant: &'static str, shape: usize) -> bool {
        self.degenerate_shapes
            .lock()
            .unwrap()
            .insert((variant, shape));
        self.warned_variants.lock().unwrap().insert(variant)
    }

    /// `resetAcceleratorWarning` — allow the next degeneracy for `variant`
    /// to warn again, without forgetting which shapes are degenerate.
    pub fn reset_warning(&self, variant: &'static str) {
        self.warned_variants.lock().unwrap().remove(variant);
    }

    /// `resetAcceleratorForTest` — fully reset the registry to a clean
    /// state: no shape is considered degenerate, no variant has warned.
    pub fn reset_for_test(&self) {
        self.degenerate_shapes.lock().unwrap().clear();
        self.warned_variants.lock().unwrap().clear();
    }

    /// `setAcceleratorForTest` — force a shape to be treated as degenerate
    /// without actually running the accelerated path, for exercising the
    /// fallback in tests.
    pub fn set_degenerate_for_test(&self, variant: &'static str, shape: usize) {
        self.degenerate_shapes
            .lock()
            .unwrap()
            .insert((variant, shape));
    }
}

/// A buffer is degenerate when it is constant, all-zero, or contains any
/// non-finite value — the sanity pass required before trusting an
/// accelerated result (§4.1, §7).
pub fn is_degenerate(buffer: &[f32]) -> bool {
    if buffer.is_empty() {
        return true;
    }
    if buffer.iter().any(|v| !v.is_finite()) {
        return true;
    }
    if buffer.iter().all(|&v| v == 0.0) {
        return true;
    }
    let first = buffer[0];
    buffer.iter().all(|&v| v == first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_detects_constant_buffer() {
        assert!(is_degenerate(&[1.0, 1.0, 1.0]));
    }

    #[test]
    fn degenerate_detects_non_finite() {
        assert!(is_degenerate(&[1.0, f32::NAN, 2.0]));
    }

    #[test]
    fn degenerate_rejects_varying_finite_buffer() {
        assert!(!is_degenerate(&[1.0, 2.0, 3.0]));
    }

    #[test]
    fn warning_fires_once_per_variant() {
        let registry = AcceleratorRegistry::new(AcceleratorToggles::default());
        assert!(registry.mark_degenerate("rustfft", 1024));
        assert!(!registry.mark_degenerate("rustfft", 2048));
        registry.reset_warning("rustfft");
        assert!(registry.mark_degenerate("rustfft", 4096));
    }

    #[test]
    fn reset_for_test_clears_everything() {
        let registry = AcceleratorRegistry::new(AcceleratorToggles::default());
        registry.mark_degenerate("rustfft", 1024);
        assert!(registry.is_known_degenerate("rustfft", 1024));
        registry.reset_for_test();
        assert!(!registry.is_known_degenerate("rustfft", 1024));
    }
}
