//! Windowing functions (§4.1): Hann, Hamming, Blackman. Each multiplies
//! both I and Q arrays in place by the standard symmetric window of length
//! N. Coefficients are cached per (kind, N) in the shared `DspContext`.

use crate::context::DspContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    Hann,
    Hamming,
    Blackman,
}

impl WindowKind {
    fn cache_key(self) -> &'static str {
        match self {
            WindowKind::Hann => "hann",
            WindowKind::Hamming => "hamming",
            WindowKind::Blackman => "blackman",
        }
    }
}

fn hann(n: usize) -> Vec<f32> {
    let denom = (n.max(2) - 1) as f32;
    (0..n)
        .map(|k| {
            0.5 - 0.5 * (2.0 * std::f32::consts::PI * k as f32 / denom).cos()
        })
        .collect()
}

fn hamming(n: usize) -> Vec<f32> {
    let denom = (n.max(2) - 1) as f32;
    (0..n)
        .map(|k| 0.54 - 0.46 * (2.0 * std::f32::consts::PI * k as f32 / denom).cos())
        .collect()
}

fn blackman(n: usize) -> Vec<f32> {
    let denom = (n.max(2) - 1) as f32;
    (0..n)
        .map(|k| {
            let phase = 2.0 * std::f32::consts::PI * k as f32 / denom;
            0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
        })
        .collect()
}

pub fn coefficients(kind: WindowKind, n: usize, ctx: &DspContext) -> std::sync::Arc<Vec<f32>> {
    ctx.window_table(kind.cache_key(), n, || match kind {
        WindowKind::Hann => hann(n),
        WindowKind::Hamming => hamming(n),
        WindowKind::Blackman => blackman(n),
    })
}

/// Applies `kind`'s window to `i` and `q` in place. Both arrays must have
/// equal length; coefficients are recomputed (or fetched from cache) for
/// that length.
pub fn apply_window(i: &mut [f32], q: &mut [f32], kind: WindowKind, ctx: &DspContext) {
    let n = i.len().min(q.len());
    let coeffs = coefficients(kind, n, ctx);
    for k in 0..n {
        i[k] *= coeffs[k];
        q[k] *= coeffs[k];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_endpoints_taper_toward_zero() {
        for kind in [WindowKind::Hann, WindowKind::Hamming, WindowKind::Blackman] {
            let ctx = DspContext::new();
            let coeffs = coefficients(kind, 256, &ctx);
            assert!(coeffs[0] < coeffs[128]);
            assert!(coeffs[255] < coeffs[128]);
        }
    }

    #[test]
    fn apply_window_scales_both_channels_identically() {
        let ctx = DspContext::new();
        let mut i = vec![1.0f32; 16];
        let mut q = vec![2.0f32; 16];
        apply_window(&mut i, &mut q, WindowKind::Hann, &ctx);
        for k in 0..16 {
            assert!((q[k] - 2.0 * i[k]).abs() < 1e-6);
        }
    }

    #[test]
    fn hamming_peak_is_near_unity() {
        let coeffs = hamming(1024);
        let peak = coeffs.iter().cloned().fold(0.0f32, f32::max);
        assert!((peak - 1.0).abs() < 1e-3);
    }
}
