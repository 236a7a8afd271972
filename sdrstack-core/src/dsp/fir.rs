//! FIR low-pass design and application (§4.1).
//!
//! Tap count is `max(21, ceil(5*fs/fc))`, rounded up to the next odd
//! integer and capped at 511. Coefficients are a Hamming-windowed sinc,
//! normalized so DC gain is unity. Application is symmetric convolution
//! with zero-padded boundaries, preserving input length.

use std::f64::consts::PI;

const MIN_TAPS: usize = 21;
const MAX_TAPS: usize = 511;

pub fn tap_count(fs: f64, fc: f64) -> usize {
    let estimated = (5.0 * fs / fc).ceil() as usize;
    let mut taps = estimated.max(MIN_TAPS);
    if taps % 2 == 0 {
        taps += 1;
    }
    taps.min(MAX_TAPS)
}

/// Designs a windowed-sinc low-pass filter with cutoff `fc` at sample rate
/// `fs`, using the §4.1 tap-count formula.
pub fn design_lowpass(fs: f64, fc: f64) -> Vec<f32> {
    design_lowpass_with_taps(fs, fc, tap_count(fs, fc))
}

/// Designs a windowed-sinc low-pass filter with an explicit tap count,
/// used by the polyphase channelizer where the tap count is driven by
/// `tapsPerPhase * M` rather than the §4.1 formula.
pub fn design_lowpass_with_taps(fs: f64, fc: f64, taps: usize) -> Vec<f32> {
    let taps = taps.max(1);
    let center = (taps - 1) as f64 / 2.0;
    let fc_norm = fc / fs;

    let mut coeffs = vec![0.0f64; taps];
    for n in 0..taps {
        let m = n as f64 - center;
        let sinc = if m.abs() < 1e-12 {
            2.0 * fc_norm
        } else {
            (2.0 * PI * fc_norm * m).sin() / (PI * m)
        };
        let window = if taps > 1 {
            0.54 - 0.46 * (2.0 * PI * n as f64 / (taps - 1) as f64).cos()
        } else {
            1.0
        };
        coeffs[n] = sinc * window;
    }

    let dc_gain: f64 = coeffs.iter().sum();
    if dc_gain.abs() > 1e-12 {
        for c in coeffs.iter_mut() {
            *c /= dc_gain;
        }
    }

    coeffs.into_iter().map(|c| c as f32).collect()
}

/// Symmetric convolution with zero-padded boundaries; output length equals
/// input length.
pub fn apply_fir(signal: &[f32], taps: &[f32]) -> Vec<f32> {
    let half = taps.len() / 2;
    let mut output = vec![0.0f32; signal.len()];
    for n in 0..signal.len() {
        let mut acc = 0.0f32;
        for (k, &tap) in taps.iter().enumerate() {
            let signal_idx = n as isize + half as isize - k as isize;
            if signal_idx >= 0 && (signal_idx as usize) < signal.len() {
                acc += signal[signal_idx as usize] * tap;
            }
        }
        output[n] = acc;
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_count_respects_floor_and_cap() {
        assert_eq!(tap_count(48_000.0, 48_000.0 / 2.0), 21);
        assert_eq!(tap_count(2_000_000.0, 100.0), MAX_TAPS);
    }

    #[test]
    fn tap_count_is_always_odd() {
        for fc in [1000.0, 2500.0, 10_000.0, 123_456.0] {
            assert_eq!(tap_count(200_000.0, fc) % 2, 1);
        }
    }

    #[test]
    fn dc_gain_is_unity() {
        let taps = design_lowpass(48_000.0, 4_000.0);
        let dc: f32 = taps.iter().sum();
        assert!((dc - 1.0).abs() < 1e-4, "dc gain = {dc}");
    }

    #[test]
    fn apply_fir_preserves_input_length() {
        let taps = design_lowpass(48_000.0, 4_000.0);
        let signal = vec![1.0f32; 500];
        let filtered = apply_fir(&signal, &taps);
        assert_eq!(filtered.len(), signal.len());
    }

    #[test]
    fn dc_signal_passes_through_at_unity_gain() {
        let taps = design_lowpass(48_000.0, 4_000.0);
        let signal = vec![2.0f32; 2000];
        let filtered = apply_fir(&signal, &taps);
        // interior samples (away from zero-padded edges) should be close to
        // the original DC level since gain is normalized to unity.
        let interior = &filtered[taps.len()..filtered.len() - taps.len()];
        for &v in interior {
            assert!((v - 2.0).abs() < 0.05, "v={v}");
        }
    }
}
