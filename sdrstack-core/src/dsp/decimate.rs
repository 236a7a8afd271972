//! Decimator (§4.1): keeps every Mth sample. No anti-alias filtering is
//! performed here — callers are responsible for band-limiting first (see
//! `fir::design_lowpass` + `fir::apply_fir`).

use crate::errors::DspError;

pub fn decimate(signal: &[f32], factor: usize) -> Result<Vec<f32>, DspError> {
    if factor == 0 {
        return Err(DspError::InvalidDecimationFactor { factor });
    }
    Ok(signal.iter().step_by(factor).copied().collect())
}

/// Decimates parallel I/Q streams by `factor`.
pub fn decimate_iq(i: &[f32], q: &[f32], factor: usize) -> Result<(Vec<f32>, Vec<f32>), DspError> {
    Ok((decimate(i, factor)?, decimate(q, factor)?))
}
