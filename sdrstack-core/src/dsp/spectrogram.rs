//! Spectrogram: applies the FFT per row of N consecutive samples (§4.1).

use crate::context::DspContext;
use crate::dsp::fft;
use crate::errors::DspError;
use crate::logging::SignalLogger;

/// Produces `floor(len/n)` row-major rows, each the dB magnitude spectrum
/// of one consecutive block of `n` samples.
pub fn compute_spectrogram(
    i: &[f32],
    q: &[f32],
    n: usize,
    ctx: &DspContext,
    logger: &mut SignalLogger,
) -> Result<Vec<Vec<f32>>, DspError> {
    if !fft::is_power_of_two(n) {
        return Err(DspError::InvalidFftSize { size: n });
    }
    let len = i.len().min(q.len());
    let rows = len / n;
    let mut spectrogram = Vec::with_capacity(rows);
    for row in 0..rows {
        let start = row * n;
        let row_spectrum =
            fft::magnitude_spectrum_db(&i[start..start + n], &q[start..start + n], n, ctx, logger)?;
        spectrogram.push(row_spectrum);
    }
    Ok(spectrogram)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_count_is_floor_division() {
        let ctx = DspContext::new();
        let mut logger = SignalLogger::default();
        let n = 16;
        let i = vec![0.0f32; n * 3 + 5];
        let q = vec![0.0f32; n * 3 + 5];
        let rows = compute_spectrogram(&i, &q, n, &ctx, &mut logger).unwrap();
        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(row.len(), n);
        }
    }

    #[test]
    fn rejects_non_power_of_two() {
        let ctx = DspContext::new();
        let mut logger = SignalLogger::default();
        let err = compute_spectrogram(&[0.0; 10], &[0.0; 10], 10, &ctx, &mut logger).unwrap_err();
        assert!(matches!(err, DspError::InvalidFftSize { size: 10 }));
    }
}
