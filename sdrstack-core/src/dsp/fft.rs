//! Power-of-two FFT and FFT-shifted dB magnitude spectrum (§4.1).
//!
//! Two independent implementations exist: `rustfft`-backed (the
//! accelerated path) and a scalar radix-2 Cooley–Tukey reference. The
//! accelerated path is used by default; its output is sanity-checked and
//! the scalar path is substituted permanently for a given size if it ever
//! degenerates (§7).

use num_complex::Complex32;

use crate::context::DspContext;
use crate::dsp::accel::is_degenerate;
use crate::errors::DspError;
use crate::logging::SignalLogger;

const RUSTFFT_VARIANT: &str = "rustfft";
const MAGNITUDE_EPSILON: f32 = 1e-12;

pub fn is_power_of_two(n: usize) -> bool {
    n >= 2 && n & (n - 1) == 0
}

fn validate_inputs(i: &[f32], q: &[f32], n: usize) -> Result<(), DspError> {
    if !is_power_of_two(n) {
        return Err(DspError::InvalidFftSize { size: n });
    }
    let shortest = i.len().min(q.len());
    if shortest < n {
        return Err(DspError::InsufficientSamples {
            size: n,
            actual: shortest,
        });
    }
    if i[..n].iter().chain(q[..n].iter()).any(|v| v.is_nan()) {
        return Err(DspError::NonFiniteInput);
    }
    Ok(())
}

/// Computes the FFT-shifted dB magnitude spectrum of `(i, q)` truncated to
/// `n` samples. `n` must be a power of two >= 2.
pub fn magnitude_spectrum_db(
    i: &[f32],
    q: &[f32],
    n: usize,
    ctx: &DspContext,
    logger: &mut SignalLogger,
) -> Result<Vec<f32>, DspError> {
    validate_inputs(i, q, n)?;

    if ctx.accel.is_enabled() && !ctx.accel.is_known_degenerate(RUSTFFT_VARIANT, n) {
        let accelerated = accelerated_fft(i, q, n, ctx);
        if !is_degenerate(&accelerated) {
            if ctx.accel.validate() {
                let reference = scalar_fft(i, q, n, ctx);
                if max_abs_diff(&accelerated, &reference) > 1.0 {
                    logger.warn(
                        "ACCEL",
                        format!(
                            "accelerated/scalar FFT divergence > 1 dB for size {n}; using scalar"
                        ),
                    );
                    return Ok(reference);
                }
            }
            return Ok(accelerated);
        }
        if ctx.accel.mark_degenerate(RUSTFFT_VARIANT, n) {
            logger.warn(
                "ACCEL",
                format!("{RUSTFFT_VARIANT} produced degenerate output; falling back to scalar FFT"),
            );
        }
    }

    Ok(scalar_fft(i, q, n, ctx))
}

fn max_abs_diff(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0f32, f32::max)
}

fn accelerated_fft(i: &[f32], q: &[f32], n: usize, ctx: &DspContext) -> Vec<f32> {
    let plan = ctx.rustfft_plan(n);
    let mut buffer: Vec<Complex32> = (0..n).map(|k| Complex32::new(i[k], q[k])).collect();
    plan.process(&mut buffer);
    shift_and_convert_to_db(&buffer)
}

fn scalar_fft(i: &[f32], q: &[f32], n: usize, ctx: &DspContext) -> Vec<f32> {
    let twiddles = ctx.twiddle_table(n);
    let mut buffer: Vec<Complex32> = (0..n).map(|k| Complex32::new(i[k], q[k])).collect();
    radix2_fft_in_place(&mut buffer, &twiddles);
    shift_and_convert_to_db(&buffer)
}

/// In-place decimation-in-time radix-2 FFT using a precomputed half-length
/// twiddle table (`twiddles[k] = exp(-2*pi*i*k/n)` for `k` in `0..n/2`).
fn radix2_fft_in_place(buffer: &mut [Complex32], twiddles: &[Complex32]) {
    let n = buffer.len();
    bit_reverse_permute(buffer);

    let mut stage_len = 2;
    while stage_len <= n {
        let half = stage_len / 2;
        let stride = n / stage_len;
        for block_start in (0..n).step_by(stage_len) {
            for k in 0..half {
                let twiddle = twiddles[k * stride];
                let even = buffer[block_start + k];
                let odd = buffer[block_start + k + half] * twiddle;
                buffer[block_start + k] = even + odd;
                buffer[block_start + k + half] = even - odd;
            }
        }
        stage_len *= 2;
    }
}

fn bit_reverse_permute(buffer: &mut [Complex32]) {
    let n = buffer.len();
    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if j > i {
            buffer.swap(i, j);
        }
    }
}

fn shift_and_convert_to_db(buffer: &[Complex32]) -> Vec<f32> {
    let n = buffer.len();
    let half = n / 2;
    (0..n)
        .map(|k| {
            let raw_index = (k + half) % n;
            let magnitude = buffer[raw_index].norm();
            20.0 * (magnitude + MAGNITUDE_EPSILON).log10()
        })
        .collect()
}

/// Converts an FFT-shifted bin index back to an absolute frequency (§4.3
/// step 5): `freq = fc + (bin - N/2) * fs / N`.
pub fn bin_to_frequency(bin: usize, n: usize, fs: f64, fc: f64) -> f64 {
    fc + (bin as f64 - (n / 2) as f64) * fs / n as f64
}
