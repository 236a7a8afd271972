//! Windowed-DFT fallback channelizer (§4.2).
//!
//! Used when the polyphase filter bank cannot be designed (or is disabled).
//! Block size equals the same decimation factor `M = round(fs/cbw)` used by
//! the PFB path, so both variants produce output at `fs/M`. `M` need not be
//! a power of two, so this extracts a single bin by direct correlation
//! rather than going through `dsp::fft` (which requires power-of-two
//! sizes).

use crate::errors::ChannelizerError;
use std::f64::consts::TAU;

pub struct WindowedDftChannelizer {
    m: usize,
}

impl WindowedDftChannelizer {
    pub fn new(fs: f64, cbw: f64) -> Result<Self, ChannelizerError> {
        if cbw <= 0.0 {
            return Err(ChannelizerError::PfbDesignFailed {
                reason: "channel bandwidth must be positive".into(),
            });
        }
        let m = (fs / cbw).round() as usize;
        if m == 0 {
            return Err(ChannelizerError::InvalidDecimationFactor { factor: m });
        }
        Ok(Self { m })
    }

    pub fn decimation_factor(&self) -> usize {
        self.m
    }

    fn hamming(n: usize, m: usize) -> f32 {
        if m <= 1 {
            return 1.0;
        }
        (0.54 - 0.46 * (TAU * n as f64 / (m - 1) as f64).cos()) as f32
    }

    /// Extracts one channel by windowing successive blocks of length `M`
    /// and correlating against the complex exponential for the channel's
    /// offset bin. Returns `None` if the offset is outside ±fs/2.
    pub fn channelize_one(
        &self,
        i: &[f32],
        q: &[f32],
        fs: f64,
        fc: i64,
        channel_freq: i64,
    ) -> Option<(Vec<f32>, Vec<f32>)> {
        let offset = (channel_freq - fc) as f64;
        if offset.abs() > fs / 2.0 {
            return None;
        }

        let m = self.m;
        let bin = (offset / fs * m as f64).round() as i64;
        let bin = bin.rem_euclid(m as i64) as usize;

        let n_blocks = i.len().min(q.len()) / m;
        let mut out_i = Vec::with_capacity(n_blocks);
        let mut out_q = Vec::with_capacity(n_blocks);

        for block in 0..n_blocks {
            let base = block * m;
            let mut acc_re = 0.0f64;
            let mut acc_im = 0.0f64;
            for n in 0..m {
                let w = Self::hamming(n, m) as f64;
                let sample_i = i[base + n] as f64 * w;
                let sample_q = q[base + n] as f64 * w;
                let angle = -TAU * bin as f64 * n as f64 / m as f64;
                let (sin, cos) = angle.sin_cos();
                acc_re += sample_i * cos - sample_q * sin;
                acc_im += sample_i * sin + sample_q * cos;
            }
            out_i.push((acc_re / m as f64) as f32);
            out_q.push((acc_im / m as f64) as f32);
        }

        Some((out_i, out_q))
    }
}
