//! Channelizer (§4.2): extracts one or more narrowband channels from a
//! wideband I/Q capture. The polyphase filter bank (PFB) is the preferred
//! algorithm; if it cannot be designed, the windowed-DFT fallback is used
//! instead and the substitution is logged.

pub mod dft;
pub mod pfb;

use crate::errors::ChannelizerError;
use crate::logging::SignalLogger;
use dft::WindowedDftChannelizer;
use pfb::PolyphaseFilterBank;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelizerAlgorithm {
    Pfb,
    WindowedDft,
}

enum Backend {
    Pfb(PolyphaseFilterBank),
    Dft(WindowedDftChannelizer),
}

pub struct Channelizer {
    backend: Backend,
    algorithm: ChannelizerAlgorithm,
}

impl Channelizer {
    /// Builds a channelizer for wideband rate `fs` and channel bandwidth
    /// `cbw`. When `prefer_pfb` is true (the default per §6 config
    /// `usePFBChannelizer`), attempts the PFB design first and falls back to
    /// the windowed-DFT variant on failure, logging the fallback.
    pub fn new(
        fs: f64,
        cbw: f64,
        taps_per_phase: usize,
        prefer_pfb: bool,
        logger: &mut SignalLogger,
    ) -> Result<Self, ChannelizerError> {
        if prefer_pfb {
            match PolyphaseFilterBank::design(fs, cbw, taps_per_phase) {
                Ok(pfb) => {
                    return Ok(Self {
                        backend: Backend::Pfb(pfb),
                        algorithm: ChannelizerAlgorithm::Pfb,
                    })
                }
                Err(err) => {
                    logger.warn(
                        "PFB",
                        format!("PFB design failed ({err}), falling back to windowed-DFT"),
                    );
                }
            }
        }

        let dft = WindowedDftChannelizer::new(fs, cbw)?;
        Ok(Self {
            backend: Backend::Dft(dft),
            algorithm: ChannelizerAlgorithm::WindowedDft,
        })
    }

    pub fn algorithm(&self) -> ChannelizerAlgorithm {
        self.algorithm
    }

    pub fn decimation_factor(&self) -> usize {
        match &self.backend {
            Backend::Pfb(p) => p.decimation_factor(),
            Backend::Dft(d) => d.decimation_factor(),
        }
    }

    /// Extracts one channel. Returns `None` (silent skip, §4.2) if the
    /// channel's offset from `fc` exceeds ±fs/2.
    pub fn channelize_one(
        &self,
        i: &[f32],
        q: &[f32],
        fs: f64,
        fc: i64,
        channel_freq: i64,
    ) -> Result<Option<(Vec<f32>, Vec<f32>)>, ChannelizerError> {
        match &self.backend {
            Backend::Pfb(p) => p.channelize_one(i, q, fs, fc, channel_freq),
            Backend::Dft(d) => Ok(d.channelize_one(i, q, fs, fc, channel_freq)),
        }
    }

    /// Extracts every requested channel, silently omitting any whose offset
    /// is out of range rather than erroring the whole batch.
    pub fn channelize_many(
        &self,
        i: &[f32],
        q: &[f32],
        fs: f64,
        fc: i64,
        channel_freqs: &[i64],
    ) -> Result<Vec<(i64, Vec<f32>, Vec<f32>)>, ChannelizerError> {
        let mut out = Vec::with_capacity(channel_freqs.len());
        for &freq in channel_freqs {
            if let Some((ci, cq)) = self.channelize_one(i, q, fs, fc, freq)? {
                out.push((freq, ci, cq));
            }
        }
        Ok(out)
    }
}
