//! Spectrum scanner (§4.3): finds candidate station peaks in a wideband dB
//! magnitude spectrum.
//!
//! Pipeline: compute an FFT-shifted dB spectrum, estimate a noise floor as
//! the 10th percentile of the magnitude distribution, apply an adaptive
//! (or fixed) threshold above the floor, find strict local maxima above
//! threshold, convert bins to absolute frequencies, merge peaks that are
//! closer than `min_separation_hz` using an adaptive valley-depth test, and
//! finally sort by magnitude and truncate to `scan_max_stations`.

use crate::context::DspContext;
use crate::dsp::fft::{bin_to_frequency, magnitude_spectrum_db};
use crate::errors::DspError;
use crate::logging::SignalLogger;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub frequency_hz: f64,
    pub magnitude_db: f32,
    pub bin: usize,
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub fft_size: usize,
    pub threshold_db: f32,
    pub auto_threshold: bool,
    pub threshold_db_offset: f32,
    pub max_stations: usize,
    pub min_separation_hz: f64,
    pub min_valley_depth_db: f32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            fft_size: 8192,
            threshold_db: -70.0,
            auto_threshold: true,
            threshold_db_offset: 18.0,
            max_stations: 60,
            min_separation_hz: 100_000.0,
            min_valley_depth_db: 6.0,
        }
    }
}

/// Estimates the noise floor as the 10th-percentile magnitude.
fn noise_floor_db(spectrum: &[f32]) -> f32 {
    let mut sorted: Vec<f32> = spectrum.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let idx = ((sorted.len() as f64) * 0.10) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn effective_threshold(spectrum: &[f32], config: &ScanConfig) -> f32 {
    if config.auto_threshold {
        noise_floor_db(spectrum) + config.threshold_db_offset
    } else {
        config.threshold_db
    }
}

/// Finds indices of strict local maxima at or above `threshold`.
fn find_local_maxima(spectrum: &[f32], threshold: f32) -> Vec<usize> {
    let n = spectrum.len();
    let mut maxima = Vec::new();
    for idx in 0..n {
        let value = spectrum[idx];
        if value < threshold {
            continue;
        }
        let left_ok = idx == 0 || spectrum[idx - 1] < value;
        let right_ok = idx == n - 1 || spectrum[idx + 1] < value;
        if left_ok && right_ok {
            maxima.push(idx);
        }
    }
    maxima
}

/// Deepest valley (lowest magnitude) strictly between two bins in the
/// original spectrum.
fn valley_depth_db(spectrum: &[f32], a: usize, b: usize) -> f32 {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    let peak = spectrum[lo].max(spectrum[hi]);
    let valley = spectrum[lo..=hi]
        .iter()
        .copied()
        .fold(f32::INFINITY, f32::min);
    peak - valley
}

/// Merges peaks closer than `min_separation_hz` unconditionally. At or
/// beyond `min_separation_hz`, merges anyway if the valley between them
/// isn't deep enough, per the adaptive depth rule: required depth is
/// `clamp(min_valley_depth_db, min_valley_depth_db + floor(snr_db / 6), 24)`
/// where `snr_db` is the stronger peak's margin above the noise floor.
fn merge_close_peaks(
    mut peaks: Vec<Peak>,
    spectrum: &[f32],
    noise_floor: f32,
    config: &ScanConfig,
) -> Vec<Peak> {
    peaks.sort_by(|a, b| a.frequency_hz.partial_cmp(&b.frequency_hz).unwrap());

    let mut merged: Vec<Peak> = Vec::new();
    for peak in peaks {
        if let Some(last) = merged.last().copied() {
            let separation = (peak.frequency_hz - last.frequency_hz).abs();
            let stronger = if peak.magnitude_db >= last.magnitude_db {
                peak
            } else {
                last
            };
            let snr_db = stronger.magnitude_db - noise_floor;
            let required_depth = (config.min_valley_depth_db
                + (snr_db / 6.0).floor())
            .clamp(config.min_valley_depth_db, 24.0);
            let depth = valley_depth_db(spectrum, last.bin, peak.bin);

            let should_merge = separation < config.min_separation_hz || depth < required_depth;
            if should_merge {
                // Not enough separation, or not enough depth between them: keep only the stronger peak.
                merged.pop();
                merged.push(stronger);
                continue;
            }
        }
        merged.push(peak);
    }
    merged
}

/// Scans `(i, q)` for candidate station peaks centered at `fc` with sample
/// rate `fs`.
pub fn scan(
    i: &[f32],
    q: &[f32],
    fs: f64,
    fc: f64,
    config: &ScanConfig,
    ctx: &DspContext,
    logger: &mut SignalLogger,
) -> Result<Vec<Peak>, DspError> {
    let spectrum = magnitude_spectrum_db(i, q, config.fft_size, ctx, logger)?;
    let noise_floor = noise_floor_db(&spectrum);
    let threshold = effective_threshold(&spectrum, config);

    logger.debug(
        "SCANNER",
        format!("noise_floor={noise_floor:.1}dB threshold={threshold:.1}dB"),
    );

    let maxima = find_local_maxima(&spectrum, threshold);
    let mut peaks: Vec<Peak> = maxima
        .into_iter()
        .map(|bin| Peak {
            frequency_hz: bin_to_frequency(bin, config.fft_size, fs, fc),
            magnitude_db: spectrum[bin],
            bin,
        })
        .collect();

    peaks = merge_close_peaks(peaks, &spectrum, noise_floor, config);

    peaks.sort_by(|a, b| b.magnitude_db.partial_cmp(&a.magnitude_db).unwrap());
    peaks.truncate(config.max_stations);

    Ok(peaks)
}
