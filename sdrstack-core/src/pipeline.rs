//! Multi-station FM pipeline (§4.4): tracks a set of FM channels within a
//! wideband capture, periodically rescanning for new stations and evicting
//! ones that have gone quiet, producing demodulated audio per tracked
//! channel on each call to [`FmPipeline::process_wideband_samples`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::channelizer::{Channelizer, ChannelizerAlgorithm};
use crate::context::DspContext;
use crate::dsp::fm::fm_discriminate;
use crate::errors::{ChannelizerError, SdrError};
use crate::logging::SignalLogger;
use crate::rds::{DecoderStats, DownstreamDecoder, NullDownstreamDecoder, RdsBitSync};
use crate::scanner::{self, ScanConfig};

/// RDS subcarrier bit rate (§4.4 addition): 1187.5 bit/s, fixed by the FM
/// broadcast standard.
const RDS_BIT_RATE_HZ: f64 = 1187.5;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub sample_rate: f64,
    pub center_frequency_hz: i64,
    pub channel_bandwidth_hz: f64,
    pub enable_rds: bool,
    pub scan: ScanConfig,
    pub scan_interval_ms: u64,
    pub stale_channel_timeout_ms: u64,
    pub use_pfb_channelizer: bool,
    pub use_worker_fft: bool,
    pub taps_per_phase: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 2_000_000.0,
            center_frequency_hz: 100_000_000,
            channel_bandwidth_hz: 200_000.0,
            enable_rds: true,
            scan: ScanConfig::default(),
            scan_interval_ms: 1000,
            stale_channel_timeout_ms: 5000,
            use_pfb_channelizer: true,
            use_worker_fft: true,
            taps_per_phase: 8,
        }
    }
}

struct ChannelState {
    pinned: bool,
    last_seen: Instant,
    last_magnitude_db: f32,
    rds: Box<dyn DownstreamDecoder>,
}

pub struct ChannelSummary {
    pub frequency_hz: i64,
    pub pinned: bool,
    pub last_magnitude_db: f32,
    pub age: Duration,
}

pub struct ChannelAudio {
    pub frequency_hz: i64,
    pub samples: Vec<f32>,
    pub rds: DecoderStats,
}

pub struct FmPipeline {
    config: PipelineConfig,
    ctx: DspContext,
    channelizer: Channelizer,
    channels: HashMap<i64, ChannelState>,
    last_scan: Option<Instant>,
    logger: SignalLogger,
}

impl FmPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, SdrError> {
        let ctx = DspContext::new();
        let mut logger = SignalLogger::default();
        let channelizer = Channelizer::new(
            config.sample_rate,
            config.channel_bandwidth_hz,
            config.taps_per_phase,
            config.use_pfb_channelizer,
            &mut logger,
        )?;

        Ok(Self {
            config,
            ctx,
            channelizer,
            channels: HashMap::new(),
            last_scan: None,
            logger,
        })
    }

    pub fn channelizer_algorithm(&self) -> ChannelizerAlgorithm {
        self.channelizer.algorithm()
    }

    pub fn logger(&self) -> &SignalLogger {
        &self.logger
    }

    /// Samples-per-bit for the RDS subcarrier at this pipeline's decimated
    /// channel rate (`sample_rate / decimation_factor`).
    fn rds_samples_per_bit(&self) -> usize {
        let decimated_rate = self.config.sample_rate / self.channelizer.decimation_factor() as f64;
        (decimated_rate / RDS_BIT_RATE_HZ).round().max(1.0) as usize
    }

    /// Builds the per-channel downstream decoder: `RdsBitSync` when RDS is
    /// enabled, a no-op sink otherwise.
    fn make_downstream_decoder(&self) -> Box<dyn DownstreamDecoder> {
        if self.config.enable_rds {
            Box::new(RdsBitSync::new(self.rds_samples_per_bit()))
        } else {
            Box::new(NullDownstreamDecoder)
        }
    }

    /// Adds a channel manually; manually-added channels are never evicted
    /// for staleness. `strength` seeds `last_magnitude_db` until the next
    /// scan observes the channel directly.
    pub fn add_channel(&mut self, frequency_hz: i64, strength: f32) {
        if let Some(existing) = self.channels.get_mut(&frequency_hz) {
            existing.pinned = true;
            return;
        }
        let rds = self.make_downstream_decoder();
        self.channels.insert(
            frequency_hz,
            ChannelState {
                pinned: true,
                last_seen: Instant::now(),
                last_magnitude_db: strength,
                rds,
            },
        );
    }

    pub fn remove_channel(&mut self, frequency_hz: i64) -> bool {
        self.channels.remove(&frequency_hz).is_some()
    }

    pub fn clear_channels(&mut self) {
        self.channels.clear();
    }

    pub fn get_channels(&self) -> Vec<ChannelSummary> {
        let now = Instant::now();
        self.channels
            .iter()
            .map(|(&freq, state)| ChannelSummary {
                frequency_hz: freq,
                pinned: state.pinned,
                last_magnitude_db: state.last_magnitude_db,
                age: now.duration_since(state.last_seen),
            })
            .collect()
    }

    pub fn get_channel(&self, frequency_hz: i64) -> Option<ChannelSummary> {
        let state = self.channels.get(&frequency_hz)?;
        Some(ChannelSummary {
            frequency_hz,
            pinned: state.pinned,
            last_magnitude_db: state.last_magnitude_db,
            age: Instant::now().duration_since(state.last_seen),
        })
    }

    fn scan_is_due(&self) -> bool {
        match self.last_scan {
            None => true,
            Some(t) => t.elapsed() >= Duration::from_millis(self.config.scan_interval_ms),
        }
    }

    fn discover_new_channels(&mut self, i: &[f32], q: &[f32]) -> Result<(), SdrError> {
        let peaks = scanner::scan(
            i,
            q,
            self.config.sample_rate,
            self.config.center_frequency_hz as f64,
            &self.config.scan,
            &self.ctx,
            &mut self.logger,
        )?;

        for peak in peaks {
            let freq = peak.frequency_hz.round() as i64;
            let already_tracked = self.channels.keys().any(|&existing| {
                (existing - freq).unsigned_abs() as f64 <= self.config.scan.min_separation_hz
            });
            if already_tracked {
                continue;
            }
            let rds = self.make_downstream_decoder();
            self.channels.insert(
                freq,
                ChannelState {
                    pinned: false,
                    last_seen: Instant::now(),
                    last_magnitude_db: peak.magnitude_db,
                    rds,
                },
            );
        }
        self.last_scan = Some(Instant::now());
        Ok(())
    }

    fn evict_stale_channels(&mut self) {
        let timeout = Duration::from_millis(self.config.stale_channel_timeout_ms);
        let now = Instant::now();
        self.channels
            .retain(|_, state| state.pinned || now.duration_since(state.last_seen) < timeout);
    }

    /// Runs one processing step over a wideband block: (1) rescans for new
    /// stations if the scan interval has elapsed, (2) channelizes every
    /// tracked channel, (3) FM-discriminates each to produce audio and
    /// feeds it to the channel's downstream decoder, (4) refreshes
    /// `last_seen`/`last_magnitude_db` for channels that still carry
    /// signal, (5) evicts channels that have been stale longer than
    /// `stale_channel_timeout_ms`.
    pub fn process_wideband_samples(
        &mut self,
        i: &[f32],
        q: &[f32],
    ) -> Result<Vec<ChannelAudio>, SdrError> {
        if self.scan_is_due() {
            self.discover_new_channels(i, q)?;
        }

        let freqs: Vec<i64> = self.channels.keys().copied().collect();
        let fs = self.config.sample_rate;
        let fc = self.config.center_frequency_hz;

        let mut outputs = Vec::with_capacity(freqs.len());
        for freq in freqs {
            let channelized = self
                .channelizer
                .channelize_one(i, q, fs, fc, freq)
                .map_err(|e: ChannelizerError| SdrError::from(e))?;

            let Some((ci, cq)) = channelized else {
                continue;
            };

            let audio = fm_discriminate(&ci, &cq);

            let rds_stats = match self.channels.get_mut(&freq) {
                Some(state) => {
                    state.last_seen = Instant::now();
                    state.rds.feed(&audio)
                }
                None => DecoderStats::default(),
            };

            outputs.push(ChannelAudio {
                frequency_hz: freq,
                samples: audio,
                rds: rds_stats,
            });
        }

        self.evict_stale_channels();

        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_pipeline() -> FmPipeline {
        let config = PipelineConfig {
            sample_rate: 2_000_000.0,
            center_frequency_hz: 100_000_000,
            channel_bandwidth_hz: 200_000.0,
            ..Default::default()
        };
        FmPipeline::new(config).unwrap()
    }

    #[test]
    fn add_and_get_channel_round_trips() {
        let mut pipeline = make_pipeline();
        pipeline.add_channel(100_000_000, -30.0);
        let summary = pipeline.get_channel(100_000_000).unwrap();
        assert_eq!(summary.frequency_hz, 100_000_000);
        assert!(summary.pinned);
        assert_eq!(summary.last_magnitude_db, -30.0);
    }

    #[test]
    fn remove_channel_drops_it() {
        let mut pipeline = make_pipeline();
        pipeline.add_channel(100_000_000, -30.0);
        assert!(pipeline.remove_channel(100_000_000));
        assert!(pipeline.get_channel(100_000_000).is_none());
    }

    #[test]
    fn clear_channels_empties_the_set() {
        let mut pipeline = make_pipeline();
        pipeline.add_channel(100_000_000, -30.0);
        pipeline.add_channel(101_000_000, -30.0);
        pipeline.clear_channels();
        assert!(pipeline.get_channels().is_empty());
    }

    #[test]
    fn pinned_channel_survives_staleness_eviction() {
        let mut pipeline = make_pipeline();
        pipeline.config.stale_channel_timeout_ms = 0;
        pipeline.add_channel(100_000_000, -30.0);
        pipeline.evict_stale_channels();
        assert!(pipeline.get_channel(100_000_000).is_some());
    }

    #[test]
    fn process_wideband_samples_produces_audio_for_pinned_channel() {
        let mut pipeline = make_pipeline();
        pipeline.add_channel(100_000_000, -30.0);
        let n = 4096;
        let i = vec![1.0f32; n];
        let q = vec![0.0f32; n];
        let outputs = pipeline.process_wideband_samples(&i, &q).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].frequency_hz, 100_000_000);
    }

    #[test]
    fn out_of_range_pinned_channel_produces_no_output() {
        let mut pipeline = make_pipeline();
        pipeline.add_channel(100_000_000 + 50_000_000, -30.0);
        let n = 4096;
        let i = vec![0.0f32; n];
        let q = vec![0.0f32; n];
        let outputs = pipeline.process_wideband_samples(&i, &q).unwrap();
        assert!(outputs.is_empty());
    }

    #[test]
    fn rds_disabled_keeps_decoder_stats_at_zero() {
        let mut config = PipelineConfig {
            sample_rate: 2_000_000.0,
            center_frequency_hz: 100_000_000,
            channel_bandwidth_hz: 200_000.0,
            ..Default::default()
        };
        config.enable_rds = false;
        let mut pipeline = FmPipeline::new(config).unwrap();
        pipeline.add_channel(100_000_000, -30.0);

        let n = 4096;
        let i = vec![1.0f32; n];
        let q = vec![0.0f32; n];
        let outputs = pipeline.process_wideband_samples(&i, &q).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].rds, DecoderStats::default());
    }

    #[test]
    fn rds_samples_per_bit_matches_decimated_rate_over_bit_rate() {
        let pipeline = make_pipeline();
        // fs=2_000_000, cbw=200_000 -> decimation factor 10 -> decimated
        // rate 200_000 Hz; 200_000 / 1187.5 rounds to 168.
        assert_eq!(pipeline.rds_samples_per_bit(), 168);
    }

    #[test]
    fn rds_decoder_persists_and_stats_accumulate_across_calls() {
        let mut pipeline = make_pipeline();
        pipeline.add_channel(100_000_000, -30.0);

        let n = 4096;
        let i: Vec<f32> = (0..n).map(|k| (k as f32 * 0.1).cos()).collect();
        let q: Vec<f32> = (0..n).map(|k| (k as f32 * 0.1).sin()).collect();

        // The decoder lives inside the tracked ChannelState and must not be
        // rebuilt on every call, so its cumulative stats can only grow.
        let mut previous_groups = 0u64;
        for _ in 0..8 {
            let outputs = pipeline.process_wideband_samples(&i, &q).unwrap();
            let groups = outputs[0].rds.groups_seen;
            assert!(groups >= previous_groups, "group count must never regress between calls");
            previous_groups = groups;
        }
    }
}
