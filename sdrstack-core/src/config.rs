//! Top-level, `serde`-serializable configuration surface (§6) for the
//! multi-station FM pipeline and the runtime accelerator toggles.

use serde::{Deserialize, Serialize};

use crate::dsp::accel::AcceleratorToggles;
use crate::errors::ConfigError;
use crate::pipeline::PipelineConfig;
use crate::scanner::ScanConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfigSpec {
    pub fft_size: usize,
    pub threshold_db: f32,
    pub auto_threshold: bool,
    pub threshold_db_offset: f32,
    pub max_stations: usize,
    pub min_separation_hz: f64,
    pub min_valley_depth_db: f32,
}

impl Default for ScanConfigSpec {
    fn default() -> Self {
        ScanConfig::default().into()
    }
}

impl From<ScanConfig> for ScanConfigSpec {
    fn from(c: ScanConfig) -> Self {
        Self {
            fft_size: c.fft_size,
            threshold_db: c.threshold_db,
            auto_threshold: c.auto_threshold,
            threshold_db_offset: c.threshold_db_offset,
            max_stations: c.max_stations,
            min_separation_hz: c.min_separation_hz,
            min_valley_depth_db: c.min_valley_depth_db,
        }
    }
}

impl From<ScanConfigSpec> for ScanConfig {
    fn from(s: ScanConfigSpec) -> Self {
        ScanConfig {
            fft_size: s.fft_size,
            threshold_db: s.threshold_db,
            auto_threshold: s.auto_threshold,
            threshold_db_offset: s.threshold_db_offset,
            max_stations: s.max_stations,
            min_separation_hz: s.min_separation_hz,
            min_valley_depth_db: s.min_valley_depth_db,
        }
    }
}

/// Runtime accelerator toggles (§9 "Runtime accelerator selection"),
/// serializable for config-file round-tripping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AccelerationConfig {
    pub enabled: bool,
    pub validate: bool,
}

impl Default for AccelerationConfig {
    fn default() -> Self {
        let toggles = AcceleratorToggles::default();
        Self {
            enabled: toggles.enabled,
            validate: toggles.validate,
        }
    }
}

impl From<AccelerationConfig> for AcceleratorToggles {
    fn from(c: AccelerationConfig) -> Self {
        AcceleratorToggles {
            enabled: c.enabled,
            validate: c.validate,
        }
    }
}

/// Full pipeline configuration surface, matching §6's field list with
/// defaults. This is the shape read from / written to a config file by the
/// embedding binary; [`PipelineConfig`] is the in-process type the pipeline
/// itself is constructed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdrStackConfig {
    pub sample_rate: f64,
    pub center_frequency_hz: i64,
    pub channel_bandwidth_hz: f64,
    pub enable_rds: bool,
    pub scan: ScanConfigSpec,
    pub scan_interval_ms: u64,
    pub stale_channel_timeout_ms: u64,
    pub use_pfb_channelizer: bool,
    pub use_worker_fft: bool,
    pub taps_per_phase: usize,
    pub acceleration: AccelerationConfig,
}

impl Default for SdrStackConfig {
    fn default() -> Self {
        let pipeline = PipelineConfig::default();
        Self {
            sample_rate: pipeline.sample_rate,
            center_frequency_hz: pipeline.center_frequency_hz,
            channel_bandwidth_hz: pipeline.channel_bandwidth_hz,
            enable_rds: pipeline.enable_rds,
            scan: pipeline.scan.into(),
            scan_interval_ms: pipeline.scan_interval_ms,
            stale_channel_timeout_ms: pipeline.stale_channel_timeout_ms,
            use_pfb_channelizer: pipeline.use_pfb_channelizer,
            use_worker_fft: pipeline.use_worker_fft,
            taps_per_phase: pipeline.taps_per_phase,
            acceleration: AccelerationConfig::default(),
        }
    }
}

impl SdrStackConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate { rate: self.sample_rate });
        }
        if self.channel_bandwidth_hz <= 0.0 {
            return Err(ConfigError::InvalidChannelBandwidth {
                bandwidth: self.channel_bandwidth_hz,
            });
        }
        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            sample_rate: self.sample_rate,
            center_frequency_hz: self.center_frequency_hz,
            channel_bandwidth_hz: self.channel_bandwidth_hz,
            enable_rds: self.enable_rds,
            scan: self.scan.clone().into(),
            scan_interval_ms: self.scan_interval_ms,
            stale_channel_timeout_ms: self.stale_channel_timeout_ms,
            use_pfb_channelizer: self.use_pfb_channelizer,
            use_worker_fft: self.use_worker_fft,
            taps_per_phase: self.taps_per_phase,
        }
    }

    pub fn accelerator_toggles(&self) -> AcceleratorToggles {
        self.acceleration.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(SdrStackConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_sample_rate() {
        let mut config = SdrStackConfig::default();
        config.sample_rate = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSampleRate { .. })
        ));
    }

    #[test]
    fn rejects_non_positive_channel_bandwidth() {
        let mut config = SdrStackConfig::default();
        config.channel_bandwidth_hz = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidChannelBandwidth { .. })
        ));
    }

    #[test]
    fn round_trips_through_json() {
        let config = SdrStackConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let decoded: SdrStackConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.sample_rate, config.sample_rate);
        assert_eq!(decoded.acceleration.enabled, config.acceleration.enabled);
    }

    #[test]
    fn pipeline_config_carries_scan_settings() {
        let config = SdrStackConfig::default();
        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.scan.fft_size, config.scan.fft_size);
    }
}
