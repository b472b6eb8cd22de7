//! Synthesis and encoding settings.
//!
//! Both structs deserialize from the camelCase JSON the editor front-end
//! sends (`{"sampleRate": 44100, "bitDepth": 24}`); missing fields take
//! their defaults.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Output rate used when none is configured.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;
/// Stereo, matching the playback surface.
pub const DEFAULT_CHANNELS: usize = 2;
pub const DEFAULT_BIT_DEPTH: u16 = 16;
/// Signal length the editor starts with.
pub const DEFAULT_PERIOD_MS: f64 = 100.0;

/// Settings for [`Synthesizer`](crate::dsp::synth::Synthesizer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SynthConfig {
    /// Samples per second of the generated buffer.
    pub sample_rate: u32,
    /// Number of channels; every channel gets its own evaluation pass.
    pub channels: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
        }
    }
}

impl SynthConfig {
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        SynthConfig {
            sample_rate,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SynthConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.channels == 0 {
            return Err(ConfigError::NoChannels);
        }
        Ok(())
    }

    /// Number of samples per channel for a signal of `period_ms` milliseconds.
    pub fn frame_count(&self, period_ms: f64) -> Result<usize, ConfigError> {
        if !period_ms.is_finite() || period_ms < 0.0 {
            return Err(ConfigError::InvalidPeriod(period_ms));
        }
        let frames = (period_ms / 1000.0 * f64::from(self.sample_rate)).round();
        if frames > usize::MAX as f64 {
            return Err(ConfigError::InvalidPeriod(period_ms));
        }
        Ok(frames as usize)
    }
}

/// Settings for the WAV encoder. The rate only goes into the header; no
/// resampling happens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EncodeConfig {
    pub sample_rate: u32,
    /// 8, 16, 24 or 32; anything else is rejected at encode time.
    pub bit_depth: u16,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        EncodeConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            bit_depth: DEFAULT_BIT_DEPTH,
        }
    }
}

impl EncodeConfig {
    pub fn new(sample_rate: u32, bit_depth: u16) -> Self {
        EncodeConfig { sample_rate, bit_depth }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let synth = SynthConfig::default();
        assert_eq!(synth.sample_rate, 48_000);
        assert_eq!(synth.channels, 2);
        let encode = EncodeConfig::default();
        assert_eq!(encode, EncodeConfig::new(48_000, 16));
    }

    #[test]
    fn json_uses_camel_case_and_defaults() {
        let synth = SynthConfig::from_json(r#"{"sampleRate": 8000}"#).unwrap();
        assert_eq!(synth, SynthConfig { sample_rate: 8000, channels: 2 });

        let encode = EncodeConfig::from_json(r#"{"bitDepth": 24}"#).unwrap();
        assert_eq!(encode, EncodeConfig::new(48_000, 24));

        let json = serde_json::to_string(&EncodeConfig::new(44_100, 8)).unwrap();
        assert_eq!(json, r#"{"sampleRate":44100,"bitDepth":8}"#);
    }

    #[test]
    fn invalid_json_and_values() {
        assert!(matches!(SynthConfig::from_json("{"), Err(ConfigError::Json(_))));
        assert!(matches!(
            SynthConfig::from_json(r#"{"sampleRate": 0}"#),
            Err(ConfigError::ZeroSampleRate)
        ));
        assert!(matches!(
            SynthConfig::from_json(r#"{"channels": 0}"#),
            Err(ConfigError::NoChannels)
        ));
    }

    #[test]
    fn frame_count_rounds() {
        let config = SynthConfig::with_sample_rate(8000);
        assert_eq!(config.frame_count(1000.0).unwrap(), 8000);
        assert_eq!(config.frame_count(0.0).unwrap(), 0);
        // 0.0625 ms * 8 samples/ms = 0.5 samples, rounds up
        assert_eq!(config.frame_count(0.0625).unwrap(), 1);
        let cd = SynthConfig::with_sample_rate(44_100);
        assert_eq!(cd.frame_count(100.0).unwrap(), 4410);
        assert_eq!(cd.frame_count(0.01).unwrap(), 0);
    }

    #[test]
    fn frame_count_rejects_bad_periods() {
        let config = SynthConfig::default();
        assert!(matches!(config.frame_count(-1.0), Err(ConfigError::InvalidPeriod(_))));
        assert!(matches!(config.frame_count(f64::NAN), Err(ConfigError::InvalidPeriod(_))));
        assert!(matches!(config.frame_count(f64::INFINITY), Err(ConfigError::InvalidPeriod(_))));
    }
}
