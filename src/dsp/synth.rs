//! Expression synthesizer: samples a compiled `F(t)` into an [`AudioBuffer`].

use std::time::Duration;

use crate::compiler::{self, SampleFunction};
use crate::config::SynthConfig;
use crate::error::{ConfigError, PhaseError};

use super::buffer::AudioBuffer;

/// Result of one synthesis run.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub buffer: AudioBuffer,
    /// Largest absolute value `F(t)` returned, before conversion to `f32`.
    pub peak: f64,
    /// Wall-clock time spent sampling. `None` where no clock is available (wasm).
    pub elapsed: Option<Duration>,
}

impl Synthesis {
    /// True when the signal exceeds `[-1, 1]` and will be clamped on export.
    pub fn is_clipping(&self) -> bool {
        self.peak > 1.0
    }
}

/// Turns expression text into audio at a fixed rate and channel count.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    config: SynthConfig,
}

impl Synthesizer {
    pub fn new(config: SynthConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Synthesizer { config })
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Compile `expression` and sample it for `period_ms` milliseconds.
    ///
    /// The expression may be a full body with `return` or a bare expression.
    pub fn synthesize(&self, expression: &str, period_ms: f64) -> Result<Synthesis, PhaseError> {
        let function = compiler::compile(expression)?;
        self.render(&function, period_ms)
    }

    /// Sample an already-compiled function.
    ///
    /// Each channel is evaluated independently from `t = 0`. The first
    /// evaluation error aborts the whole run; no partial buffer is returned.
    /// Values outside `[-1, 1]` are kept as-is and reported as clipping.
    pub fn render(&self, function: &SampleFunction, period_ms: f64) -> Result<Synthesis, PhaseError> {
        let timer = Timer::start();
        let len = self.config.frame_count(period_ms)?;
        let sample_rate = f64::from(self.config.sample_rate);

        let mut frame = Vec::with_capacity(function.slot_count());
        let mut peak = 0.0_f64;
        let mut channels = Vec::with_capacity(self.config.channels);
        for channel in 0..self.config.channels {
            let mut data = Vec::with_capacity(len);
            for x in 0..len {
                let t = x as f64 / sample_rate;
                let y = function.call_with_frame(t, &mut frame).inspect_err(|e| {
                    tracing::debug!(channel, frame = x, error = %e, "synthesis aborted");
                })?;
                peak = peak.max(y.abs());
                data.push(y as f32);
            }
            channels.push(data);
        }

        let buffer = AudioBuffer::new(self.config.sample_rate, channels)?;
        let elapsed = timer.elapsed();
        if peak > 1.0 {
            tracing::warn!(peak, "signal exceeds [-1, 1] and will clip on export");
        }
        tracing::debug!(
            channels = buffer.number_of_channels(),
            frames = len,
            sample_rate = self.config.sample_rate,
            elapsed_ms = elapsed.map(|d| d.as_secs_f64() * 1000.0),
            "synthesized buffer"
        );
        Ok(Synthesis { buffer, peak, elapsed })
    }
}

/// `std::time::Instant` panics on `wasm32-unknown-unknown`.
struct Timer {
    #[cfg(not(target_arch = "wasm32"))]
    start: std::time::Instant,
}

impl Timer {
    fn start() -> Self {
        Timer {
            #[cfg(not(target_arch = "wasm32"))]
            start: std::time::Instant::now(),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn elapsed(&self) -> Option<Duration> {
        Some(self.start.elapsed())
    }

    #[cfg(target_arch = "wasm32")]
    fn elapsed(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CompileError, EvalErrorKind};

    fn synth(sample_rate: u32) -> Synthesizer {
        Synthesizer::new(SynthConfig::with_sample_rate(sample_rate)).unwrap()
    }

    #[test]
    fn return_zero_gives_silent_stereo() {
        let result = synth(8000).synthesize("return 0;", 1000.0).unwrap();
        let buffer = &result.buffer;
        assert_eq!(buffer.number_of_channels(), 2);
        assert_eq!(buffer.len(), 8000);
        assert_eq!(buffer.sample_rate(), 8000);
        assert!(buffer.channels().iter().flatten().all(|&s| s == 0.0));
        assert_eq!(result.peak, 0.0);
        assert!(!result.is_clipping());
    }

    #[test]
    fn samples_at_x_over_sample_rate() {
        let result = synth(1000).synthesize("t", 10.0).unwrap();
        let expected: Vec<f32> = (0..10).map(|x| (x as f64 / 1000.0) as f32).collect();
        assert_eq!(result.buffer.channel(0).unwrap(), expected.as_slice());
        assert_eq!(result.buffer.channel(1).unwrap(), expected.as_slice());
    }

    #[test]
    fn length_follows_rounded_period() {
        let s = synth(44_100);
        for period in [1.0, 10.0, 33.3, 100.0, 250.5] {
            let result = s.synthesize("Math.sin(2 * Math.PI * 440 * t)", period).unwrap();
            let expected = (period / 1000.0 * 44_100.0_f64).round() as usize;
            for channel in result.buffer.channels() {
                assert_eq!(channel.len(), expected, "period {period}");
            }
        }
    }

    #[test]
    fn sine_peak_is_unity() {
        let result = synth(48_000).synthesize("Math.sin(440 * t * Math.PI * 2)", 100.0).unwrap();
        assert!(result.peak <= 1.0);
        assert!(result.peak > 0.99);
        assert!(!result.is_clipping());
    }

    #[test]
    fn clipping_is_reported_not_clamped() {
        let result = synth(8000).synthesize("1.5 * Math.sin(2 * Math.PI * 100 * t)", 20.0).unwrap();
        assert!(result.is_clipping());
        assert!(result.peak > 1.4);
        assert!(result.buffer.peak() > 1.4);
    }

    #[test]
    fn infinite_samples_render_and_clip() {
        let result = synth(8000).synthesize("1 / t", 10.0).unwrap();
        assert_eq!(result.buffer.len(), 80);
        assert_eq!(result.buffer.channel(0).unwrap()[0], f32::INFINITY);
        assert!(result.peak.is_infinite());
        assert!(result.is_clipping());

        let wav = crate::wav::encode_buffer(&result.buffer, 16).unwrap();
        assert_eq!(&wav[44..46], &[0xFF, 0x7F]);
    }

    #[test]
    fn nan_sample_aborts() {
        let err = synth(8000).synthesize("t == 0 ? 0 / t : 0", 10.0).unwrap_err();
        match err {
            PhaseError::Evaluation(e) => {
                assert_eq!(e.kind, EvalErrorKind::NotANumber);
                assert_eq!(e.t, 0.0);
            }
            other => panic!("Expected evaluation error, got {other:?}"),
        }
    }

    #[test]
    fn throw_after_half_second_aborts_everything() {
        let err = synth(8000)
            .synthesize("if (t > 0.5) throw 'too late'\nreturn 0", 1000.0)
            .unwrap_err();
        match err {
            PhaseError::Evaluation(e) => {
                assert_eq!(e.kind, EvalErrorKind::Thrown("too late".into()));
                assert!(e.t > 0.5);
            }
            other => panic!("Expected evaluation error, got {other:?}"),
        }
    }

    #[test]
    fn throw_outside_window_is_fine() {
        let result = synth(8000)
            .synthesize("if (t > 0.5) throw 'too late'\nreturn 0", 400.0)
            .unwrap();
        assert_eq!(result.buffer.len(), 3200);
    }

    #[test]
    fn compile_errors_surface() {
        let err = synth(8000).synthesize("Math.sin(", 100.0).unwrap_err();
        assert!(matches!(err, PhaseError::Compile(CompileError::Parse(_))));
    }

    #[test]
    fn zero_period_gives_empty_buffer() {
        let result = synth(8000).synthesize("1 / t", 0.0).unwrap();
        assert!(result.buffer.is_empty());
        assert_eq!(result.buffer.number_of_channels(), 2);
    }

    #[test]
    fn negative_period_is_rejected() {
        let err = synth(8000).synthesize("0", -5.0).unwrap_err();
        assert!(matches!(err, PhaseError::Config(ConfigError::InvalidPeriod(_))));
    }

    #[test]
    fn channel_count_is_configurable() {
        let s = Synthesizer::new(SynthConfig { sample_rate: 8000, channels: 3 }).unwrap();
        let result = s.synthesize("0.25", 10.0).unwrap();
        assert_eq!(result.buffer.number_of_channels(), 3);
        assert!(Synthesizer::new(SynthConfig { sample_rate: 8000, channels: 0 }).is_err());
    }

    #[test]
    fn elapsed_is_measured() {
        let result = synth(8000).synthesize("0", 10.0).unwrap();
        assert!(result.elapsed.is_some());
    }
}
