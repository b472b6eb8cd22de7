//! WAV renderer: expression text straight to a WAV byte buffer.

use crate::config::{EncodeConfig, SynthConfig};
use crate::error::PhaseError;
use crate::wav::encoder::{self, BitDepth};

use super::synth::Synthesizer;

/// Synthesize `expression` for `period_ms` and encode it at `bit_depth`.
///
/// The bit depth is checked before any sampling happens, so an unsupported
/// depth never costs a full synthesis pass.
pub fn render_wav(
    expression: &str,
    period_ms: f64,
    config: &SynthConfig,
    bit_depth: u16,
) -> Result<Vec<u8>, PhaseError> {
    BitDepth::try_from(bit_depth)?;
    let synthesis = Synthesizer::new(config.clone())?.synthesize(expression, period_ms)?;
    let wav = encoder::encode(
        synthesis.buffer.channels(),
        &EncodeConfig::new(config.sample_rate, bit_depth),
    )?;
    Ok(wav)
}
