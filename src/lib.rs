pub mod ast;
pub mod builtins;
pub mod compiler;
pub mod config;
pub mod dsp;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod token;
pub mod wav;

use crate::config::{EncodeConfig, SynthConfig};
use crate::dsp::synth::Synthesizer;
use crate::error::{CompileError, PhaseError};
use crate::lexer::Lexer;
use crate::parser::Parser;
use wasm_bindgen::prelude::*;

pub use crate::compiler::{compile, SampleFunction};
pub use crate::dsp::buffer::AudioBuffer;
pub use crate::dsp::renderer::render_wav;
pub use crate::dsp::synth::Synthesis;
pub use crate::wav::{encode, WAV_MIME_TYPE};
#[cfg(feature = "worker")]
pub use crate::wav::worker::{encode_in_background, spawn_encode, EncodeJob, EncodeRequest};

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name shown in diagnostics for editor-supplied expressions.
const SOURCE_NAME: &str = "F(t)";

/// WASM-exposed: return the phase-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Parse expression source into a `Program` AST.
pub fn parse(input: &str) -> Result<ast::Program, CompileError> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser::new(tokens);
    Ok(parser.parse_program()?)
}

/// Human-readable message for `err`; compile errors get a caret diagnostic
/// pointing into `source`.
pub fn describe_error(err: &PhaseError, source: &str) -> String {
    match err {
        PhaseError::Compile(e) => e.report(SOURCE_NAME, source),
        other => format!("{other}"),
    }
}

fn to_js(err: PhaseError, source: &str) -> JsValue {
    JsValue::from_str(&describe_error(&err, source))
}

fn synthesize(source: &str, period_ms: f64, config: SynthConfig) -> Result<Synthesis, PhaseError> {
    Synthesizer::new(config)?.synthesize(source, period_ms)
}

/// WASM-exposed: compile an expression without sampling it (editor linting).
#[wasm_bindgen]
pub fn check_expression(source: &str) -> Result<(), JsValue> {
    compile(source)
        .map(|_| ())
        .map_err(|e| to_js(e.into(), source))
}

/// WASM-exposed: synthesize and return channel 0 for plotting and
/// AudioWorklet playback.
#[wasm_bindgen]
pub fn synthesize_channel(source: &str, period_ms: f64, sample_rate: u32) -> Result<Vec<f32>, JsValue> {
    let synthesis = synthesize(source, period_ms, SynthConfig::with_sample_rate(sample_rate))
        .map_err(|e| to_js(e, source))?;
    let mut channels = synthesis.buffer.into_channels();
    Ok(channels.swap_remove(0))
}

/// WASM-exposed: synthesize every channel and return
/// `{ sampleRate, channels: [[...], ...] }`.
#[wasm_bindgen]
pub fn synthesize_buffer(
    source: &str,
    period_ms: f64,
    sample_rate: u32,
    channels: usize,
) -> Result<JsValue, JsValue> {
    let synthesis = synthesize(source, period_ms, SynthConfig { sample_rate, channels })
        .map_err(|e| to_js(e, source))?;
    serde_wasm_bindgen::to_value(&synthesis.buffer).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: synthesize an expression and encode it as a stereo WAV byte array.
#[wasm_bindgen]
pub fn render_expression_wav(
    source: &str,
    period_ms: f64,
    sample_rate: u32,
    bit_depth: u16,
) -> Result<Vec<u8>, JsValue> {
    render_wav(source, period_ms, &SynthConfig::with_sample_rate(sample_rate), bit_depth)
        .map_err(|e| to_js(e, source))
}

/// WASM-exposed: encode already-synthesized channels (a JS `Float32Array[]`)
/// as WAV. `settings` is `EncodeConfig` JSON, e.g. `{"bitDepth": 24}`.
#[wasm_bindgen]
pub fn encode_channels_wav(channels: JsValue, settings: &str) -> Result<Vec<u8>, JsValue> {
    let channels: Vec<Vec<f32>> =
        serde_wasm_bindgen::from_value(channels).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    let config = EncodeConfig::from_json(settings).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    encode(&channels, &config).map_err(|e| JsValue::from_str(&format!("{e}")))
}
