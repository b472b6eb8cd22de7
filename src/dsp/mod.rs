//! Signal generation: the sample buffer, the expression synthesizer and the
//! one-call WAV renderer.
//!
//! The same code backs the editor (via WASM) and offline export.

pub mod buffer;
pub mod renderer;
pub mod synth;
