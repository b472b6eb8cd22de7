//! WAV export: a byte writer, the PCM encoder, and (with the `worker`
//! feature) a background encode task.

pub mod encoder;
#[cfg(feature = "worker")]
pub mod worker;
pub mod writer;

pub use encoder::{encode, encode_buffer, BitDepth, WavHeader, HEADER_LEN};

/// Media type for the encoded blob.
pub const WAV_MIME_TYPE: &str = "audio/wav";
