//! Off-thread encoding so a large export does not block the caller.
//!
//! The request owns its sample data; it is moved to a blocking task and the
//! caller gets the finished bytes (or the encode error) back through
//! [`EncodeJob::join`].

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::EncodeConfig;
use crate::dsp::buffer::AudioBuffer;
use crate::error::EncodeError;

use super::encoder;

/// Everything the encoder needs, owned so it can cross threads.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeRequest {
    pub channels: Vec<Vec<f32>>,
    pub config: EncodeConfig,
}

impl EncodeRequest {
    pub fn new(channels: Vec<Vec<f32>>, config: EncodeConfig) -> Self {
        EncodeRequest { channels, config }
    }

    /// Take over a buffer's channels, keeping its sample rate.
    pub fn from_buffer(buffer: AudioBuffer, bit_depth: u16) -> Self {
        let config = EncodeConfig::new(buffer.sample_rate(), bit_depth);
        EncodeRequest {
            channels: buffer.into_channels(),
            config,
        }
    }

    fn run(self) -> Result<Vec<u8>, EncodeError> {
        encoder::encode(&self.channels, &self.config)
    }
}

/// A pending encode. Dropping it detaches the task; the result is discarded.
#[derive(Debug)]
pub struct EncodeJob {
    handle: JoinHandle<Result<Vec<u8>, EncodeError>>,
}

impl EncodeJob {
    /// Wait for the encoded bytes.
    pub async fn join(self) -> Result<Vec<u8>, EncodeError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "encode worker did not complete");
                Err(EncodeError::WorkerFailed(e.to_string()))
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Start encoding `request` on the runtime's blocking pool.
///
/// Fails with [`EncodeError::WorkerFailed`] when called outside a tokio
/// runtime.
pub fn spawn_encode(request: EncodeRequest) -> Result<EncodeJob, EncodeError> {
    let runtime = Handle::try_current().map_err(|e| EncodeError::WorkerFailed(e.to_string()))?;
    tracing::debug!(
        channels = request.channels.len(),
        bit_depth = request.config.bit_depth,
        "spawning encode worker"
    );
    let handle = runtime.spawn_blocking(move || request.run());
    Ok(EncodeJob { handle })
}

/// Encode on the blocking pool and wait for the result.
pub async fn encode_in_background(
    channels: Vec<Vec<f32>>,
    config: EncodeConfig,
) -> Result<Vec<u8>, EncodeError> {
    spawn_encode(EncodeRequest::new(channels, config))?.join().await
}
