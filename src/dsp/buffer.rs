//! The multi-channel sample buffer handed from the synthesizer to playback,
//! plotting and the encoder.

use serde::Serialize;

use crate::error::BufferError;

/// Equal-length `f32` channels at a fixed sample rate.
///
/// Immutable once built; hand it off with [`AudioBuffer::into_channels`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Build a buffer, checking there is at least one channel, all channels
    /// have the same length, and the rate is non-zero. Zero-length channels
    /// are allowed.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self, BufferError> {
        if sample_rate == 0 {
            return Err(BufferError::ZeroSampleRate);
        }
        let Some(first) = channels.first() else {
            return Err(BufferError::NoChannels);
        };
        let expected = first.len();
        if let Some((channel, data)) = channels.iter().enumerate().find(|(_, c)| c.len() != expected) {
            return Err(BufferError::MismatchedChannelLength {
                channel,
                expected,
                found: data.len(),
            });
        }
        Ok(AudioBuffer { sample_rate, channels })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn number_of_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length in seconds, derived from `len / sample_rate`.
    pub fn duration(&self) -> f64 {
        self.len() as f64 / f64::from(self.sample_rate)
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Largest absolute sample across every channel (`0.0` when empty).
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flatten()
            .fold(0.0_f32, |peak, s| peak.max(s.abs()))
    }

    /// True when any sample lies outside `[-1, 1]`.
    pub fn is_clipping(&self) -> bool {
        self.peak() > 1.0
    }

    /// Give up the buffer and take ownership of its channel data.
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let buffer = AudioBuffer::new(8000, vec![vec![0.0, 0.5, -1.5, 0.25]; 2]).unwrap();
        assert_eq!(buffer.sample_rate(), 8000);
        assert_eq!(buffer.number_of_channels(), 2);
        assert_eq!(buffer.len(), 4);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.duration(), 0.0005);
        assert_eq!(buffer.channel(1), Some(&[0.0, 0.5, -1.5, 0.25][..]));
        assert_eq!(buffer.channel(2), None);
        assert_eq!(buffer.peak(), 1.5);
        assert!(buffer.is_clipping());
    }

    #[test]
    fn duration_tracks_length() {
        let buffer = AudioBuffer::new(48_000, vec![vec![0.0; 4800]]).unwrap();
        assert_eq!(buffer.duration(), 0.1);
    }

    #[test]
    fn empty_channels_are_allowed() {
        let buffer = AudioBuffer::new(8000, vec![Vec::new(), Vec::new()]).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.peak(), 0.0);
        assert_eq!(buffer.duration(), 0.0);
    }

    #[test]
    fn rejects_invalid_shapes() {
        assert_eq!(AudioBuffer::new(8000, Vec::new()), Err(BufferError::NoChannels));
        assert_eq!(AudioBuffer::new(0, vec![vec![0.0]]), Err(BufferError::ZeroSampleRate));
        assert_eq!(
            AudioBuffer::new(8000, vec![vec![0.0; 3], vec![0.0; 3], vec![0.0; 2]]),
            Err(BufferError::MismatchedChannelLength {
                channel: 2,
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn serializes_camel_case() {
        let buffer = AudioBuffer::new(8000, vec![vec![0.5]]).unwrap();
        let json = serde_json::to_string(&buffer).unwrap();
        assert_eq!(json, r#"{"sampleRate":8000,"channels":[[0.5]]}"#);
    }

    #[test]
    fn into_channels_moves_data() {
        let buffer = AudioBuffer::new(8000, vec![vec![0.1, 0.2], vec![0.3, 0.4]]).unwrap();
        let channels = buffer.into_channels();
        assert_eq!(channels, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }
}
