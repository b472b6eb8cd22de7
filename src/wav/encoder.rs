//! PCM-to-WAV encoder: interleaves float channels, quantizes them to the
//! requested bit depth and prepends the 44-byte RIFF/WAVE header.

use crate::config::EncodeConfig;
use crate::dsp::buffer::AudioBuffer;
use crate::error::EncodeError;

use super::writer::ByteWriter;

/// Size of the canonical RIFF + `fmt ` + `data` header.
pub const HEADER_LEN: usize = 44;
/// `fmt ` chunk body length for plain PCM.
const FMT_CHUNK_LEN: u32 = 16;
/// `WAVE_FORMAT_PCM`
const FORMAT_PCM: u16 = 1;

/// Supported sample widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    /// Unsigned, offset-binary (silence = 128).
    Eight,
    Sixteen,
    TwentyFour,
    ThirtyTwo,
}

impl BitDepth {
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
            BitDepth::TwentyFour => 24,
            BitDepth::ThirtyTwo => 32,
        }
    }

    pub fn bytes_per_sample(self) -> usize {
        usize::from(self.bits() / 8)
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = EncodeError;

    fn try_from(bits: u16) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            24 => Ok(BitDepth::TwentyFour),
            32 => Ok(BitDepth::ThirtyTwo),
            other => Err(EncodeError::UnsupportedBitDepth(other)),
        }
    }
}

/// Fields of the 44-byte header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub channels: u16,
    pub sample_rate: u32,
    pub bit_depth: BitDepth,
    /// Interleaved payload size in bytes.
    pub data_len: u32,
}

impl WavHeader {
    /// Bytes per frame (one sample for every channel). Saturates at
    /// `u16::MAX`; [`encode`] rejects layouts that would.
    pub fn block_align(&self) -> u16 {
        let bytes = u32::from(self.channels) * u32::from(self.bit_depth.bits() / 8);
        u16::try_from(bytes).unwrap_or(u16::MAX)
    }

    /// Saturates at `u32::MAX`.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate.saturating_mul(u32::from(self.block_align()))
    }

    /// RIFF chunk size: file length minus the 8-byte `RIFF` preamble.
    pub fn riff_len(&self) -> u32 {
        self.data_len.saturating_add(36)
    }

    pub fn write(&self, w: &mut ByteWriter) {
        w.write_tag(b"RIFF");
        w.write_u32_le(self.riff_len());
        w.write_tag(b"WAVE");

        // fmt chunk
        w.write_tag(b"fmt ");
        w.write_u32_le(FMT_CHUNK_LEN);
        w.write_u16_le(FORMAT_PCM);
        w.write_u16_le(self.channels);
        w.write_u32_le(self.sample_rate);
        w.write_u32_le(self.byte_rate());
        w.write_u16_le(self.block_align());
        w.write_u16_le(self.bit_depth.bits());

        // data chunk
        w.write_tag(b"data");
        w.write_u32_le(self.data_len);
    }
}

/// Clamp `sample` to `[-1, 1]` and scale it to the integer code for `depth`.
///
/// Scaling truncates toward zero and saturates, so `1.0` lands on the largest
/// positive code rather than wrapping. NaN is treated as silence.
pub fn quantize(sample: f32, depth: BitDepth) -> i32 {
    let s = if sample.is_nan() {
        0.0
    } else {
        f64::from(sample).clamp(-1.0, 1.0)
    };
    match depth {
        BitDepth::Eight => i32::from(((s + 1.0) * 128.0) as u8),
        BitDepth::Sixteen => i32::from((s * 32_768.0) as i16),
        BitDepth::TwentyFour => ((s * 8_388_608.0) as i32).clamp(-8_388_608, 8_388_607),
        BitDepth::ThirtyTwo => (s * 2_147_483_648.0) as i32,
    }
}

fn write_sample(w: &mut ByteWriter, sample: f32, depth: BitDepth) {
    let code = quantize(sample, depth);
    match depth {
        BitDepth::Eight => w.write_u8(code as u8),
        BitDepth::Sixteen => w.write_i16_le(code as i16),
        BitDepth::TwentyFour => w.write_i24_le(code),
        BitDepth::ThirtyTwo => w.write_i32_le(code),
    }
}

/// Encode `channels` as a complete WAV file.
///
/// The channel count written to the header is `channels.len()`. Samples
/// are interleaved frame by frame: channel 0, channel 1, … for frame 0,
/// then frame 1. The rate in `config` is written as-is; nothing is
/// resampled.
pub fn encode<C: AsRef<[f32]>>(channels: &[C], config: &EncodeConfig) -> Result<Vec<u8>, EncodeError> {
    let depth = BitDepth::try_from(config.bit_depth)?;
    let header = plan(channels, config.sample_rate, depth)?;

    let number_of_channels = channels.len();
    let bytes_per_sample = depth.bytes_per_sample();
    let frames = header.data_len as usize / (number_of_channels * bytes_per_sample);

    let mut w = ByteWriter::with_capacity(HEADER_LEN + header.data_len as usize);
    header.write(&mut w);
    for i in 0..frames {
        for (c, channel) in channels.iter().enumerate() {
            debug_assert_eq!(
                w.position(),
                HEADER_LEN + (i * number_of_channels + c) * bytes_per_sample
            );
            write_sample(&mut w, channel.as_ref()[i], depth);
        }
    }

    let blob = w.into_inner();
    tracing::debug!(
        channels = number_of_channels,
        frames,
        bit_depth = depth.bits(),
        sample_rate = config.sample_rate,
        bytes = blob.len(),
        "encoded wav"
    );
    Ok(blob)
}

/// Encode an [`AudioBuffer`] at its own sample rate.
pub fn encode_buffer(buffer: &AudioBuffer, bit_depth: u16) -> Result<Vec<u8>, EncodeError> {
    encode(buffer.channels(), &EncodeConfig::new(buffer.sample_rate(), bit_depth))
}

/// Validate the input shape and work out the header, before any bytes are written.
fn plan<C: AsRef<[f32]>>(channels: &[C], sample_rate: u32, depth: BitDepth) -> Result<WavHeader, EncodeError> {
    let Some(first) = channels.first() else {
        return Err(EncodeError::EmptyBuffer);
    };
    let frames = first.as_ref().len();
    if frames == 0 {
        return Err(EncodeError::EmptyBuffer);
    }
    if let Some((channel, data)) = channels
        .iter()
        .enumerate()
        .find(|(_, c)| c.as_ref().len() != frames)
    {
        return Err(EncodeError::MismatchedChannelLength {
            channel,
            expected: frames,
            found: data.as_ref().len(),
        });
    }
    if sample_rate == 0 {
        return Err(EncodeError::ZeroSampleRate);
    }

    let data_len = frames as u64 * channels.len() as u64 * depth.bytes_per_sample() as u64;
    let too_large = || EncodeError::TooLarge { bytes: data_len + HEADER_LEN as u64 };
    let channel_count = u16::try_from(channels.len()).map_err(|_| too_large())?;
    // Every size field in the header has a fixed width.
    let block_align = u64::from(channel_count) * depth.bytes_per_sample() as u64;
    let byte_rate = u64::from(sample_rate) * block_align;
    if block_align > u64::from(u16::MAX)
        || byte_rate > u64::from(u32::MAX)
        || data_len + 36 > u64::from(u32::MAX)
    {
        return Err(too_large());
    }

    Ok(WavHeader {
        channels: channel_count,
        sample_rate,
        bit_depth: depth,
        data_len: data_len as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    fn le_u16(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    #[test]
    fn wav_header_valid() {
        let wav = encode(&[vec![0.0_f32; 10], vec![0.0; 10]], &EncodeConfig::new(44_100, 16)).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(le_u32(&wav, 4), 36 + 40);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(le_u32(&wav, 16), 16);
        assert_eq!(le_u16(&wav, 20), 1);
        assert_eq!(le_u16(&wav, 22), 2);
        assert_eq!(le_u32(&wav, 24), 44_100);
        assert_eq!(le_u32(&wav, 28), 44_100 * 2 * 2);
        assert_eq!(le_u16(&wav, 32), 4);
        assert_eq!(le_u16(&wav, 34), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(le_u32(&wav, 40), 40);
        assert_eq!(wav.len(), 44 + 40);
    }

    #[test]
    fn header_fields_per_depth() {
        for (bits, bytes) in [(8u16, 1u32), (16, 2), (24, 3), (32, 4)] {
            let wav = encode(&vec![vec![0.0_f32; 5]; 3], &EncodeConfig::new(8000, bits)).unwrap();
            assert_eq!(le_u16(&wav, 22), 3);
            assert_eq!(le_u32(&wav, 28), 8000 * bytes * 3, "byte rate at {bits} bits");
            assert_eq!(le_u16(&wav, 32) as u32, bytes * 3, "block align at {bits} bits");
            assert_eq!(le_u16(&wav, 34), bits);
            assert_eq!(le_u32(&wav, 40), 5 * 3 * bytes);
            assert_eq!(wav.len() as u32, 44 + 5 * 3 * bytes);
        }
    }

    #[test]
    fn interleaves_channel_major_within_frame() {
        let left = vec![0.5_f32, -0.5];
        let right = vec![0.25_f32, -0.25];
        let wav = encode(&[left, right], &EncodeConfig::new(8000, 16)).unwrap();
        let samples: Vec<i16> = wav[44..]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(samples, vec![16_384, 8_192, -16_384, -8_192]);
    }

    #[test]
    fn sixteen_bit_boundaries() {
        let wav = encode(&[vec![1.0_f32, -1.0, 1.5, -3.0, 0.0]], &EncodeConfig::new(8000, 16)).unwrap();
        let data = &wav[44..];
        assert_eq!(&data[0..2], &[0xFF, 0x7F]);
        assert_eq!(&data[2..4], &[0x00, 0x80]);
        assert_eq!(&data[4..6], &data[0..2]);
        assert_eq!(&data[6..8], &data[2..4]);
        assert_eq!(&data[8..10], &[0, 0]);
    }

    #[test]
    fn eight_bit_is_offset_binary() {
        let wav = encode(&[vec![0.0_f32, -1.0, 1.0, 0.5, 2.0]], &EncodeConfig::new(8000, 8)).unwrap();
        assert_eq!(&wav[44..], &[128, 0, 255, 192, 255]);
    }

    #[test]
    fn twenty_four_bit_layout() {
        let wav = encode(&[vec![1.0_f32, -1.0, 0.5]], &EncodeConfig::new(8000, 24)).unwrap();
        assert_eq!(
            &wav[44..],
            &[0xFF, 0xFF, 0x7F, 0x00, 0x00, 0x80, 0x00, 0x00, 0x40]
        );
    }

    #[test]
    fn thirty_two_bit_layout() {
        let wav = encode(&[vec![1.0_f32, -1.0, -0.5]], &EncodeConfig::new(8000, 32)).unwrap();
        assert_eq!(
            &wav[44..],
            &[
                0xFF, 0xFF, 0xFF, 0x7F, // 1.0 saturates to i32::MAX
                0x00, 0x00, 0x00, 0x80, // -1.0 is i32::MIN
                0x00, 0x00, 0x00, 0xC0, // -0.5
            ]
        );
    }

    #[test]
    fn quantize_truncates_toward_zero() {
        // 0.1 * 32768 = 3276.8
        assert_eq!(quantize(0.1, BitDepth::Sixteen), 3276);
        assert_eq!(quantize(-0.1, BitDepth::Sixteen), -3276);
        assert_eq!(quantize(f32::NAN, BitDepth::Sixteen), 0);
        assert_eq!(quantize(f32::NAN, BitDepth::Eight), 128);
        assert_eq!(quantize(f32::INFINITY, BitDepth::TwentyFour), 8_388_607);
        assert_eq!(quantize(f32::NEG_INFINITY, BitDepth::ThirtyTwo), i32::MIN);
    }

    #[test]
    fn unsupported_bit_depth() {
        for bits in [0u16, 4, 12, 20, 64] {
            assert_eq!(
                encode(&[vec![0.0_f32; 4]], &EncodeConfig::new(8000, bits)),
                Err(EncodeError::UnsupportedBitDepth(bits))
            );
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        let none: [Vec<f32>; 0] = [];
        assert_eq!(encode(&none, &EncodeConfig::default()), Err(EncodeError::EmptyBuffer));
        assert_eq!(
            encode(&[Vec::<f32>::new(), Vec::new()], &EncodeConfig::default()),
            Err(EncodeError::EmptyBuffer)
        );
    }

    #[test]
    fn ragged_channels_are_rejected() {
        assert_eq!(
            encode(&[vec![0.0_f32; 4], vec![0.0; 3]], &EncodeConfig::default()),
            Err(EncodeError::MismatchedChannelLength {
                channel: 1,
                expected: 4,
                found: 3
            })
        );
    }

    #[test]
    fn zero_sample_rate_is_rejected() {
        assert_eq!(
            encode(&[vec![0.0_f32; 4]], &EncodeConfig::new(0, 16)),
            Err(EncodeError::ZeroSampleRate)
        );
    }

    #[test]
    fn too_many_channels() {
        let channels = vec![vec![0.0_f32]; usize::from(u16::MAX) + 1];
        assert!(matches!(
            encode(&channels, &EncodeConfig::new(8000, 8)),
            Err(EncodeError::TooLarge { .. })
        ));
    }

    #[test]
    fn block_align_overflow() {
        // 20_000 channels * 4 bytes does not fit the 16-bit block align field
        let channels = vec![vec![0.0_f32]; 20_000];
        assert!(matches!(
            encode(&channels, &EncodeConfig::new(8, 32)),
            Err(EncodeError::TooLarge { .. })
        ));
        assert!(encode(&channels, &EncodeConfig::new(8, 16)).is_ok());
    }

    #[test]
    fn wide_block_align_is_written_exactly() {
        // 10_000 * 4 bytes fits in 16 bits even though 10_000 * 32 bits does not
        let channels = vec![vec![0.0_f32]; 10_000];
        let wav = encode(&channels, &EncodeConfig::new(8, 32)).unwrap();
        assert_eq!(le_u16(&wav, 22), 10_000);
        assert_eq!(le_u16(&wav, 32), 40_000);
        assert_eq!(le_u32(&wav, 28), 320_000);
        assert_eq!(wav.len(), 44 + 40_000);
    }

    #[test]
    fn header_accessors_saturate() {
        let header = WavHeader {
            channels: u16::MAX,
            sample_rate: u32::MAX,
            bit_depth: BitDepth::ThirtyTwo,
            data_len: u32::MAX,
        };
        assert_eq!(header.block_align(), u16::MAX);
        assert_eq!(header.byte_rate(), u32::MAX);
        assert_eq!(header.riff_len(), u32::MAX);
    }

    #[test]
    fn byte_rate_overflow() {
        assert!(matches!(
            encode(&vec![vec![0.0_f32]; 2], &EncodeConfig::new(u32::MAX, 32)),
            Err(EncodeError::TooLarge { .. })
        ));
    }

    #[test]
    fn encodes_slices_and_buffers() {
        let data = [0.25_f32, -0.25];
        let from_slices = encode(&[&data[..], &data[..]], &EncodeConfig::new(8000, 16)).unwrap();
        let buffer = AudioBuffer::new(8000, vec![data.to_vec(), data.to_vec()]).unwrap();
        assert_eq!(encode_buffer(&buffer, 16).unwrap(), from_slices);
    }

    #[test]
    fn header_struct_matches_written_bytes() {
        let header = WavHeader {
            channels: 2,
            sample_rate: 48_000,
            bit_depth: BitDepth::TwentyFour,
            data_len: 600,
        };
        assert_eq!(header.block_align(), 6);
        assert_eq!(header.byte_rate(), 288_000);
        assert_eq!(header.riff_len(), 636);
        let mut w = ByteWriter::new();
        header.write(&mut w);
        assert_eq!(w.len(), HEADER_LEN);
    }
}
