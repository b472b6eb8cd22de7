//! Decode encoder output with `hound` to check it is a well-formed WAV
//! file that an independent reader agrees with.

use std::io::Cursor;

use hound::{SampleFormat, WavReader};
use phase_core::config::{EncodeConfig, SynthConfig};
use phase_core::dsp::synth::Synthesizer;
use phase_core::wav::encode;

fn reader(bytes: &[u8]) -> WavReader<Cursor<&[u8]>> {
    WavReader::new(Cursor::new(bytes)).expect("hound rejected the header")
}

fn stereo_ramp() -> Vec<Vec<f32>> {
    let left = vec![0.0_f32, 0.5, -0.5, 1.0, -1.0];
    let right = vec![0.25_f32, -0.25, 0.75, -0.75, 0.0];
    vec![left, right]
}

#[test]
fn sixteen_bit_decodes() {
    let wav = encode(&stereo_ramp(), &EncodeConfig::new(44_100, 16)).unwrap();
    let mut r = reader(&wav);
    let spec = r.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 44_100);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, SampleFormat::Int);
    assert_eq!(r.duration(), 5);

    let samples: Vec<i16> = r.samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(
        samples,
        vec![0, 8192, 16384, -8192, -16384, 24576, 32767, -24576, -32768, 0]
    );
}

#[test]
fn eight_bit_decodes() {
    let wav = encode(&stereo_ramp(), &EncodeConfig::new(8000, 8)).unwrap();
    let mut r = reader(&wav);
    assert_eq!(r.spec().bits_per_sample, 8);
    // hound removes the 128 offset
    let samples: Vec<i8> = r.samples::<i8>().map(Result::unwrap).collect();
    assert_eq!(samples, vec![0, 32, 64, -32, -64, 96, 127, -96, -128, 0]);
}

#[test]
fn twenty_four_bit_decodes() {
    let wav = encode(&stereo_ramp(), &EncodeConfig::new(48_000, 24)).unwrap();
    let mut r = reader(&wav);
    assert_eq!(r.spec().bits_per_sample, 24);
    let samples: Vec<i32> = r.samples::<i32>().map(Result::unwrap).collect();
    assert_eq!(samples[1], 2_097_152);
    assert_eq!(samples[6], 8_388_607);
    assert_eq!(samples[8], -8_388_608);
}

#[test]
fn thirty_two_bit_decodes() {
    let wav = encode(&stereo_ramp(), &EncodeConfig::new(96_000, 32)).unwrap();
    let mut r = reader(&wav);
    assert_eq!(r.spec().bits_per_sample, 32);
    assert_eq!(r.spec().sample_rate, 96_000);
    let samples: Vec<i32> = r.samples::<i32>().map(Result::unwrap).collect();
    assert_eq!(samples[2], 1_073_741_824);
    assert_eq!(samples[6], i32::MAX);
    assert_eq!(samples[8], i32::MIN);
}

#[test]
fn synthesized_silence_round_trips() {
    let synth = Synthesizer::new(SynthConfig::with_sample_rate(8000)).unwrap();
    let synthesis = synth.synthesize("return 0;", 1000.0).unwrap();
    let wav = encode(synthesis.buffer.channels(), &EncodeConfig::new(8000, 16)).unwrap();
    assert_eq!(wav.len(), 32_044);

    let mut r = reader(&wav);
    assert_eq!(r.len(), 16_000);
    assert!(r.samples::<i16>().map(Result::unwrap).all(|s| s == 0));
}

#[test]
fn mono_sine_has_expected_shape() {
    let config = SynthConfig { sample_rate: 8000, channels: 1 };
    let synthesis = Synthesizer::new(config)
        .unwrap()
        .synthesize("Math.sin(2 * Math.PI * 1000 * t)", 1.0)
        .unwrap();
    let wav = encode(synthesis.buffer.channels(), &EncodeConfig::new(8000, 16)).unwrap();

    let mut r = reader(&wav);
    assert_eq!(r.spec().channels, 1);
    let samples: Vec<i16> = r.samples::<i16>().map(Result::unwrap).collect();
    // 8 samples per cycle; the quarter-cycle sample is the peak
    assert_eq!(samples.len(), 8);
    assert_eq!(samples[0], 0);
    assert!(samples[2] > 32_700);
    assert!(samples[6] < -32_700);
}
