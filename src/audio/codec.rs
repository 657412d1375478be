//! PCM sample codec
//!
//! Converts the synthesis service's raw 16-bit little-endian mono PCM into
//! a normalized [`SampleBuffer`], and a buffer back into a canonical
//! 44-byte-header RIFF/WAVE file for export.

use thiserror::Error;

use super::buffer::SampleBuffer;

/// Size of the canonical PCM WAVE header
pub const WAV_HEADER_LEN: usize = 44;

const BYTES_PER_SAMPLE: usize = 2;
const BITS_PER_SAMPLE: u16 = 16;
const FMT_CHUNK_LEN: u32 = 16;
const FORMAT_PCM: u16 = 1;
const MONO: u16 = 1;

/// Errors raised while decoding raw PCM
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("PCM payload of {len} bytes is not a whole number of 16-bit samples")]
    Misaligned { len: usize },
}

/// Decode raw 16-bit signed little-endian mono PCM
///
/// Each integer `v` becomes `v / 32768.0`. No resampling or upmixing.
pub fn decode(bytes: &[u8], sample_rate: u32) -> Result<SampleBuffer, DecodeError> {
    if bytes.len() % BYTES_PER_SAMPLE != 0 {
        return Err(DecodeError::Misaligned { len: bytes.len() });
    }

    let samples: Vec<f32> = bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();

    Ok(SampleBuffer::new(samples, sample_rate))
}

/// Quantize one normalized sample to 16-bit
///
/// Negative values scale by 32768 and positive by 32767 so full scale in
/// either direction lands exactly on the i16 limits.
#[inline]
pub fn quantize(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0).round() as i16
    } else {
        (s * 32767.0).round() as i16
    }
}

/// Encode a buffer as a mono 16-bit PCM RIFF/WAVE byte stream
///
/// # Panics
///
/// If the data chunk would not fit the 32-bit RIFF size field. Buffers come
/// from decode or merge, so this is a programming error rather than input.
pub fn encode(buffer: &SampleBuffer) -> Vec<u8> {
    let data_len = buffer.len() * BYTES_PER_SAMPLE;
    assert!(
        data_len <= (u32::MAX as usize) - 36,
        "buffer of {} samples exceeds the WAVE size limit",
        buffer.len()
    );
    let data_len = data_len as u32;
    let sample_rate = buffer.sample_rate();

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);

    // RIFF chunk
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&MONO.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * BYTES_PER_SAMPLE as u32).to_le_bytes());
    out.extend_from_slice(&(BYTES_PER_SAMPLE as u16).to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for &sample in buffer.samples() {
        out.extend_from_slice(&quantize(sample).to_le_bytes());
    }

    debug_assert_eq!(out.len(), WAV_HEADER_LEN + data_len as usize);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::DEFAULT_SAMPLE_RATE;

    fn read_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn read_u16(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
    }

    #[test]
    fn test_decode_scales_by_32768() {
        let raw: Vec<u8> = [0i16, 16384, -32768, 32767, -1]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();

        let buffer = decode(&raw, DEFAULT_SAMPLE_RATE).unwrap();
        assert_eq!(buffer.len(), raw.len() / 2);
        assert_eq!(buffer.sample_rate(), DEFAULT_SAMPLE_RATE);
        assert_eq!(buffer.samples()[0], 0.0);
        assert_eq!(buffer.samples()[1], 0.5);
        assert_eq!(buffer.samples()[2], -1.0);
        assert_eq!(buffer.samples()[3], 32767.0 / 32768.0);
        assert_eq!(buffer.samples()[4], -1.0 / 32768.0);
    }

    #[test]
    fn test_decode_rejects_odd_length() {
        let err = decode(&[0, 1, 2], DEFAULT_SAMPLE_RATE).unwrap_err();
        assert_eq!(err, DecodeError::Misaligned { len: 3 });
    }

    #[test]
    fn test_decode_empty() {
        let buffer = decode(&[], DEFAULT_SAMPLE_RATE).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_quantize_is_asymmetric_and_clamped() {
        assert_eq!(quantize(-1.0), i16::MIN);
        assert_eq!(quantize(1.0), i16::MAX);
        assert_eq!(quantize(-4.0), i16::MIN);
        assert_eq!(quantize(7.5), i16::MAX);
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(0.5), 16384); // 16383.5 rounds away from zero
        assert_eq!(quantize(-0.5), -16384);
    }

    #[test]
    fn test_header_layout() {
        let buffer = SampleBuffer::new(vec![0.25; 10], 22_050);
        let wav = encode(&buffer);

        assert_eq!(wav.len(), WAV_HEADER_LEN + 20);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(read_u32(&wav, 4), 36 + 20);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(read_u32(&wav, 16), 16);
        assert_eq!(read_u16(&wav, 20), 1);
        assert_eq!(read_u16(&wav, 22), 1);
        assert_eq!(read_u32(&wav, 24), 22_050);
        assert_eq!(read_u32(&wav, 28), 44_100);
        assert_eq!(read_u16(&wav, 32), 2);
        assert_eq!(read_u16(&wav, 34), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(read_u32(&wav, 40), 20);
    }

    #[test]
    fn test_roundtrip_within_quantization_error() {
        let samples: Vec<f32> = (0..2_400)
            .map(|i| (i as f32 * 0.013).sin() * 0.9)
            .chain([-1.0, 1.0, 0.0, -0.000_01])
            .collect();
        let buffer = SampleBuffer::new(samples, DEFAULT_SAMPLE_RATE);

        let wav = encode(&buffer);
        let decoded = decode(&wav[WAV_HEADER_LEN..], DEFAULT_SAMPLE_RATE).unwrap();

        assert_eq!(decoded.len(), buffer.len());
        // Half a step of rounding plus the 32767/32768 scale mismatch on
        // the positive side.
        let tolerance = 1.6 / 32768.0;
        for (a, b) in buffer.samples().iter().zip(decoded.samples()) {
            assert!((a - b).abs() <= tolerance, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_decoded_pcm_reencodes_exactly_for_negative_values() {
        let raw: Vec<u8> = (-32768i32..0)
            .step_by(97)
            .flat_map(|v| (v as i16).to_le_bytes())
            .collect();
        let buffer = decode(&raw, DEFAULT_SAMPLE_RATE).unwrap();
        let wav = encode(&buffer);
        assert_eq!(&wav[WAV_HEADER_LEN..], raw.as_slice());
    }

    #[test]
    fn test_hound_reads_export() {
        let buffer = SampleBuffer::new(vec![0.0, 0.5, -0.5, 1.0, -1.0], DEFAULT_SAMPLE_RATE);
        let wav = encode(&buffer);

        let mut reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, vec![0, 16384, -16384, 32767, -32768]);
    }
}
