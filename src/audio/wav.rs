use crate::speech::{AudioFormat, EncodedAudio};
use crate::{ParleyError, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

/// Sample rate of raw PCM returned by the hosted speech endpoint
pub const PCM_SAMPLE_RATE: u32 = 24_000;

/// Size of a canonical RIFF/WAVE header
const CANONICAL_HEADER_LEN: usize = 44;

/// Decoded audio ready for playback or recording
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedAudio {
    /// Interleaved samples in -1.0..=1.0
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
    }
}

fn spec_for(sample_rate: u32, channels: u16) -> WavSpec {
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Encode mono samples as an in-memory 16-bit WAV file
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(CANONICAL_HEADER_LEN + samples.len() * 2);

    {
        let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec_for(sample_rate, 1))
            .map_err(|e| ParleyError::AudioProcessingError(format!("Failed to create WAV writer: {}", e)))?;

        for &sample in samples {
            writer
                .write_sample(to_i16(sample))
                .map_err(|e| ParleyError::AudioProcessingError(format!("Failed to write sample: {}", e)))?;
        }

        writer
            .finalize()
            .map_err(|e| ParleyError::AudioProcessingError(format!("Failed to finalize WAV: {}", e)))?;
    }

    Ok(bytes)
}

/// Decode an in-memory WAV file
///
/// Streamed WAV responses carry a placeholder data length, which hound
/// rejects once it reads past the end. Those fall back to reading every
/// byte after the header as 16-bit PCM.
pub fn decode_wav(bytes: &[u8]) -> Result<DecodedAudio> {
    match decode_with_hound(bytes) {
        Ok(audio) => Ok(audio),
        Err(e) => {
            debug!("Strict WAV decode failed ({}), trying streamed layout", e);
            decode_streamed_wav(bytes)
        }
    }
}

fn decode_with_hound(bytes: &[u8]) -> Result<DecodedAudio> {
    let mut reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| ParleyError::AudioProcessingError(format!("Invalid WAV data: {}", e)))?;

    let spec = reader.spec();
    let read_err = |e: hound::Error| ParleyError::AudioProcessingError(format!("Failed to read sample: {}", e));

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => reader.samples::<f32>().map(|s| s.map_err(read_err)).collect::<Result<_>>()?,
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / i16::MAX as f32).map_err(read_err))
            .collect::<Result<_>>()?,
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8_388_608.0).map_err(read_err))
            .collect::<Result<_>>()?,
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / i32::MAX as f32).map_err(read_err))
            .collect::<Result<_>>()?,
        (_, bits) => {
            return Err(ParleyError::AudioProcessingError(format!(
                "Unsupported bit depth: {}",
                bits
            )))
        }
    };

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    bytes.get(at..at + 2).map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn decode_streamed_wav(bytes: &[u8]) -> Result<DecodedAudio> {
    let invalid = || ParleyError::AudioProcessingError("Not a WAV stream".into());

    if bytes.get(0..4) != Some(b"RIFF".as_slice()) || bytes.get(8..12) != Some(b"WAVE".as_slice()) {
        return Err(invalid());
    }

    let mut channels = None;
    let mut sample_rate = None;
    let mut offset = 12;

    while let Some(id) = bytes.get(offset..offset + 4) {
        let len = read_u32(bytes, offset + 4).ok_or_else(invalid)? as usize;
        let body = offset + 8;

        if id == b"fmt " {
            let bits = read_u16(bytes, body + 14).ok_or_else(invalid)?;
            if bits != 16 {
                return Err(ParleyError::AudioProcessingError(format!(
                    "Unsupported streamed bit depth: {}",
                    bits
                )));
            }
            channels = read_u16(bytes, body + 2);
            sample_rate = read_u32(bytes, body + 4);
        } else if id == b"data" {
            let (channels, sample_rate) = channels.zip(sample_rate).ok_or_else(invalid)?;
            let end = body.saturating_add(len).min(bytes.len());
            return Ok(DecodedAudio {
                samples: decode_pcm16(&bytes[body..end]),
                sample_rate,
                channels,
            });
        }

        // Chunks are word aligned
        offset = body.saturating_add(len + (len & 1));
    }

    Err(invalid())
}

/// Convert raw 16-bit little-endian PCM to float samples
pub fn decode_pcm16(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / i16::MAX as f32)
        .collect()
}

/// Decode a fully drained utterance into samples
pub fn decode(audio: &EncodedAudio) -> Result<DecodedAudio> {
    match audio.format {
        AudioFormat::Wav => decode_wav(&audio.bytes),
        AudioFormat::Pcm => Ok(DecodedAudio {
            samples: decode_pcm16(&audio.bytes),
            sample_rate: PCM_SAMPLE_RATE,
            channels: 1,
        }),
        AudioFormat::Mp3 => {
            warn!("MP3 audio cannot be decoded locally");
            Err(ParleyError::AudioProcessingError(
                "MP3 decoding is not supported; request wav or pcm".into(),
            ))
        }
    }
}

/// Write audio samples to a WAV file
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32, channels: u16) -> Result<()> {
    let mut writer = WavWriter::create(path.as_ref(), spec_for(sample_rate, channels))
        .map_err(|e| ParleyError::IOError(format!("Failed to create WAV writer: {}", e)))?;

    for &sample in samples {
        writer
            .write_sample(to_i16(sample))
            .map_err(|e| ParleyError::IOError(format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| ParleyError::IOError(format!("Failed to finalize WAV file: {}", e)))?;

    info!("Wrote {} samples to WAV file: {:?}", samples.len(), path.as_ref());
    Ok(())
}

/// Read a WAV file from disk
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<DecodedAudio> {
    let bytes = std::fs::read(path.as_ref())?;
    decode_wav(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_encode_decode_in_memory() {
        let samples = sine(24_000, 2400);
        let bytes = encode_wav(&samples, 24_000).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");

        let audio = decode_wav(&bytes).unwrap();
        assert_eq!(audio.sample_rate, 24_000);
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.samples.len(), samples.len());
        for (original, read) in samples.iter().zip(audio.samples.iter()) {
            assert!((original - read).abs() < 0.001);
        }
    }

    #[test]
    fn test_decode_streamed_header() {
        let samples = sine(24_000, 480);
        let mut bytes = encode_wav(&samples, 24_000).unwrap();

        // Patch the sizes the way streaming servers emit them
        bytes[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
        bytes[40..44].copy_from_slice(&u32::MAX.to_le_bytes());

        let audio = decode_wav(&bytes).unwrap();
        assert_eq!(audio.sample_rate, 24_000);
        assert_eq!(audio.samples.len(), samples.len());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_wav(b"definitely not audio").is_err());
    }

    #[test]
    fn test_pcm_and_mp3_decoding() {
        let pcm = EncodedAudio::new(vec![0x00, 0x40, 0x00, 0xC0], AudioFormat::Pcm);
        let audio = decode(&pcm).unwrap();
        assert_eq!(audio.sample_rate, PCM_SAMPLE_RATE);
        assert_eq!(audio.samples.len(), 2);
        assert!(audio.samples[0] > 0.49 && audio.samples[1] < -0.49);

        let mp3 = EncodedAudio::new(vec![0xFF, 0xFB], AudioFormat::Mp3);
        assert!(matches!(decode(&mp3), Err(ParleyError::AudioProcessingError(_))));
    }

    #[test]
    fn test_write_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples = sine(16_000, 16_000);

        write_wav(&path, &samples, 16_000, 1).unwrap();
        let audio = read_wav(&path).unwrap();

        assert_eq!(audio.sample_rate, 16_000);
        assert_eq!(audio.samples.len(), samples.len());
        assert!((audio.duration_secs() - 1.0).abs() < 0.01);
    }
}
