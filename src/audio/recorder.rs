//! Session recording to a single WAV file

use crate::audio::resampler::{resample_audio, to_mono};
use crate::audio::sink::AudioSink;
use crate::audio::wav::decode;
use crate::debate::Turn;
use crate::speech::EncodedAudio;
use crate::{ParleyError, Result};
use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Appends every utterance of a session to one mono recording
///
/// Utterances are decoded, downmixed and resampled to the recording rate.
/// The file header is only valid after [`Recorder::close`] (or `finish`).
pub struct Recorder {
    path: PathBuf,
    sample_rate: u32,
    writer: Option<WavWriter<BufWriter<File>>>,
    samples_written: usize,
}

impl Recorder {
    /// Create (or truncate) the recording at `path`
    pub fn create(path: impl AsRef<Path>, sample_rate: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let writer = WavWriter::create(&path, spec)
            .map_err(|e| ParleyError::IOError(format!("Failed to create recording {:?}: {}", path, e)))?;

        info!("Recording session to {:?} at {} Hz", path, sample_rate);

        Ok(Self {
            path,
            sample_rate,
            writer: Some(writer),
            samples_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn samples_written(&self) -> usize {
        self.samples_written
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples_written as f32 / self.sample_rate as f32
    }

    /// Append interleaved samples captured at `sample_rate`
    pub fn append(&mut self, samples: &[f32], sample_rate: u32, channels: u16) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ParleyError::IOError("Recording already closed".into()))?;

        let mono = to_mono(samples, channels);
        let resampled = resample_audio(&mono, sample_rate, self.sample_rate, 1)?;

        for &sample in &resampled {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(value)
                .map_err(|e| ParleyError::IOError(format!("Failed to write recording: {}", e)))?;
        }

        self.samples_written += resampled.len();
        debug!("Recorded {} samples ({:.1}s total)", resampled.len(), self.duration_secs());
        Ok(())
    }

    /// Finalize the WAV header; later calls are no-ops
    pub fn close(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer
                .finalize()
                .map_err(|e| ParleyError::IOError(format!("Failed to finalize recording: {}", e)))?;
            info!(
                "Saved recording to {:?} ({:.1}s)",
                self.path,
                self.duration_secs()
            );
        }
        Ok(())
    }
}

#[async_trait]
impl AudioSink for Recorder {
    async fn consume(&mut self, turn: &Turn, audio: &EncodedAudio) -> Result<()> {
        let decoded = decode(audio)?;
        debug!("Recording turn {} ({})", turn.ordinal, turn.name);
        self.append(&decoded.samples, decoded.sample_rate, decoded.channels)
    }

    async fn finish(&mut self) -> Result<()> {
        self.close()
    }
}
