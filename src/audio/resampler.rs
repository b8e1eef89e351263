use crate::{ParleyError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Frames handed to rubato per call
const CHUNK_FRAMES: usize = 1024;

/// Sample rate converter for interleaved audio
///
/// Speech providers answer at their own rate (24 kHz hosted, 22.05 kHz for
/// most VITS voices) while recordings and output devices have theirs.
pub struct AudioResampler {
    resampler: SincFixedIn<f32>,
    input_rate: u32,
    output_rate: u32,
    channels: usize,
    /// Live input waiting for a full chunk
    pending: Vec<f32>,
}

impl AudioResampler {
    pub fn new(input_rate: u32, output_rate: u32, channels: u16) -> Result<Self> {
        if input_rate == 0 || output_rate == 0 {
            return Err(ParleyError::ConfigError(
                "Sample rates must be greater than 0".into(),
            ));
        }
        if channels == 0 {
            return Err(ParleyError::ConfigError(
                "Number of channels must be greater than 0".into(),
            ));
        }

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        let resampler = SincFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            2.0,
            params,
            CHUNK_FRAMES,
            channels as usize,
        )
        .map_err(|e| ParleyError::AudioProcessingError(format!("Failed to create resampler: {}", e)))?;

        debug!(
            "Created resampler: {} Hz -> {} Hz, {} channels",
            input_rate, output_rate, channels
        );

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
            channels: channels as usize,
            pending: Vec::new(),
        })
    }

    fn ratio(&self) -> f64 {
        self.output_rate as f64 / self.input_rate as f64
    }

    /// Resample one complete utterance, returning interleaved output
    ///
    /// The filter history is cleared first. `SincFixedIn` already starts half
    /// a filter length early, so the output lines up with the input; the tail
    /// is flushed with silence until `frames * ratio` frames are out.
    pub fn resample(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        self.resampler.reset();
        self.pending.clear();

        let chunk_size = self.resampler.input_frames_max();
        let total_frames = input.len() / self.channels;
        let expected = (total_frames as f64 * self.ratio()).round() as usize;
        let mut lanes: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + chunk_size); self.channels];
        let mut frame_offset = 0;

        while lanes[0].len() < expected {
            let frames_to_read = total_frames.saturating_sub(frame_offset).min(chunk_size);

            // SincFixedIn wants full chunks; past the end it gets silence
            let mut planar = vec![vec![0.0f32; chunk_size]; self.channels];
            for frame in 0..frames_to_read {
                let src = (frame_offset + frame) * self.channels;
                for (ch, lane) in planar.iter_mut().enumerate() {
                    lane[frame] = input[src + ch];
                }
            }

            let resampled = self
                .resampler
                .process(&planar, None)
                .map_err(|e| ParleyError::AudioProcessingError(format!("Resampling failed: {}", e)))?;

            for (lane, chunk) in lanes.iter_mut().zip(resampled) {
                lane.extend(chunk);
            }

            frame_offset += frames_to_read;
        }

        let mut output = Vec::with_capacity(expected * self.channels);
        for frame in 0..expected {
            for lane in &lanes {
                output.push(lane[frame]);
            }
        }

        debug!("Resampled {} frames -> {} frames", total_frames, expected);

        Ok(output)
    }

    /// Feed live audio in arbitrary slices
    ///
    /// Only whole chunks are converted; the remainder waits for the next
    /// call. Filter state carries over, so output is continuous across calls.
    /// The first chunk yields fewer frames while the filter fills.
    pub fn push(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        self.pending.extend_from_slice(input);

        let chunk_size = self.resampler.input_frames_max();
        let chunk_samples = chunk_size * self.channels;
        let mut output = Vec::new();

        while self.pending.len() >= chunk_samples {
            let mut planar = vec![vec![0.0f32; chunk_size]; self.channels];
            for (frame, samples) in self.pending[..chunk_samples].chunks(self.channels).enumerate() {
                for (lane, &sample) in planar.iter_mut().zip(samples) {
                    lane[frame] = sample;
                }
            }
            self.pending.drain(..chunk_samples);

            let resampled = self
                .resampler
                .process(&planar, None)
                .map_err(|e| ParleyError::AudioProcessingError(format!("Resampling failed: {}", e)))?;

            for frame in 0..resampled[0].len() {
                for lane in &resampled {
                    output.push(lane[frame]);
                }
            }
        }

        Ok(output)
    }

    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }
}

/// Resample in one step; a no-op when the rates already match
pub fn resample_audio(input: &[f32], input_rate: u32, output_rate: u32, channels: u16) -> Result<Vec<f32>> {
    if input_rate == output_rate {
        return Ok(input.to_vec());
    }

    AudioResampler::new(input_rate, output_rate, channels)?.resample(input)
}

/// Average interleaved channels down to mono
pub fn to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 | 1 => samples.to_vec(),
        n => samples
            .chunks(n as usize)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect(),
    }
}
