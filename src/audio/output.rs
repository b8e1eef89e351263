use crate::audio::resampler::{resample_audio, to_mono};
use crate::audio::sink::AudioSink;
use crate::audio::wav::{decode, DecodedAudio};
use crate::debate::Turn;
use crate::speech::EncodedAudio;
use crate::{ParleyError, Result};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, StreamConfig};
use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// How often a blocking `play` checks whether the device drained the buffer
const DRAIN_POLL: Duration = Duration::from_millis(20);

/// Default output device
pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
}

impl AudioOutput {
    /// Open the default output device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| ParleyError::AudioDeviceError("No output device available".into()))?;

        info!("Using output device: {}", device.name().unwrap_or_else(|_| "Unknown".to_string()));

        let config = device
            .default_output_config()
            .map_err(|e| ParleyError::AudioDeviceError(format!("Failed to get output config: {}", e)))?
            .into();

        Ok(Self { device, config })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Play mono samples and block until the device has drained them
    pub fn play(&self, samples: &[f32], sample_rate: u32) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let resampled = resample_audio(samples, sample_rate, self.sample_rate(), 1)?;
        let buffer = Arc::new(Mutex::new(VecDeque::from(resampled)));
        let feed = Arc::clone(&buffer);
        let channels = self.config.channels as usize;

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut buf = feed.lock();
                    for frame in data.chunks_mut(channels) {
                        let sample = buf.pop_front().unwrap_or(0.0);
                        frame.fill(sample);
                    }
                },
                |err| error!("Audio output stream error: {}", err),
                None,
            )
            .map_err(|e| ParleyError::AudioDeviceError(format!("Failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| ParleyError::AudioDeviceError(format!("Failed to start output stream: {}", e)))?;

        debug!("Playing {:.1}s of audio", samples.len() as f32 / sample_rate as f32);

        while !buffer.lock().is_empty() {
            thread::sleep(DRAIN_POLL);
        }

        // Let the device flush its last period
        thread::sleep(DRAIN_POLL * 2);
        drop(stream);

        Ok(())
    }
}

struct PlaybackJob {
    samples: Vec<f32>,
    sample_rate: u32,
    done: oneshot::Sender<Result<()>>,
}

/// Serial speaker playback on a dedicated thread
///
/// cpal streams are not `Send` on every platform, so the output device
/// lives on its own thread and jobs are handed over one at a time.
#[derive(Clone)]
pub struct Player {
    job_tx: Sender<PlaybackJob>,
}

impl Player {
    pub fn start() -> Result<Self> {
        let (job_tx, job_rx) = bounded::<PlaybackJob>(4);
        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);

        thread::Builder::new()
            .name("audio-playback".into())
            .spawn(move || {
                let output = match AudioOutput::new() {
                    Ok(output) => {
                        let _ = ready_tx.send(Ok(()));
                        output
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                while let Ok(job) = job_rx.recv() {
                    let result = output.play(&job.samples, job.sample_rate);
                    if let Err(e) = &result {
                        warn!("Playback failed: {}", e);
                    }
                    let _ = job.done.send(result);
                }

                info!("Playback thread stopped");
            })
            .map_err(|e| ParleyError::AudioDeviceError(format!("Failed to spawn playback thread: {}", e)))?;

        ready_rx
            .recv()
            .map_err(|e| ParleyError::ChannelError(format!("Playback thread exited: {}", e)))??;

        Ok(Self { job_tx })
    }

    /// Play decoded audio, resolving once the device drained it
    pub async fn play(&self, audio: &DecodedAudio) -> Result<()> {
        let (done, finished) = oneshot::channel();
        let job = PlaybackJob {
            samples: to_mono(&audio.samples, audio.channels),
            sample_rate: audio.sample_rate,
            done,
        };

        self.job_tx
            .send(job)
            .map_err(|e| ParleyError::ChannelError(format!("Playback thread unavailable: {}", e)))?;

        finished
            .await
            .map_err(|_| ParleyError::ChannelError("Playback thread dropped a job".into()))?
    }
}

/// Sink that speaks each utterance through the [`Player`]
pub struct SpeakerSink {
    player: Player,
}

impl SpeakerSink {
    pub fn new(player: Player) -> Self {
        Self { player }
    }
}

#[async_trait]
impl AudioSink for SpeakerSink {
    async fn consume(&mut self, turn: &Turn, audio: &EncodedAudio) -> Result<()> {
        let decoded = decode(audio)?;
        debug!("Speaking turn {} ({})", turn.ordinal, turn.name);
        self.player.play(&decoded).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_output_creation() {
        // Headless CI machines have no output device
        if let Ok(output) = AudioOutput::new() {
            assert!(output.sample_rate() > 0);
            assert!(output.channels() > 0);
        }
    }

    #[test]
    fn test_empty_playback_returns_immediately() {
        if let Ok(output) = AudioOutput::new() {
            assert!(output.play(&[], 24_000).is_ok());
        }
    }
}
