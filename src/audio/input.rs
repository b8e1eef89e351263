use crate::audio::resampler::to_mono;
use crate::{ParleyError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Default input device, delivering mono chunks at the device rate
///
/// The cpal stream is not `Send` on every platform, so an `AudioInput`
/// stays on the thread that opened it.
pub struct AudioInput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    capturing: Arc<AtomicBool>,
}

impl AudioInput {
    /// Open the default input device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| ParleyError::AudioDeviceError("No input device available".into()))?;

        info!("Using input device: {}", device.name().unwrap_or_else(|_| "Unknown".to_string()));

        let config = device
            .default_input_config()
            .map_err(|e| ParleyError::AudioDeviceError(format!("Failed to get input config: {}", e)))?
            .into();

        Ok(Self {
            device,
            config,
            stream: None,
            capturing: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Start sending mono sample chunks to `audio_tx`
    ///
    /// Chunks are dropped, not queued, when the receiver falls behind.
    pub fn start(&mut self, audio_tx: Sender<Vec<f32>>) -> Result<()> {
        if self.is_capturing() {
            warn!("Already capturing");
            return Ok(());
        }

        let channels = self.config.channels;
        let capturing = Arc::clone(&self.capturing);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !capturing.load(Ordering::Relaxed) {
                        return;
                    }
                    if let Err(e) = audio_tx.try_send(to_mono(data, channels)) {
                        debug!("Microphone chunk dropped: {}", e);
                    }
                },
                |err| error!("Audio input stream error: {}", err),
                None,
            )
            .map_err(|e| ParleyError::AudioDeviceError(format!("Failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| ParleyError::AudioDeviceError(format!("Failed to start input stream: {}", e)))?;

        self.capturing.store(true, Ordering::Relaxed);
        self.stream = Some(stream);

        info!("Microphone capture started at {} Hz", self.sample_rate());
        Ok(())
    }

    pub fn stop(&mut self) {
        self.capturing.store(false, Ordering::Relaxed);
        if self.stream.take().is_some() {
            info!("Microphone capture stopped");
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::Relaxed)
    }
}

impl Drop for AudioInput {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn test_capture_state() {
        // No input device on most CI machines
        if let Ok(mut input) = AudioInput::new() {
            assert!(input.sample_rate() > 0);
            assert!(!input.is_capturing());

            let (tx, _rx) = bounded(10);
            if input.start(tx).is_ok() {
                assert!(input.is_capturing());
                input.stop();
                assert!(!input.is_capturing());
            }
        }
    }
}
