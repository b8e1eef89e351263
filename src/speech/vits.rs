//! Local speech synthesis with sherpa-rs (VITS models)
//!
//! The sherpa engine is created on and owned by a dedicated worker thread.
//! Requests travel over a crossbeam channel and each carries a oneshot
//! sender for its reply, so callers on any runtime can await the result.

use crate::audio::wav::encode_wav;
use crate::config::VitsSettings;
use crate::speech::normalize::normalize_for_speech;
use crate::speech::synth::{AudioFormat, AudioStream, SpeechOptions, Synthesizer};
use crate::{ParleyError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use crossbeam_channel::{bounded, Sender};
use futures::StreamExt;
use sherpa_rs::tts::{VitsTts, VitsTtsConfig};
use std::collections::BTreeMap;
use std::path::Path;
use std::thread;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

const QUEUE_SIZE: usize = 16;

struct SynthesisJob {
    text: String,
    speaker_id: i32,
    speed: f32,
    reply: oneshot::Sender<Result<(Vec<f32>, u32)>>,
}

/// VITS synthesizer backed by a worker thread
pub struct VitsSynthesizer {
    job_tx: Sender<SynthesisJob>,
    voices: BTreeMap<String, i32>,
}

impl VitsSynthesizer {
    /// Check the model files and start the synthesis worker
    pub fn start(settings: &VitsSettings) -> Result<Self> {
        if settings.model_path.is_empty() {
            return Err(ParleyError::ConfigError("Model path is required".into()));
        }
        if settings.tokens_path.is_empty() {
            return Err(ParleyError::ConfigError("Tokens path is required".into()));
        }
        for path in [&settings.model_path, &settings.tokens_path] {
            if !Path::new(path).exists() {
                return Err(ParleyError::ModelLoadError(format!("File not found: {}", path)));
            }
        }

        let vits_config = VitsTtsConfig {
            model: settings.model_path.clone(),
            tokens: settings.tokens_path.clone(),
            lexicon: settings.lexicon_path.clone().unwrap_or_default(),
            data_dir: settings.data_dir.clone().unwrap_or_default(),
            ..Default::default()
        };

        let (job_tx, job_rx) = bounded::<SynthesisJob>(QUEUE_SIZE);

        thread::Builder::new()
            .name("vits-synth".into())
            .spawn(move || {
                info!("Loading VITS model from: {}", vits_config.model);
                let mut tts = VitsTts::new(vits_config);
                info!("VITS worker ready");

                while let Ok(job) = job_rx.recv() {
                    debug!("Synthesizing {} chars as speaker {}", job.text.len(), job.speaker_id);

                    let result = tts
                        .create(&job.text, job.speaker_id, job.speed)
                        .map(|audio| (audio.samples, audio.sample_rate as u32))
                        .map_err(|e| ParleyError::SynthesisFailure(format!("Synthesis failed: {}", e)));

                    if job.reply.send(result).is_err() {
                        warn!("Synthesis result dropped; requester went away");
                    }
                }

                info!("VITS worker stopped");
            })
            .map_err(|e| ParleyError::ModelLoadError(format!("Failed to spawn VITS worker: {}", e)))?;

        Ok(Self {
            job_tx,
            voices: settings.voices.clone(),
        })
    }

    /// Speaker id for a voice name; unknown voices fall back to speaker 0
    pub fn speaker_for(&self, voice: &str) -> i32 {
        match self.voices.get(voice) {
            Some(id) => *id,
            None => {
                warn!("Unknown voice '{}', using speaker 0", voice);
                0
            }
        }
    }
}

#[async_trait]
impl Synthesizer for VitsSynthesizer {
    async fn synthesize(&self, text: &str, options: &SpeechOptions) -> Result<AudioStream> {
        if options.format != AudioFormat::Wav {
            return Err(ParleyError::SynthesisFailure(format!(
                "local synthesis only produces wav, not {}",
                options.format.as_str()
            )));
        }

        let spoken = normalize_for_speech(text);
        debug!("Normalized {} chars to {} for VITS", text.len(), spoken.len());

        let (reply, result_rx) = oneshot::channel();
        let job = SynthesisJob {
            text: spoken,
            speaker_id: self.speaker_for(&options.voice),
            speed: options.speed,
            reply,
        };

        self.job_tx
            .send(job)
            .map_err(|e| ParleyError::ChannelError(format!("VITS worker unavailable: {}", e)))?;

        // Stays lazy: nothing is awaited until the caller polls the stream.
        let stream = async_stream::stream! {
            match result_rx.await {
                Ok(Ok((samples, sample_rate))) => {
                    if samples.is_empty() {
                        return;
                    }
                    yield encode_wav(&samples, sample_rate).map(Bytes::from);
                }
                Ok(Err(e)) => yield Err(e),
                Err(_) => {
                    error!("VITS worker dropped a request");
                    yield Err(ParleyError::SynthesisFailure("VITS worker stopped".into()));
                }
            }
        };

        Ok(stream.boxed())
    }

    fn name(&self) -> &str {
        "vits"
    }
}
