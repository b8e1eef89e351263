//! Local transcription with whisper.cpp via whisper-rs
//!
//! The whisper context is loaded on and owned by a worker thread, the same
//! way the VITS synthesizer is; requests carry a oneshot for the reply.

use crate::config::{ListenSettings, WhisperSettings};
use crate::speech::transcribe::Transcriber;
use crate::{ParleyError, Result};
use async_trait::async_trait;
use crossbeam_channel::{bounded, Sender};
use std::thread;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

const QUEUE_SIZE: usize = 8;

struct TranscriptionJob {
    samples: Vec<f32>,
    reply: oneshot::Sender<Result<String>>,
}

struct WhisperEngine {
    context: WhisperContext,
    n_threads: i32,
    language: Option<String>,
}

impl WhisperEngine {
    fn load(settings: &WhisperSettings, language: Option<String>) -> Result<Self> {
        info!("Loading Whisper model from: {:?}", settings.model_path);

        let path = settings
            .model_path
            .to_str()
            .ok_or_else(|| ParleyError::ModelLoadError("Invalid model path".to_string()))?;

        let context = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| ParleyError::ModelLoadError(format!("Failed to load Whisper model: {:?}", e)))?;

        info!("Whisper model loaded");
        Ok(Self {
            context,
            n_threads: settings.n_threads,
            language,
        })
    }

    fn transcribe(&self, samples: &[f32]) -> Result<String> {
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.n_threads);
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        if let Some(language) = &self.language {
            params.set_language(Some(language.as_str()));
        }

        let mut state = self
            .context
            .create_state()
            .map_err(|e| ParleyError::TranscriptionError(format!("Failed to create state: {:?}", e)))?;

        state
            .full(params, samples)
            .map_err(|e| ParleyError::TranscriptionError(format!("Transcription failed: {:?}", e)))?;

        let segments = state
            .full_n_segments()
            .map_err(|e| ParleyError::TranscriptionError(format!("Failed to get segments: {:?}", e)))?;

        let mut text = String::new();
        for i in 0..segments {
            let segment = state.full_get_segment_text(i).map_err(|e| {
                ParleyError::TranscriptionError(format!("Failed to get segment text: {:?}", e))
            })?;
            text.push_str(&segment);
        }

        Ok(text.trim().to_string())
    }
}

/// Whisper transcriber backed by a worker thread
pub struct WhisperTranscriber {
    job_tx: Sender<TranscriptionJob>,
}

impl WhisperTranscriber {
    /// Check the model file and start the transcription worker
    pub fn start(listen: &ListenSettings) -> Result<Self> {
        let settings = listen.whisper.clone();
        if !settings.model_path.exists() {
            return Err(ParleyError::ModelLoadError(format!(
                "Model file not found: {:?}",
                settings.model_path
            )));
        }

        let language = listen.language.clone();
        let (job_tx, job_rx) = bounded::<TranscriptionJob>(QUEUE_SIZE);

        thread::Builder::new()
            .name("whisper-stt".into())
            .spawn(move || {
                let engine = match WhisperEngine::load(&settings, language) {
                    Ok(engine) => engine,
                    Err(e) => {
                        error!("Failed to initialize Whisper engine: {}", e);
                        while let Ok(job) = job_rx.recv() {
                            let _ = job.reply.send(Err(e.clone()));
                        }
                        return;
                    }
                };

                while let Ok(job) = job_rx.recv() {
                    debug!("Transcribing {} samples", job.samples.len());
                    if job.reply.send(engine.transcribe(&job.samples)).is_err() {
                        warn!("Transcription dropped; requester went away");
                    }
                }

                info!("Whisper worker stopped");
            })
            .map_err(|e| ParleyError::ModelLoadError(format!("Failed to spawn Whisper worker: {}", e)))?;

        Ok(Self { job_tx })
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, samples: &[f32]) -> Result<String> {
        if samples.is_empty() {
            return Err(ParleyError::TranscriptionError("Empty audio segment".into()));
        }

        let (reply, result_rx) = oneshot::channel();
        self.job_tx
            .send(TranscriptionJob {
                samples: samples.to_vec(),
                reply,
            })
            .map_err(|e| ParleyError::ChannelError(format!("Whisper worker unavailable: {}", e)))?;

        result_rx
            .await
            .map_err(|_| ParleyError::TranscriptionError("Whisper worker stopped".into()))?
    }

    fn name(&self) -> &str {
        "whisper"
    }
}
