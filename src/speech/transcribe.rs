//! Speech-to-text for spoken assistant requests
//!
//! Utterances arrive as 16 kHz mono samples. The hosted backend uploads them
//! as a WAV file to the OpenAI `/audio/transcriptions` endpoint; the local
//! one runs whisper.cpp (feature `local-stt`).

use crate::audio::wav::encode_wav;
use crate::config::{ListenSettings, OpenAiSettings};
use crate::{ParleyError, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Sample rate every transcriber and the voice detector expect
pub const LISTEN_SAMPLE_RATE: u32 = 16_000;

/// Turns recorded speech into text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe mono samples at [`LISTEN_SAMPLE_RATE`]
    async fn transcribe(&self, samples: &[f32]) -> Result<String>;

    fn name(&self) -> &str {
        "transcriber"
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Client for hosted transcription
pub struct OpenAiTranscriber {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    language: Option<String>,
}

impl OpenAiTranscriber {
    pub fn new(settings: &OpenAiSettings, listen: &ListenSettings) -> Result<Self> {
        let api_key = settings.resolve_api_key()?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ParleyError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: listen.model.clone(),
            language: listen.language.clone(),
        })
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, samples: &[f32]) -> Result<String> {
        if samples.is_empty() {
            return Err(ParleyError::TranscriptionError("Empty audio segment".into()));
        }

        debug!(
            "Uploading {:.2}s of speech for transcription",
            samples.len() as f32 / LISTEN_SAMPLE_RATE as f32
        );

        let wav = encode_wav(samples, LISTEN_SAMPLE_RATE)?;
        let part = Part::bytes(wav)
            .file_name("speech.wav")
            .mime_str("audio/wav")
            .map_err(|e| ParleyError::TranscriptionError(format!("Failed to create multipart: {}", e)))?;

        let mut form = Form::new().part("file", part).text("model", self.model.clone());
        if let Some(language) = &self.language {
            form = form.text("language", language.clone());
        }

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ParleyError::TranscriptionError(format!("Transcription request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Transcription endpoint returned {}", status);
            return Err(ParleyError::TranscriptionError(format!(
                "Transcription request failed: {} - {}",
                status.as_u16(),
                error_text
            )));
        }

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| ParleyError::TranscriptionError(format!("Malformed transcription: {}", e)))?;

        let text = body.text.trim().to_string();
        debug!("Transcription result: '{}'", text);
        Ok(text)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
