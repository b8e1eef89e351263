//! Hosted speech through the OpenAI `/audio/speech` endpoint

use crate::config::OpenAiSettings;
use crate::speech::synth::{AudioStream, SpeechOptions, Synthesizer};
use crate::{ParleyError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum input accepted by the speech endpoint, in characters
const MAX_INPUT_CHARS: usize = 4096;

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'static str,
}

/// Streaming client for hosted speech
pub struct OpenAiSynthesizer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiSynthesizer {
    pub fn new(settings: &OpenAiSettings, model: impl Into<String>) -> Result<Self> {
        let api_key = settings.resolve_api_key()?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ParleyError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        })
    }
}

#[async_trait]
impl Synthesizer for OpenAiSynthesizer {
    async fn synthesize(&self, text: &str, options: &SpeechOptions) -> Result<AudioStream> {
        if text.chars().count() > MAX_INPUT_CHARS {
            return Err(ParleyError::SynthesisFailure(format!(
                "text exceeds {} characters",
                MAX_INPUT_CHARS
            )));
        }

        let body = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &options.voice,
            speed: options.speed,
            response_format: options.format.as_str(),
        };

        debug!(
            "Requesting speech: voice={} speed={} format={}",
            options.voice,
            options.speed,
            options.format.as_str()
        );

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ParleyError::SynthesisFailure(format!("Speech request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Speech endpoint returned {}", status);
            return Err(ParleyError::SynthesisFailure(format!(
                "Speech request failed: {} - {}",
                status.as_u16(),
                error_text
            )));
        }

        let stream = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| ParleyError::SynthesisFailure(format!("Audio stream broke: {}", e)))
        });

        Ok(stream.boxed())
    }

    fn name(&self) -> &str {
        "openai"
    }
}
