//! The synthesis capability consumed by participants

use crate::{ParleyError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};

/// A finite, single-pass stream of encoded audio bytes
///
/// Chunks arrive in order; the stream cannot be restarted once drained.
pub type AudioStream = BoxStream<'static, Result<Bytes>>;

/// Audio container produced by a synthesizer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Wav,
    Mp3,
    /// Raw 16-bit little-endian mono PCM at 24 kHz
    Pcm,
}

impl AudioFormat {
    /// Wire name used by speech APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Pcm => "pcm",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Pcm => "audio/pcm",
        }
    }
}

/// Voice selection for one utterance
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeechOptions {
    /// Provider voice id (`alloy`, `echo`, or a speaker name for local models)
    pub voice: String,

    /// Speaking rate (1.0 = normal)
    pub speed: f32,

    pub format: AudioFormat,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            voice: "alloy".to_string(),
            speed: 1.0,
            format: AudioFormat::Wav,
        }
    }
}

impl SpeechOptions {
    pub fn new(voice: impl Into<String>) -> Self {
        Self {
            voice: voice.into(),
            ..Default::default()
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }
}

/// Fully drained audio for one utterance
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedAudio {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
}

impl EncodedAudio {
    pub fn new(bytes: Vec<u8>, format: AudioFormat) -> Self {
        Self { bytes, format }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

/// A text-to-speech service
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Start synthesizing `text`; the returned stream yields encoded audio
    async fn synthesize(&self, text: &str, options: &SpeechOptions) -> Result<AudioStream>;

    /// Short backend name for logs
    fn name(&self) -> &str {
        "synthesizer"
    }
}

/// Drain an audio stream to completion
pub async fn collect_stream(mut stream: AudioStream, format: AudioFormat) -> Result<EncodedAudio> {
    let mut bytes = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| match e {
            ParleyError::SynthesisFailure(_) => e,
            other => ParleyError::SynthesisFailure(other.to_string()),
        })?;
        bytes.extend_from_slice(&chunk);
    }

    Ok(EncodedAudio::new(bytes, format))
}
