//! Application configuration
//!
//! Settings are read from a TOML file (`--config`, or
//! `<config dir>/parley/config.toml` when present) and fall back to defaults
//! that mirror the stock debate: `gpt-4o` at temperature 0.9, voices `alloy`
//! and `echo` at speed 1.2, WAV audio, recording to `debate.wav`.

use crate::speech::AudioFormat;
use crate::{ParleyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Which backend serves a capability
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Hosted OpenAI-compatible HTTP API
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    /// On-device models
    Local,
}

/// Quantization type for local model weights
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantizationType {
    /// No quantization (full precision)
    None,
    /// 4-bit quantization (Q4K)
    #[default]
    Q4K,
    /// 8-bit quantization (Q8_0)
    Q8_0,
    /// 4-bit quantization (Q4_0)
    Q4_0,
}

/// Connection settings for the hosted API
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    /// API root, e.g. `https://api.openai.com/v1`
    pub base_url: String,

    /// Inline API key; prefer `api_key_env`
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

impl OpenAiSettings {
    /// Point at a different API root (used by tests and self-hosted gateways)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the API key inline
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Resolve the API key from the inline value or the environment
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.clone());
        }

        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ParleyError::ConfigError(format!(
                    "No API key configured; set {} or openai.api_key",
                    self.api_key_env
                ))
            })
    }
}

/// Text generation settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub provider: Provider,

    /// Hosted model name
    pub model: String,

    /// Sampling temperature used for debate turns
    pub temperature: f32,

    /// Optional cap on reply length
    pub max_tokens: Option<usize>,

    /// HuggingFace model ID or local path for the on-device backend
    pub local_model_id: String,

    /// Quantization applied to the on-device model
    pub quantization: QuantizationType,

    /// Enable mistral.rs inference logging
    pub enable_logging: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi,
            model: "gpt-4o".to_string(),
            temperature: 0.9,
            max_tokens: None,
            local_model_id: "microsoft/Phi-3.5-mini-instruct".to_string(),
            quantization: QuantizationType::Q4K,
            enable_logging: false,
        }
    }
}

/// Local VITS voice model files
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitsSettings {
    /// Path to the ONNX model file
    pub model_path: String,

    /// Path to the tokens file
    pub tokens_path: String,

    /// Path to the lexicon file (optional for some models)
    pub lexicon_path: Option<String>,

    /// Path to the espeak data directory (optional)
    pub data_dir: Option<String>,

    /// Voice name to speaker id, for multi-speaker models
    pub voices: BTreeMap<String, i32>,
}

impl Default for VitsSettings {
    fn default() -> Self {
        let mut voices = BTreeMap::new();
        voices.insert("alloy".to_string(), 0);
        voices.insert("echo".to_string(), 1);

        Self {
            model_path: String::new(),
            tokens_path: String::new(),
            lexicon_path: None,
            data_dir: None,
            voices,
        }
    }
}

/// Speech synthesis settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// Voice the debate at all
    pub enabled: bool,

    pub provider: Provider,

    /// Hosted speech model name
    pub model: String,

    /// Speaking rate (1.0 = normal)
    pub speed: f32,

    /// Audio container requested from the synthesizer
    pub format: AudioFormat,

    pub vits: VitsSettings,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: Provider::OpenAi,
            model: "tts-1".to_string(),
            speed: 1.2,
            format: AudioFormat::Wav,
            vits: VitsSettings::default(),
        }
    }
}

/// Local whisper.cpp model for on-device transcription
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperSettings {
    /// Path to the ggml model file
    pub model_path: PathBuf,

    /// Threads used per transcription
    pub n_threads: i32,
}

impl Default for WhisperSettings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-base.en.bin"),
            n_threads: 4,
        }
    }
}

/// Spoken input for the assistant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenSettings {
    pub provider: Provider,

    /// Hosted transcription model name
    pub model: String,

    /// Language hint; `None` lets the model detect it
    pub language: Option<String>,

    /// Speech probability above which a frame counts as voiced (0.0-1.0)
    pub vad_threshold: f32,

    /// Trailing silence that ends an utterance, in seconds
    pub silence_secs: f32,

    /// Utterances shorter than this are dropped, in seconds
    pub min_utterance_secs: f32,

    /// Utterances are cut off at this length, in seconds
    pub max_utterance_secs: f32,

    pub whisper: WhisperSettings,
}

impl Default for ListenSettings {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi,
            model: "whisper-1".to_string(),
            language: Some("en".to_string()),
            vad_threshold: 0.5,
            silence_secs: 0.5,
            min_utterance_secs: 0.5,
            max_utterance_secs: 30.0,
            whisper: WhisperSettings::default(),
        }
    }
}

/// Debate runner settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateSettings {
    /// Default number of rounds when none is given
    pub rounds: usize,

    /// Where the concatenated recording goes; `None` disables recording
    pub recording_path: Option<PathBuf>,

    /// Sample rate of the recording file
    pub recording_sample_rate: u32,

    /// Play each turn through the speakers
    pub playback: bool,

    pub optimist_voice: String,
    pub skeptic_voice: String,
}

impl Default for DebateSettings {
    fn default() -> Self {
        Self {
            rounds: 3,
            recording_path: Some(PathBuf::from("debate.wav")),
            recording_sample_rate: 24000,
            playback: true,
            optimist_voice: "alloy".to_string(),
            skeptic_voice: "echo".to_string(),
        }
    }
}

/// Top-level configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    pub openai: OpenAiSettings,
    pub generation: GenerationSettings,
    pub speech: SpeechSettings,
    pub debate: DebateSettings,
    pub listen: ListenSettings,
}

impl ParleyConfig {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("parley").join("config.toml"))
    }

    /// Load and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ParleyError::ConfigError(format!("Failed to read '{}': {}", path.display(), e))
        })?;

        let config = Self::from_toml(&content).map_err(|e| match e {
            ParleyError::ConfigError(msg) => {
                ParleyError::ConfigError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ParleyConfig =
            toml::from_str(content).map_err(|e| ParleyError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `explicit` if given, else the default file if it exists, else defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Disable all audio (text-only mode)
    pub fn without_audio(mut self) -> Self {
        self.speech.enabled = false;
        self.debate.playback = false;
        self.debate.recording_path = None;
        self
    }

    /// Disable speaker playback, keep recording
    pub fn without_playback(mut self) -> Self {
        self.debate.playback = false;
        self
    }

    /// Set the recording path
    pub fn with_recording(mut self, path: impl Into<PathBuf>) -> Self {
        self.debate.recording_path = Some(path.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ParleyError::ConfigError(format!(
                "generation.temperature must be between 0 and 2, got {}",
                self.generation.temperature
            )));
        }

        if self.generation.provider == Provider::OpenAi && self.generation.model.trim().is_empty() {
            return Err(ParleyError::ConfigError(
                "generation.model is required".to_string(),
            ));
        }

        if self.debate.rounds == 0 {
            return Err(ParleyError::ConfigError(
                "debate.rounds must be at least 1".to_string(),
            ));
        }

        if self.debate.recording_sample_rate == 0 {
            return Err(ParleyError::ConfigError(
                "debate.recording_sample_rate must be greater than 0".to_string(),
            ));
        }

        let listen = &self.listen;
        if !(0.0..=1.0).contains(&listen.vad_threshold) {
            return Err(ParleyError::ConfigError(format!(
                "listen.vad_threshold must be between 0 and 1, got {}",
                listen.vad_threshold
            )));
        }
        if listen.silence_secs <= 0.0 {
            return Err(ParleyError::ConfigError(
                "listen.silence_secs must be greater than 0".to_string(),
            ));
        }
        if listen.min_utterance_secs >= listen.max_utterance_secs {
            return Err(ParleyError::ConfigError(format!(
                "listen.min_utterance_secs ({}) must be below listen.max_utterance_secs ({})",
                listen.min_utterance_secs, listen.max_utterance_secs
            )));
        }

        if self.speech.enabled {
            if !(0.25..=4.0).contains(&self.speech.speed) {
                return Err(ParleyError::ConfigError(format!(
                    "speech.speed must be between 0.25 and 4.0, got {}",
                    self.speech.speed
                )));
            }

            // Recorder and speakers decode locally; mp3 is only good for passthrough
            let decodes_audio = self.debate.recording_path.is_some() || self.debate.playback;
            if self.speech.format == AudioFormat::Mp3 && decodes_audio {
                return Err(ParleyError::ConfigError(
                    "speech.format = \"mp3\" cannot be recorded or played; use \"wav\" or \"pcm\""
                        .to_string(),
                ));
            }

            if self.speech.provider == Provider::Local {
                if self.speech.vits.model_path.is_empty() {
                    return Err(ParleyError::ConfigError(
                        "speech.vits.model_path is required for local speech".to_string(),
                    ));
                }
                if self.speech.vits.tokens_path.is_empty() {
                    return Err(ParleyError::ConfigError(
                        "speech.vits.tokens_path is required for local speech".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParleyConfig::default();
        assert_eq!(config.generation.model, "gpt-4o");
        assert_eq!(config.generation.temperature, 0.9);
        assert_eq!(config.speech.speed, 1.2);
        assert_eq!(config.speech.format, AudioFormat::Wav);
        assert_eq!(config.debate.rounds, 3);
        assert_eq!(config.debate.optimist_voice, "alloy");
        assert_eq!(config.debate.skeptic_voice, "echo");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ParleyConfig::from_toml(
            r#"
            [generation]
            model = "gpt-4o-mini"

            [debate]
            rounds = 5
            recording_path = "out.wav"
            "#,
        )
        .unwrap();

        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert_eq!(config.generation.temperature, 0.9);
        assert_eq!(config.debate.rounds, 5);
        assert_eq!(config.debate.recording_path, Some(PathBuf::from("out.wav")));
        assert_eq!(config.speech.model, "tts-1");
    }

    #[test]
    fn test_provider_names() {
        let config = ParleyConfig::from_toml(
            r#"
            [generation]
            provider = "local"
            quantization = "q8_0"

            [speech]
            enabled = false
            provider = "openai"
            "#,
        )
        .unwrap();

        assert_eq!(config.generation.provider, Provider::Local);
        assert_eq!(config.generation.quantization, QuantizationType::Q8_0);
        assert_eq!(config.speech.provider, Provider::OpenAi);
    }

    #[test]
    fn test_rejects_zero_rounds() {
        let result = ParleyConfig::from_toml("[debate]\nrounds = 0\n");
        assert!(matches!(result, Err(ParleyError::ConfigError(_))));
    }

    #[test]
    fn test_mp3_rejected_when_recording_or_playing() {
        let result = ParleyConfig::from_toml("[speech]\nformat = \"mp3\"\n");
        assert!(matches!(result, Err(ParleyError::ConfigError(_))));

        let mut config = ParleyConfig::default();
        config.speech.format = AudioFormat::Mp3;
        config.debate.recording_path = None;
        assert!(config.validate().is_err(), "playback still decodes");

        config.debate.playback = false;
        assert!(config.validate().is_ok());

        let recording_only = config.clone().with_recording("out.wav");
        assert!(recording_only.validate().is_err());

        config.speech.format = AudioFormat::Pcm;
        assert!(config.with_recording("out.wav").validate().is_ok());
    }

    #[test]
    fn test_listen_defaults_and_limits() {
        let config = ParleyConfig::from_toml(
            r#"
            [listen]
            provider = "local"
            silence_secs = 0.8

            [listen.whisper]
            model_path = "ggml-small.bin"
            "#,
        )
        .unwrap();
        assert_eq!(config.listen.provider, Provider::Local);
        assert_eq!(config.listen.silence_secs, 0.8);
        assert_eq!(config.listen.model, "whisper-1");
        assert_eq!(config.listen.whisper.model_path, PathBuf::from("ggml-small.bin"));
        assert_eq!(config.listen.whisper.n_threads, 4);

        let inverted = "[listen]\nmin_utterance_secs = 5.0\nmax_utterance_secs = 2.0\n";
        assert!(matches!(
            ParleyConfig::from_toml(inverted),
            Err(ParleyError::ConfigError(_))
        ));
        assert!(ParleyConfig::from_toml("[listen]\nvad_threshold = 1.5\n").is_err());
    }

    #[test]
    fn test_local_speech_requires_model_files() {
        let mut config = ParleyConfig::default();
        config.speech.provider = Provider::Local;
        assert!(config.validate().is_err());

        config.speech.vits.model_path = "model.onnx".into();
        config.speech.vits.tokens_path = "tokens.txt".into();
        assert!(config.validate().is_ok());

        // Nothing to validate once speech is off
        config.speech.vits.model_path.clear();
        assert!(config.without_audio().validate().is_ok());
    }

    #[test]
    fn test_inline_api_key_wins() {
        let settings = OpenAiSettings {
            api_key_env: "PARLEY_TEST_UNSET_KEY".into(),
            ..Default::default()
        }
        .with_api_key("sk-test");

        assert_eq!(settings.resolve_api_key().unwrap(), "sk-test");
    }

    #[test]
    fn test_missing_api_key() {
        let settings = OpenAiSettings {
            api_key_env: "PARLEY_TEST_DEFINITELY_UNSET_KEY".into(),
            ..Default::default()
        };

        assert!(matches!(
            settings.resolve_api_key(),
            Err(ParleyError::ConfigError(_))
        ));
    }

    #[test]
    fn test_builder_methods() {
        let config = ParleyConfig::default()
            .without_playback()
            .with_recording("/tmp/x.wav");
        assert!(!config.debate.playback);
        assert!(config.speech.enabled);
        assert_eq!(config.debate.recording_path, Some(PathBuf::from("/tmp/x.wav")));

        let silent = config.without_audio();
        assert!(!silent.speech.enabled);
        assert!(silent.debate.recording_path.is_none());
    }
}
