//! Participants and the backends behind them

pub mod participant;
pub mod presets;

pub use participant::Participant;
pub use presets::{assistant, optimist, skeptic};

use crate::config::{ParleyConfig, Provider};
use crate::llm::{Generator, OpenAiGenerator};
use crate::audio::{SegmenterSettings, UtteranceSegmenter};
use crate::speech::{OpenAiSynthesizer, OpenAiTranscriber, SpeechOptions, Synthesizer, Transcriber};
use crate::{ParleyError, Result};
use std::sync::Arc;
use tracing::info;

/// Build the text generator selected by `config`
pub async fn build_generator(config: &ParleyConfig) -> Result<Arc<dyn Generator>> {
    match config.generation.provider {
        Provider::OpenAi => {
            info!("Using hosted generation: {}", config.generation.model);
            let generator = OpenAiGenerator::new(&config.openai, &config.generation.model)?;
            Ok(Arc::new(generator))
        }
        #[cfg(feature = "local-llm")]
        Provider::Local => {
            let generator = crate::llm::LocalGenerator::load(&config.generation).await?;
            Ok(Arc::new(generator))
        }
        #[cfg(not(feature = "local-llm"))]
        Provider::Local => Err(ParleyError::ConfigError(
            "local generation requires the `local-llm` feature".into(),
        )),
    }
}

/// Build the synthesizer selected by `config`, or `None` when speech is off
pub fn build_synthesizer(config: &ParleyConfig) -> Result<Option<Arc<dyn Synthesizer>>> {
    if !config.speech.enabled {
        return Ok(None);
    }

    match config.speech.provider {
        Provider::OpenAi => {
            info!("Using hosted speech: {}", config.speech.model);
            let synthesizer = OpenAiSynthesizer::new(&config.openai, &config.speech.model)?;
            Ok(Some(Arc::new(synthesizer)))
        }
        #[cfg(feature = "local-tts")]
        Provider::Local => {
            let synthesizer = crate::speech::VitsSynthesizer::start(&config.speech.vits)?;
            Ok(Some(Arc::new(synthesizer)))
        }
        #[cfg(not(feature = "local-tts"))]
        Provider::Local => Err(ParleyError::ConfigError(
            "local speech requires the `local-tts` feature".into(),
        )),
    }
}

/// Build the transcriber selected by `config.listen`
pub fn build_transcriber(config: &ParleyConfig) -> Result<Arc<dyn Transcriber>> {
    match config.listen.provider {
        Provider::OpenAi => {
            info!("Using hosted transcription: {}", config.listen.model);
            Ok(Arc::new(OpenAiTranscriber::new(&config.openai, &config.listen)?))
        }
        #[cfg(feature = "local-stt")]
        Provider::Local => {
            let transcriber = crate::speech::WhisperTranscriber::start(&config.listen)?;
            Ok(Arc::new(transcriber))
        }
        #[cfg(not(feature = "local-stt"))]
        Provider::Local => Err(ParleyError::ConfigError(
            "local transcription requires the `local-stt` feature".into(),
        )),
    }
}

/// Utterance segmenter backed by the Silero voice detector
pub fn build_segmenter(config: &ParleyConfig) -> Result<UtteranceSegmenter> {
    let settings = SegmenterSettings::from(&config.listen);

    #[cfg(feature = "voice-input")]
    {
        let detector = crate::audio::SileroDetector::new()?;
        Ok(UtteranceSegmenter::new(Box::new(detector), settings))
    }
    #[cfg(not(feature = "voice-input"))]
    {
        let _ = settings;
        Err(ParleyError::ConfigError(
            "spoken input requires the `voice-input` feature".into(),
        ))
    }
}

fn configured_voice(config: &ParleyConfig, voice: &str) -> SpeechOptions {
    SpeechOptions::new(voice)
        .with_speed(config.speech.speed)
        .with_format(config.speech.format)
}

/// Both debaters, wired to the configured backends
pub async fn debaters(config: &ParleyConfig) -> Result<(Participant, Participant)> {
    let generator = build_generator(config).await?;
    let synthesizer = build_synthesizer(config)?;

    let mut a = optimist(Arc::clone(&generator))
        .with_temperature(config.generation.temperature)
        .with_voice(configured_voice(config, &config.debate.optimist_voice))
        .with_optional_synthesizer(synthesizer.clone());
    let mut b = skeptic(generator)
        .with_temperature(config.generation.temperature)
        .with_voice(configured_voice(config, &config.debate.skeptic_voice))
        .with_optional_synthesizer(synthesizer);

    if let Some(max_tokens) = config.generation.max_tokens {
        a = a.with_max_tokens(max_tokens);
        b = b.with_max_tokens(max_tokens);
    }

    Ok((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_config() -> ParleyConfig {
        let mut config = ParleyConfig::default().without_audio();
        config.openai = config.openai.with_api_key("sk-test");
        config
    }

    #[tokio::test]
    async fn test_debaters_follow_config() {
        let mut config = offline_config();
        config.debate.skeptic_voice = "onyx".into();
        config.generation.temperature = 0.5;

        let (a, b) = debaters(&config).await.unwrap();
        assert_eq!(a.name(), "Optimist");
        assert_eq!(b.name(), "Skeptic");
        assert_eq!(a.voice().voice, "alloy");
        assert_eq!(b.voice().voice, "onyx");
        assert_eq!(b.options().temperature, Some(0.5));
        assert!(!a.has_voice());
    }

    #[test]
    fn test_speech_disabled_builds_no_synthesizer() {
        assert!(build_synthesizer(&offline_config()).unwrap().is_none());
    }

    #[cfg(not(feature = "local-llm"))]
    #[tokio::test]
    async fn test_local_generation_needs_feature() {
        let mut config = offline_config();
        config.generation.provider = Provider::Local;
        assert!(matches!(
            build_generator(&config).await,
            Err(ParleyError::ConfigError(_))
        ));
    }

    #[test]
    fn test_hosted_transcriber_needs_api_key() {
        let mut config = ParleyConfig::default();
        config.openai.api_key_env = "PARLEY_TEST_NO_TRANSCRIPTION_KEY".into();
        assert!(matches!(
            build_transcriber(&config),
            Err(ParleyError::ConfigError(_))
        ));

        assert_eq!(build_transcriber(&offline_config()).unwrap().name(), "openai");
    }

    #[cfg(not(feature = "local-stt"))]
    #[test]
    fn test_local_transcription_needs_feature() {
        let mut config = offline_config();
        config.listen.provider = Provider::Local;
        assert!(matches!(
            build_transcriber(&config),
            Err(ParleyError::ConfigError(_))
        ));
    }

    #[test]
    fn test_presets() {
        struct Silent;
        #[async_trait::async_trait]
        impl Generator for Silent {
            async fn generate(&self, _r: &crate::llm::GenerationRequest) -> Result<String> {
                Ok(String::new())
            }
        }

        let a = optimist(Arc::new(Silent));
        assert!(a.instructions().starts_with("You are an optimistic debater"));
        assert_eq!(a.voice().speed, 1.2);
        assert_eq!(a.options().temperature, Some(0.9));

        let b = skeptic(Arc::new(Silent));
        assert!(b.instructions().contains("RUDE"));
        assert_eq!(b.voice().voice, "echo");
    }
}
