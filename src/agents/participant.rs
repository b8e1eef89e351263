use crate::llm::{GenerationOptions, GenerationRequest, Generator};
use crate::speech::{AudioStream, SpeechOptions, Synthesizer};
use crate::{ParleyError, Result};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One side of a conversation: a persona bound to its backends
///
/// The instructions are passed through to the generator untouched.
#[derive(Clone)]
pub struct Participant {
    name: String,
    instructions: String,
    generator: Arc<dyn Generator>,
    synthesizer: Option<Arc<dyn Synthesizer>>,
    voice: SpeechOptions,
    options: GenerationOptions,
}

impl Participant {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            generator,
            synthesizer: None,
            voice: SpeechOptions::default(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Attach a synthesizer if one is given
    pub fn with_optional_synthesizer(mut self, synthesizer: Option<Arc<dyn Synthesizer>>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_voice(mut self, voice: SpeechOptions) -> Self {
        self.voice = voice;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.options.max_tokens = Some(max_tokens);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn voice(&self) -> &SpeechOptions {
        &self.voice
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    pub fn has_voice(&self) -> bool {
        self.synthesizer.is_some()
    }

    /// Generate a reply to `prompt`
    ///
    /// Backend errors and empty replies both surface as `GenerationFailure`.
    pub async fn reply(&self, prompt: &str) -> Result<String> {
        let request = GenerationRequest::new(&self.instructions, prompt).with_options(self.options.clone());

        debug!("{} generating via {}", self.name, self.generator.name());

        let text = self.generator.generate(&request).await.map_err(|e| match e {
            ParleyError::GenerationFailure(_) => e,
            other => ParleyError::GenerationFailure(format!("{}: {}", self.name, other)),
        })?;

        let text = text.trim();
        if text.is_empty() {
            return Err(ParleyError::GenerationFailure(format!(
                "{} returned an empty reply",
                self.name
            )));
        }

        Ok(text.to_string())
    }

    /// Start voicing `text`; `None` when the participant has no synthesizer
    pub async fn speak(&self, text: &str) -> Result<Option<AudioStream>> {
        let Some(synthesizer) = &self.synthesizer else {
            return Ok(None);
        };

        debug!("{} speaking via {} as '{}'", self.name, synthesizer.name(), self.voice.voice);

        synthesizer
            .synthesize(text, &self.voice)
            .await
            .map(Some)
            .map_err(|e| match e {
                ParleyError::SynthesisFailure(_) => e,
                other => ParleyError::SynthesisFailure(format!("{}: {}", self.name, other)),
            })
    }
}

impl fmt::Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant")
            .field("name", &self.name)
            .field("generator", &self.generator.name())
            .field("synthesizer", &self.synthesizer.as_ref().map(|s| s.name().to_string()))
            .field("voice", &self.voice)
            .field("options", &self.options)
            .finish()
    }
}
