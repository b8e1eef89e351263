//! The generation capability consumed by participants

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sampling options forwarded to the backend
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Sampling temperature, backend default when unset
    pub temperature: Option<f32>,

    /// Upper bound on generated tokens, backend default when unset
    pub max_tokens: Option<usize>,
}

impl GenerationOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// One self-contained generation call
///
/// Requests carry no history: each prompt embeds whatever context the
/// caller wants the model to see.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    /// Persona instructions, sent as the system message
    pub instructions: String,

    /// The user-turn prompt
    pub prompt: String,

    pub options: GenerationOptions,
}

impl GenerationRequest {
    pub fn new(instructions: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            prompt: prompt.into(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// A text-completion service
///
/// Implementations must be safe to share between participants; one backend
/// usually serves both sides of a debate.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a reply for the request
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Short backend name for logs
    fn name(&self) -> &str {
        "generator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = GenerationRequest::new("Be brief.", "Hello")
            .with_options(GenerationOptions::default().with_temperature(0.9));

        assert_eq!(request.instructions, "Be brief.");
        assert_eq!(request.prompt, "Hello");
        assert_eq!(request.options.temperature, Some(0.9));
        assert_eq!(request.options.max_tokens, None);
    }
}
