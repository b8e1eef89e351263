pub mod agents;
pub mod assistant;
pub mod audio;
pub mod cli;
pub mod config;
pub mod debate;
pub mod llm;
pub mod speech;
pub mod ui;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParleyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    #[error("Speech synthesis failed: {0}")]
    SynthesisFailure(String),

    #[error("Tool error: {0}")]
    ToolFailure(String),

    #[error("Transcription error: {0}")]
    TranscriptionError(String),

    #[error("Session cancelled")]
    Cancelled,

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),

    #[error("Model load error: {0}")]
    ModelLoadError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl From<std::io::Error> for ParleyError {
    fn from(e: std::io::Error) -> Self {
        ParleyError::IOError(e.to_string())
    }
}

impl ParleyError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Rejected before anything ran; the caller has to fix its input
            ParleyError::InvalidConfiguration(_) => false,
            // Provider hiccups, a new session may succeed
            ParleyError::GenerationFailure(_) => true,
            ParleyError::SynthesisFailure(_) => true,
            ParleyError::ToolFailure(_) => true,
            ParleyError::TranscriptionError(_) => true,
            ParleyError::Cancelled => true,
            ParleyError::AudioDeviceError(_) => false,
            ParleyError::AudioProcessingError(_) => true,
            ParleyError::ModelLoadError(_) => false,
            ParleyError::ConfigError(_) => false,
            ParleyError::IOError(_) => false,
            ParleyError::ChannelError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            ParleyError::InvalidConfiguration(_) => {
                "Please enter a topic and a positive number of turns.".to_string()
            }
            ParleyError::GenerationFailure(_) => {
                "An agent failed to respond. The debate was stopped.".to_string()
            }
            ParleyError::SynthesisFailure(_) => {
                "Text-to-speech failed. The debate was stopped.".to_string()
            }
            ParleyError::ToolFailure(_) => "A tool call failed. Please try again.".to_string(),
            ParleyError::TranscriptionError(_) => {
                "Could not transcribe what you said. Please try again.".to_string()
            }
            ParleyError::Cancelled => "The debate was cancelled.".to_string(),
            ParleyError::AudioDeviceError(_) => {
                "Audio device error. Please check your speakers.".to_string()
            }
            ParleyError::AudioProcessingError(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
            ParleyError::ModelLoadError(_) => {
                "Failed to load a local model. Please verify model files are present.".to_string()
            }
            ParleyError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            ParleyError::IOError(_) => "File system error occurred.".to_string(),
            ParleyError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ParleyError>;
