//! Built-in personas

use crate::agents::participant::Participant;
use crate::llm::Generator;
use crate::speech::SpeechOptions;
use std::sync::Arc;

pub const OPTIMIST_NAME: &str = "Optimist";
pub const SKEPTIC_NAME: &str = "Skeptic";
pub const ASSISTANT_NAME: &str = "Assistant";

pub const OPTIMIST_INSTRUCTIONS: &str = "You are an optimistic debater who sees the positive side of every topic. Keep your responses concise and engaging, about 2-3 sentences.";

pub const SKEPTIC_INSTRUCTIONS: &str = "You are a RUDE skeptical debater who questions assumptions and points out potential issues. Keep your responses concise and engaging, about 2-3 sentences.";

pub const ASSISTANT_INSTRUCTIONS: &str = "You are a helpful assistant.";

/// Sampling temperature for debate turns
pub const DEBATE_TEMPERATURE: f32 = 0.9;

/// Speaking rate for debate voices
pub const DEBATE_SPEED: f32 = 1.2;

/// Opens every round, voice `alloy`
pub fn optimist(generator: Arc<dyn Generator>) -> Participant {
    Participant::new(OPTIMIST_NAME, OPTIMIST_INSTRUCTIONS, generator)
        .with_temperature(DEBATE_TEMPERATURE)
        .with_voice(SpeechOptions::new("alloy").with_speed(DEBATE_SPEED))
}

/// Answers the optimist, voice `echo`
pub fn skeptic(generator: Arc<dyn Generator>) -> Participant {
    Participant::new(SKEPTIC_NAME, SKEPTIC_INSTRUCTIONS, generator)
        .with_temperature(DEBATE_TEMPERATURE)
        .with_voice(SpeechOptions::new("echo").with_speed(DEBATE_SPEED))
}

pub fn assistant(generator: Arc<dyn Generator>) -> Participant {
    Participant::new(ASSISTANT_NAME, ASSISTANT_INSTRUCTIONS, generator)
        .with_voice(SpeechOptions::new("alloy"))
}
