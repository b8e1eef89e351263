//! Single-tool voice assistant
//!
//! The assistant answers free-form requests, typed or spoken. When the model
//! asks for a tool with a `[TOOL id]{...}[/TOOL]` marker, the tool runs and
//! its result is fed back in a follow-up prompt until the model answers in
//! plain text.

pub mod listener;
pub mod parser;
pub mod tools;

pub use listener::{discard_stale, Listener};
pub use parser::{parse_tool_calls, ParsedReply, ToolCall};
pub use tools::{SalutationTool, Tool, ToolRegistry};

use crate::agents::Participant;
use crate::speech::{AudioStream, Transcriber};
use crate::{ParleyError, Result};
use serde_json::Value;
use tracing::{debug, info};

/// Follow-up rounds allowed before the assistant gives up
const MAX_TOOL_ROUNDS: usize = 3;

/// A tool invocation and what it returned
#[derive(Clone, Debug, PartialEq)]
pub struct ToolResult {
    pub id: String,
    pub output: Value,
}

/// Final answer to one user request
#[derive(Clone, Debug, PartialEq)]
pub struct AssistantReply {
    pub text: String,
    pub tool_results: Vec<ToolResult>,
}

/// A spoken request and the answer to it
#[derive(Clone, Debug, PartialEq)]
pub struct SpokenExchange {
    pub heard: String,
    pub reply: AssistantReply,
}

pub struct Assistant {
    participant: Participant,
    tools: ToolRegistry,
}

impl Assistant {
    /// Wrap `participant`, appending tool usage notes to its instructions
    pub fn new(participant: Participant, tools: ToolRegistry) -> Self {
        let tool_notes = tools.instructions();
        let participant = if tool_notes.is_empty() {
            participant
        } else {
            let instructions = format!("{}\n\n{}", participant.instructions(), tool_notes);
            participant.with_instructions(instructions)
        };

        Self { participant, tools }
    }

    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub async fn respond(&self, user_text: &str) -> Result<AssistantReply> {
        let mut prompt = user_text.to_string();
        let mut tool_results = Vec::new();

        for round in 0..=MAX_TOOL_ROUNDS {
            let reply = self.participant.reply(&prompt).await?;
            let parsed = parse_tool_calls(&reply)?;

            if parsed.calls.is_empty() {
                return Ok(AssistantReply {
                    text: parsed.text,
                    tool_results,
                });
            }

            if round == MAX_TOOL_ROUNDS {
                break;
            }

            let mut follow_up = format!("The user said: \"{}\".", user_text);
            for call in parsed.calls {
                info!("Assistant calling tool {}", call.id);
                let output = self.tools.execute(&call.id, call.arguments).await?;
                debug!("Tool {} returned {}", call.id, output);

                follow_up.push_str(&format!("\nResult of {}: {}", call.id, output));
                tool_results.push(ToolResult { id: call.id, output });
            }
            follow_up.push_str("\nRead the result of the tool to the user.");
            prompt = follow_up;
        }

        Err(ParleyError::ToolFailure(format!(
            "no answer after {} tool rounds",
            MAX_TOOL_ROUNDS
        )))
    }

    /// Transcribe an utterance and answer it
    ///
    /// Returns `None` when nothing intelligible was said; whisper reports
    /// silence and noise as bracketed tags such as `[BLANK_AUDIO]`.
    pub async fn respond_to_speech(
        &self,
        transcriber: &dyn Transcriber,
        samples: &[f32],
    ) -> Result<Option<SpokenExchange>> {
        let heard = transcriber.transcribe(samples).await?;
        let heard = heard.trim();

        if heard.is_empty() || (heard.starts_with('[') && heard.ends_with(']')) {
            debug!("Ignoring empty transcription '{}'", heard);
            return Ok(None);
        }

        info!("Heard: {}", heard);
        let reply = self.respond(heard).await?;
        Ok(Some(SpokenExchange {
            heard: heard.to_string(),
            reply,
        }))
    }

    /// Voice a reply with the assistant's synthesizer, if it has one
    pub async fn speak(&self, reply: &AssistantReply) -> Result<Option<AudioStream>> {
        self.participant.speak(&reply.text).await
    }
}
