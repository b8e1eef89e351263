//! Command/event protocol between the debate worker and its callers

use crate::debate::session::{Speaker, Turn};
use crate::speech::EncodedAudio;
use crate::ParleyError;
use uuid::Uuid;

/// Requests handled by the debate worker
#[derive(Debug, Clone)]
pub enum DebateCommand {
    /// Run a new session once the worker is idle; later starts queue up
    Start { topic: String, rounds: usize },

    /// Stop the running session before its next turn
    Cancel,

    /// Play one turn, synthesizing it first if no audio is cached
    Speak { turn: Turn },

    /// Play several turns back to back
    SpeakAll { turns: Vec<Turn> },

    /// Interrupt playback in progress
    StopPlayback,

    Shutdown,
}

/// Progress reported by the debate worker
#[derive(Debug, Clone)]
pub enum DebateEvent {
    Started {
        session_id: Uuid,
        topic: String,
        rounds: usize,
    },

    /// A participant is generating the turn with this ordinal
    Thinking {
        ordinal: usize,
        speaker: Speaker,
        name: String,
    },

    /// A turn was appended; `transcript` is everything so far
    TurnCompleted {
        turn: Turn,
        transcript: Vec<Turn>,
    },

    /// A turn is being voiced
    Speaking { ordinal: usize },

    /// Synthesized audio for a turn is available for replay
    AudioReady { ordinal: usize, audio: EncodedAudio },

    Finished { transcript: Vec<Turn> },

    Failed {
        error: ParleyError,
        transcript: Vec<Turn>,
    },

    Cancelled { transcript: Vec<Turn> },

    PlaybackStarted { ordinal: usize },

    /// Playback queue drained (or was stopped)
    PlaybackFinished,

    /// Error outside a session, e.g. during replay
    Error { message: String },

    Shutdown,
}
