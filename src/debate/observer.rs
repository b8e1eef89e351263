//! Progress callbacks for a running session

use crate::debate::events::DebateEvent;
use crate::debate::session::{Session, Speaker, Turn};
use crate::ParleyError;
use crossbeam_channel::Sender;
use tracing::warn;

/// Receives session progress
///
/// Only `on_turn` is required; it fires after every single turn with the
/// transcript so far.
pub trait TurnObserver: Send {
    fn on_session_started(&mut self, _session: &Session) {}

    fn on_generating(&mut self, _ordinal: usize, _speaker: Speaker, _name: &str) {}

    fn on_turn(&mut self, turn: &Turn, transcript: &[Turn]);

    fn on_speaking(&mut self, _turn: &Turn) {}

    fn on_finished(&mut self, _transcript: &[Turn]) {}

    fn on_failed(&mut self, _error: &ParleyError, _transcript: &[Turn]) {}

    fn on_cancelled(&mut self, _transcript: &[Turn]) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TurnObserver for NoopObserver {
    fn on_turn(&mut self, _turn: &Turn, _transcript: &[Turn]) {}
}

/// Observer that forwards progress as [`DebateEvent`]s
#[derive(Clone)]
pub struct ChannelObserver {
    event_tx: Sender<DebateEvent>,
}

impl ChannelObserver {
    pub fn new(event_tx: Sender<DebateEvent>) -> Self {
        Self { event_tx }
    }

    fn emit(&self, event: DebateEvent) {
        if self.event_tx.send(event).is_err() {
            warn!("Debate event dropped: receiver gone");
        }
    }
}

impl TurnObserver for ChannelObserver {
    fn on_session_started(&mut self, session: &Session) {
        self.emit(DebateEvent::Started {
            session_id: session.id,
            topic: session.topic().to_string(),
            rounds: session.rounds(),
        });
    }

    fn on_generating(&mut self, ordinal: usize, speaker: Speaker, name: &str) {
        self.emit(DebateEvent::Thinking {
            ordinal,
            speaker,
            name: name.to_string(),
        });
    }

    fn on_turn(&mut self, turn: &Turn, transcript: &[Turn]) {
        self.emit(DebateEvent::TurnCompleted {
            turn: turn.clone(),
            transcript: transcript.to_vec(),
        });
    }

    fn on_speaking(&mut self, turn: &Turn) {
        self.emit(DebateEvent::Speaking {
            ordinal: turn.ordinal,
        });
    }

    fn on_finished(&mut self, transcript: &[Turn]) {
        self.emit(DebateEvent::Finished {
            transcript: transcript.to_vec(),
        });
    }

    fn on_failed(&mut self, error: &ParleyError, transcript: &[Turn]) {
        self.emit(DebateEvent::Failed {
            error: error.clone(),
            transcript: transcript.to_vec(),
        });
    }

    fn on_cancelled(&mut self, transcript: &[Turn]) {
        self.emit(DebateEvent::Cancelled {
            transcript: transcript.to_vec(),
        });
    }
}
