//! UI state driven by debate worker events

use crate::debate::{DebateEvent, DebateHandle, Turn};
use std::collections::HashSet;
use tracing::{debug, warn};

pub const MIN_ROUNDS: usize = 1;
pub const MAX_ROUNDS: usize = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DebatePhase {
    #[default]
    Idle,
    Debating,
    Finished,
    Failed,
    Cancelled,
}

pub struct AppState {
    pub topic_input: String,
    /// Exchanges per participant, kept within [`MIN_ROUNDS`]..=[`MAX_ROUNDS`]
    pub rounds: usize,
    pub phase: DebatePhase,
    pub transcript: Vec<Turn>,
    /// Who is generating right now
    pub thinking: Option<String>,
    /// Ordinals with synthesized audio on the worker side
    pub audio_ready: HashSet<usize>,
    pub current_playing: Option<usize>,
    pub is_playing: bool,
    pub status: Option<String>,
    pub last_error: Option<String>,
    handle: Option<DebateHandle>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            topic_input: String::new(),
            rounds: 3,
            phase: DebatePhase::Idle,
            transcript: Vec::new(),
            thinking: None,
            audio_ready: HashSet::new(),
            current_playing: None,
            is_playing: false,
            status: None,
            last_error: None,
            handle: None,
        }
    }

    pub fn with_handle(mut self, handle: DebateHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds.clamp(MIN_ROUNDS, MAX_ROUNDS);
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.last_error = Some(message.into());
        self
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_debating(&self) -> bool {
        self.phase == DebatePhase::Debating
    }

    pub fn can_start(&self) -> bool {
        !self.is_debating() && !self.topic_input.trim().is_empty()
    }

    pub fn can_play(&self) -> bool {
        !self.is_playing && !self.is_debating() && !self.transcript.is_empty()
    }

    pub fn start_debate(&mut self) {
        if !self.can_start() {
            return;
        }

        let Some(handle) = &self.handle else {
            self.last_error = Some("The debate backend is not available.".into());
            return;
        };

        let topic = self.topic_input.trim().to_string();
        let rounds = self.rounds.clamp(MIN_ROUNDS, MAX_ROUNDS);
        if let Err(e) = handle.start(topic, rounds) {
            self.last_error = Some(e.user_message());
            return;
        }

        self.transcript.clear();
        self.audio_ready.clear();
        self.current_playing = None;
        self.last_error = None;
        self.thinking = None;
        self.status = None;
        self.phase = DebatePhase::Debating;
    }

    pub fn cancel_debate(&mut self) {
        if !self.is_debating() {
            return;
        }
        if let Some(handle) = &self.handle {
            if let Err(e) = handle.cancel() {
                self.last_error = Some(e.user_message());
            }
        }
    }

    /// Play a single turn by ordinal
    pub fn speak(&mut self, ordinal: usize) {
        if !self.can_play() {
            return;
        }
        let Some(turn) = self.transcript.iter().find(|t| t.ordinal == ordinal).cloned() else {
            return;
        };
        let Some(handle) = &self.handle else { return };

        match handle.speak(turn) {
            Ok(()) => self.is_playing = true,
            Err(e) => self.last_error = Some(e.user_message()),
        }
    }

    /// Play the whole transcript in order
    pub fn speak_all(&mut self) {
        if !self.can_play() {
            return;
        }
        let Some(handle) = &self.handle else { return };

        match handle.speak_all(self.transcript.clone()) {
            Ok(()) => self.is_playing = true,
            Err(e) => self.last_error = Some(e.user_message()),
        }
    }

    pub fn stop_playback(&mut self) {
        if !self.is_playing {
            return;
        }
        if let Some(handle) = &self.handle {
            if let Err(e) = handle.stop_playback() {
                self.last_error = Some(e.user_message());
            }
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.cancel();
            let _ = handle.shutdown();
        }
    }

    /// Drain pending worker events
    pub fn poll_events(&mut self) {
        let events: Vec<DebateEvent> = match &self.handle {
            Some(handle) => std::iter::from_fn(|| handle.try_recv_event()).collect(),
            None => return,
        };

        for event in events {
            self.apply_event(event);
        }
    }

    pub fn apply_event(&mut self, event: DebateEvent) {
        match event {
            DebateEvent::Started { topic, rounds, .. } => {
                debug!("Debate started: {} ({} rounds)", topic, rounds);
                self.phase = DebatePhase::Debating;
                self.status = Some(format!("Debating \"{}\"", topic));
            }

            DebateEvent::Thinking { name, .. } => {
                self.thinking = Some(name);
            }

            DebateEvent::TurnCompleted { transcript, .. } => {
                self.transcript = transcript;
                self.thinking = None;
            }

            DebateEvent::Speaking { .. } => {}

            DebateEvent::AudioReady { ordinal, .. } => {
                self.audio_ready.insert(ordinal);
            }

            DebateEvent::Finished { transcript } => {
                self.transcript = transcript;
                self.thinking = None;
                self.phase = DebatePhase::Finished;
                self.status = Some("Debate concluded".into());
            }

            DebateEvent::Failed { error, transcript } => {
                warn!("Debate failed: {}", error);
                self.transcript = transcript;
                self.thinking = None;
                self.phase = DebatePhase::Failed;
                self.status = None;
                self.last_error = Some(error.user_message());
            }

            DebateEvent::Cancelled { transcript } => {
                self.transcript = transcript;
                self.thinking = None;
                self.phase = DebatePhase::Cancelled;
                self.status = Some("Debate stopped".into());
            }

            DebateEvent::PlaybackStarted { ordinal } => {
                self.is_playing = true;
                self.current_playing = Some(ordinal);
            }

            DebateEvent::PlaybackFinished => {
                self.is_playing = false;
                self.current_playing = None;
            }

            DebateEvent::Error { message } => {
                self.last_error = Some(message);
            }

            DebateEvent::Shutdown => {
                self.handle = None;
                self.is_playing = false;
                self.current_playing = None;
                if self.is_debating() {
                    self.phase = DebatePhase::Idle;
                }
            }
        }
    }
}
