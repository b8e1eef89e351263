//! Turn-taking between two participants
//!
//! The orchestrator alternates A and B for the requested number of rounds.
//! Everything is strictly serial: a turn is generated, appended, reported,
//! and (when a sink is configured) voiced to completion before the next
//! turn's generation starts.

use crate::agents::Participant;
use crate::audio::AudioSink;
use crate::debate::observer::{NoopObserver, TurnObserver};
use crate::debate::prompts::prompt_for;
use crate::debate::session::{Session, Speaker, Turn};
use crate::speech::collect_stream;
use crate::{ParleyError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Cooperative cancellation shared between a caller and a running session
///
/// Checked before every turn; calls already in flight run to completion.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A session that stopped early, with the turns produced before it stopped
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct SessionFailure {
    pub error: ParleyError,
    pub transcript: Vec<Turn>,
}

/// Runs debate sessions
#[derive(Default)]
pub struct Orchestrator {
    sink: Option<Box<dyn AudioSink>>,
    cancel: CancelFlag,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Voice every turn into `sink`
    pub fn with_sink(mut self, sink: impl AudioSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn with_boxed_sink(mut self, sink: Box<dyn AudioSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Share an existing cancel flag instead of the orchestrator's own
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Play every round of `session`
    ///
    /// On error the session keeps every turn appended before the failure.
    /// The sink is finished in all cases.
    pub async fn run(
        &mut self,
        session: &mut Session,
        a: &Participant,
        b: &Participant,
        observer: &mut dyn TurnObserver,
    ) -> Result<()> {
        info!(
            "Starting session {} on '{}' ({} rounds)",
            session.id,
            session.topic(),
            session.rounds()
        );
        observer.on_session_started(session);

        let outcome = self.play_rounds(session, a, b, observer).await;

        let finished = match self.sink.as_mut() {
            Some(sink) => sink.finish().await,
            None => Ok(()),
        };

        let outcome = match (outcome, finished) {
            (Ok(()), finished) => finished,
            (Err(e), Err(finish_error)) => {
                warn!("Audio sink failed to finish after error: {}", finish_error);
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
        };

        match &outcome {
            Ok(()) => {
                info!("Session {} finished with {} turns", session.id, session.turns().len());
                observer.on_finished(session.turns());
            }
            Err(ParleyError::Cancelled) => {
                info!("Session {} cancelled after {} turns", session.id, session.turns().len());
                observer.on_cancelled(session.turns());
            }
            Err(e) => {
                warn!("Session {} failed after {} turns: {}", session.id, session.turns().len(), e);
                observer.on_failed(e, session.turns());
            }
        }

        outcome
    }

    async fn play_rounds(
        &mut self,
        session: &mut Session,
        a: &Participant,
        b: &Participant,
        observer: &mut dyn TurnObserver,
    ) -> Result<()> {
        for round in 1..=session.rounds() {
            session.begin_round(round);
            debug!("Round {}/{}", round, session.rounds());

            for speaker in [Speaker::A, Speaker::B] {
                if self.cancel.is_cancelled() {
                    return Err(ParleyError::Cancelled);
                }

                let participant = match speaker {
                    Speaker::A => a,
                    Speaker::B => b,
                };

                let prompt = prompt_for(session);
                observer.on_generating(session.turns().len() + 1, speaker, participant.name());

                let text = participant.reply(&prompt).await?;
                let turn = session.push_turn(speaker, participant.name(), text).clone();
                debug!("Turn {} by {}: {} chars", turn.ordinal, turn.name, turn.text.len());
                observer.on_turn(&turn, session.turns());

                self.voice(participant, &turn, observer).await?;
            }
        }

        Ok(())
    }

    async fn voice(
        &mut self,
        participant: &Participant,
        turn: &Turn,
        observer: &mut dyn TurnObserver,
    ) -> Result<()> {
        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };

        let Some(stream) = participant.speak(&turn.text).await? else {
            return Ok(());
        };

        observer.on_speaking(turn);
        let audio = collect_stream(stream, participant.voice().format).await?;

        if audio.is_empty() {
            info!("Empty audio for turn {}, skipping", turn.ordinal);
            return Ok(());
        }

        sink.consume(turn, &audio).await
    }
}

/// Run a complete session without audio
///
/// Returns the full transcript, or the partial transcript with the error
/// that stopped it. Invalid input fails before any participant is called.
pub async fn run_session(
    topic: &str,
    rounds: usize,
    a: &Participant,
    b: &Participant,
) -> std::result::Result<Vec<Turn>, SessionFailure> {
    let mut session = Session::new(topic, rounds).map_err(|error| SessionFailure {
        error,
        transcript: Vec::new(),
    })?;

    let mut orchestrator = Orchestrator::new();
    match orchestrator
        .run(&mut session, a, b, &mut NoopObserver)
        .await
    {
        Ok(()) => Ok(session.into_turns()),
        Err(error) => Err(SessionFailure {
            error,
            transcript: session.into_turns(),
        }),
    }
}
