//! UI state machine tests
//!
//! These tests drive [`AppState`] through worker events, both synthetic and
//! from a real worker backed by stub generators.

use async_trait::async_trait;
use parley::agents::Participant;
use parley::debate::{DebateEvent, DebateWorker, Speaker, Turn};
use parley::llm::{GenerationRequest, Generator};
use parley::ui::{AppState, DebatePhase, MAX_ROUNDS, MIN_ROUNDS};
use parley::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Counter {
    label: &'static str,
    calls: AtomicUsize,
}

#[async_trait]
impl Generator for Counter {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("{}{}", self.label, n))
    }
}

fn counter(label: &'static str) -> Arc<Counter> {
    Arc::new(Counter {
        label,
        calls: AtomicUsize::new(0),
    })
}

fn wait_for<F: Fn(&AppState) -> bool>(state: &mut AppState, done: F) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !done(state) {
        assert!(Instant::now() < deadline, "timed out waiting for worker");
        state.poll_events();
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn turn(ordinal: usize) -> Turn {
    let speaker = if ordinal % 2 == 1 { Speaker::A } else { Speaker::B };
    Turn::new(ordinal, (ordinal + 1) / 2, speaker, speaker.to_string(), format!("turn {}", ordinal))
}

#[test]
fn test_initial_state_is_idle() {
    let state = AppState::new();
    assert_eq!(state.phase, DebatePhase::Idle);
    assert_eq!(state.rounds, 3);
    assert!(!state.can_start(), "empty topic must not start");
    assert!(!state.can_play());
}

#[test]
fn test_rounds_are_clamped() {
    assert_eq!(AppState::new().with_rounds(0).rounds, MIN_ROUNDS);
    assert_eq!(AppState::new().with_rounds(50).rounds, MAX_ROUNDS);
    assert_eq!(AppState::new().with_rounds(4).rounds, 4);
}

#[test]
fn test_whitespace_topic_cannot_start() {
    let mut state = AppState::new();
    state.topic_input = "   ".into();
    assert!(!state.can_start());
}

#[test]
fn test_events_grow_the_transcript() {
    let mut state = AppState::new();
    state.apply_event(DebateEvent::Thinking {
        ordinal: 1,
        speaker: Speaker::A,
        name: "Optimist".into(),
    });
    assert_eq!(state.thinking.as_deref(), Some("Optimist"));

    state.apply_event(DebateEvent::TurnCompleted {
        turn: turn(1),
        transcript: vec![turn(1)],
    });
    assert_eq!(state.transcript.len(), 1);
    assert!(state.thinking.is_none());

    state.apply_event(DebateEvent::Finished {
        transcript: vec![turn(1), turn(2)],
    });
    assert_eq!(state.phase, DebatePhase::Finished);
    assert_eq!(state.transcript.len(), 2);
    assert!(state.can_play());
}

#[test]
fn test_playback_events_track_current_turn() {
    let mut state = AppState::new();
    state.apply_event(DebateEvent::Finished {
        transcript: vec![turn(1), turn(2)],
    });

    state.apply_event(DebateEvent::PlaybackStarted { ordinal: 2 });
    assert!(state.is_playing);
    assert_eq!(state.current_playing, Some(2));
    assert!(!state.can_play(), "one playback at a time");

    state.apply_event(DebateEvent::PlaybackFinished);
    assert!(!state.is_playing);
    assert_eq!(state.current_playing, None);
}

#[test]
fn test_cancelled_keeps_partial_transcript() {
    let mut state = AppState::new();
    state.phase = DebatePhase::Debating;
    state.apply_event(DebateEvent::Cancelled {
        transcript: vec![turn(1)],
    });

    assert_eq!(state.phase, DebatePhase::Cancelled);
    assert_eq!(state.transcript.len(), 1);
    assert!(state.last_error.is_none());
}

#[test]
fn test_debate_through_worker() {
    let a = Participant::new("Optimist", "Be upbeat.", counter("A"));
    let b = Participant::new("Skeptic", "Be doubtful.", counter("B"));
    let (handle, join) = DebateWorker::new(a, b).spawn().unwrap();

    let mut state = AppState::new().with_handle(handle).with_rounds(2);
    state.topic_input = "  Remote work  ".into();
    state.start_debate();

    assert_eq!(state.phase, DebatePhase::Debating);
    assert!(!state.can_start(), "no second session while one runs");

    wait_for(&mut state, |s| s.phase != DebatePhase::Debating);

    assert_eq!(state.phase, DebatePhase::Finished);
    let texts: Vec<&str> = state.transcript.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, ["A1", "B1", "A2", "B2"]);
    assert!(state.status.as_deref().unwrap_or_default().contains("concluded"));

    // No player configured: playback reports an error and settles
    state.speak_all();
    assert!(state.is_playing);
    wait_for(&mut state, |s| !s.is_playing);
    assert_eq!(
        state.last_error.as_deref(),
        Some("Audio playback is not available")
    );

    state.shutdown();
    assert!(!state.is_connected());
    join.join().unwrap();
}
