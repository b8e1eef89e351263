//! Turn-taking behaviour of debate sessions, driven by stub backends

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use parley::agents::Participant;
use parley::audio::{encode_wav, AudioSink};
use parley::debate::{
    opening_prompt, run_session, CancelFlag, ChannelObserver, DebateEvent, DebateWorker,
    NoopObserver, Orchestrator, Session, Speaker, Turn,
};
use parley::llm::{GenerationRequest, Generator};
use parley::speech::{AudioStream, EncodedAudio, SpeechOptions, Synthesizer};
use parley::{ParleyError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const TOPIC: &str = "Remote work";

/// Replies "<label><n>" on its n-th call and remembers every prompt
struct Labeled {
    label: &'static str,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl Labeled {
    fn new(label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            label,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl Generator for Labeled {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().push(request.prompt.clone());
        Ok(format!("{}{}", self.label, n))
    }
}

/// Replies with the prompt it was given
struct Echo;

#[async_trait]
impl Generator for Echo {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        Ok(request.prompt.clone())
    }
}

/// Succeeds until the `fail_at`-th call across both participants
struct FailsAt {
    fail_at: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl Generator for FailsAt {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_at {
            return Err(ParleyError::GenerationFailure("provider unavailable".into()));
        }
        Ok(format!("reply {}", n))
    }
}

/// Raises a cancel flag during its `cancel_at`-th call
struct CancelsAt {
    cancel_at: usize,
    calls: AtomicUsize,
    flag: CancelFlag,
}

#[async_trait]
impl Generator for CancelsAt {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.cancel_at {
            self.flag.cancel();
        }
        Ok(format!("reply {}", n))
    }
}

#[derive(Clone, Copy)]
enum SynthMode {
    Tone,
    Empty,
    Fail,
}

struct StubSynth {
    mode: SynthMode,
    calls: AtomicUsize,
}

impl StubSynth {
    fn new(mode: SynthMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Synthesizer for StubSynth {
    async fn synthesize(&self, _text: &str, _options: &SpeechOptions) -> Result<AudioStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            SynthMode::Tone => {
                let wav = encode_wav(&vec![0.2f32; 240], 24_000)?;
                let (head, tail) = wav.split_at(20);
                let chunks = vec![
                    Ok(Bytes::copy_from_slice(head)),
                    Ok(Bytes::copy_from_slice(tail)),
                ];
                Ok(stream::iter(chunks).boxed())
            }
            SynthMode::Empty => Ok(stream::empty().boxed()),
            SynthMode::Fail => Err(ParleyError::SynthesisFailure("voice unavailable".into())),
        }
    }
}

/// Remembers what reached it
#[derive(Clone, Default)]
struct Collected {
    ordinals: Arc<Mutex<Vec<usize>>>,
    finished: Arc<AtomicUsize>,
}

#[async_trait]
impl AudioSink for Collected {
    async fn consume(&mut self, turn: &Turn, _audio: &EncodedAudio) -> Result<()> {
        self.ordinals.lock().push(turn.ordinal);
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Player that takes a while per utterance, keeping the worker busy
#[derive(Clone, Default)]
struct SlowPlayer {
    played: Arc<AtomicUsize>,
}

#[async_trait]
impl AudioSink for SlowPlayer {
    async fn consume(&mut self, _turn: &Turn, _audio: &EncodedAudio) -> Result<()> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        self.played.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn pair(a: Arc<dyn Generator>, b: Arc<dyn Generator>) -> (Participant, Participant) {
    (
        Participant::new("Optimist", "Be upbeat.", a),
        Participant::new("Skeptic", "Be doubtful.", b),
    )
}

#[tokio::test]
async fn test_turns_alternate_for_every_round() {
    for rounds in 1..=4 {
        let (a, b) = pair(Labeled::new("A"), Labeled::new("B"));
        let transcript = run_session(TOPIC, rounds, &a, &b).await.unwrap();

        assert_eq!(transcript.len(), 2 * rounds);
        for (i, turn) in transcript.iter().enumerate() {
            let expected = if i % 2 == 0 { Speaker::A } else { Speaker::B };
            assert_eq!(turn.speaker, expected);
            assert_eq!(turn.ordinal, i + 1);
            assert_eq!(turn.round, i / 2 + 1);
        }
    }
}

#[tokio::test]
async fn test_labeled_replies_in_order() {
    let (a, b) = pair(Labeled::new("A"), Labeled::new("B"));
    let transcript = run_session(TOPIC, 2, &a, &b).await.unwrap();

    let texts: Vec<&str> = transcript.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, ["A1", "B1", "A2", "B2"]);
    assert_eq!(transcript[0].name, "Optimist");
    assert_eq!(transcript[1].name, "Skeptic");
}

#[tokio::test]
async fn test_prompts_quote_the_latest_opposing_turn() {
    let gen_a = Labeled::new("A");
    let gen_b = Labeled::new("B");
    let (a, b) = pair(gen_a.clone(), gen_b.clone());

    run_session(TOPIC, 3, &a, &b).await.unwrap();

    let prompts_a = gen_a.prompts();
    let prompts_b = gen_b.prompts();

    // Only the very first prompt is an opener
    assert_eq!(prompts_a[0], opening_prompt(TOPIC));
    assert!(!prompts_a[0].contains('"'));

    assert!(prompts_b[0].contains("\"A1\""));
    assert!(prompts_a[1].contains("\"B1\""));
    assert!(prompts_b[1].contains("\"A2\""));
    assert!(prompts_a[2].contains("\"B2\""));
    assert!(prompts_b[2].contains("\"A3\""));

    for prompt in prompts_a.iter().chain(prompts_b.iter()) {
        assert!(prompt.contains(TOPIC));
    }
}

#[tokio::test]
async fn test_echoing_participant_sees_previous_reply() {
    let (a, b) = pair(Arc::new(Echo), Labeled::new("B"));
    let transcript = run_session(TOPIC, 2, &a, &b).await.unwrap();

    assert!(transcript[2].text.contains("B1"));
    assert!(transcript[2].text.contains("Skeptic"));
}

#[tokio::test]
async fn test_failure_keeps_earlier_turns() {
    for fail_at in 1..=4 {
        let generator: Arc<dyn Generator> = Arc::new(FailsAt {
            fail_at,
            calls: AtomicUsize::new(0),
        });
        let (a, b) = pair(generator.clone(), generator);

        let failure = run_session(TOPIC, 2, &a, &b).await.unwrap_err();
        assert!(matches!(failure.error, ParleyError::GenerationFailure(_)));
        assert_eq!(failure.transcript.len(), fail_at - 1);
        for (i, turn) in failure.transcript.iter().enumerate() {
            assert_eq!(turn.ordinal, i + 1);
        }
    }
}

#[tokio::test]
async fn test_invalid_input_makes_no_calls() {
    let gen_a = Labeled::new("A");
    let gen_b = Labeled::new("B");
    let (a, b) = pair(gen_a.clone(), gen_b.clone());

    for (topic, rounds) in [("", 2), ("   ", 2), (TOPIC, 0)] {
        let failure = run_session(topic, rounds, &a, &b).await.unwrap_err();
        assert!(matches!(failure.error, ParleyError::InvalidConfiguration(_)));
        assert!(failure.transcript.is_empty());
    }

    assert!(gen_a.prompts().is_empty());
    assert!(gen_b.prompts().is_empty());
}

#[tokio::test]
async fn test_cancel_stops_before_next_turn() {
    let flag = CancelFlag::new();
    let generator: Arc<dyn Generator> = Arc::new(CancelsAt {
        cancel_at: 2,
        calls: AtomicUsize::new(0),
        flag: flag.clone(),
    });
    let (a, b) = pair(generator.clone(), generator);

    let mut session = Session::new(TOPIC, 3).unwrap();
    let mut orchestrator = Orchestrator::new().with_cancel_flag(flag);
    let result = orchestrator.run(&mut session, &a, &b, &mut NoopObserver).await;

    assert_eq!(result, Err(ParleyError::Cancelled));
    assert_eq!(session.turns().len(), 2);
}

#[tokio::test]
async fn test_every_turn_reaches_the_sink_in_order() {
    let synth = StubSynth::new(SynthMode::Tone);
    let (a, b) = pair(Labeled::new("A"), Labeled::new("B"));
    let a = a.with_synthesizer(synth.clone());
    let b = b.with_synthesizer(synth.clone());

    let sink = Collected::default();
    let mut session = Session::new(TOPIC, 2).unwrap();
    let mut orchestrator = Orchestrator::new().with_sink(sink.clone());
    orchestrator
        .run(&mut session, &a, &b, &mut NoopObserver)
        .await
        .unwrap();

    assert_eq!(*sink.ordinals.lock(), vec![1, 2, 3, 4]);
    assert_eq!(sink.finished.load(Ordering::SeqCst), 1);
    assert_eq!(synth.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_empty_audio_is_skipped() {
    let synth = StubSynth::new(SynthMode::Empty);
    let (a, b) = pair(Labeled::new("A"), Labeled::new("B"));
    let a = a.with_synthesizer(synth.clone());
    let b = b.with_synthesizer(synth);

    let sink = Collected::default();
    let mut session = Session::new(TOPIC, 1).unwrap();
    let mut orchestrator = Orchestrator::new().with_sink(sink.clone());
    orchestrator
        .run(&mut session, &a, &b, &mut NoopObserver)
        .await
        .unwrap();

    assert_eq!(session.turns().len(), 2);
    assert!(sink.ordinals.lock().is_empty());
    assert_eq!(sink.finished.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_synthesis_failure_keeps_the_text_turn() {
    let (a, b) = pair(Labeled::new("A"), Labeled::new("B"));
    let a = a.with_synthesizer(StubSynth::new(SynthMode::Fail));

    let sink = Collected::default();
    let mut session = Session::new(TOPIC, 2).unwrap();
    let mut orchestrator = Orchestrator::new().with_sink(sink.clone());
    let result = orchestrator.run(&mut session, &a, &b, &mut NoopObserver).await;

    assert!(matches!(result, Err(ParleyError::SynthesisFailure(_))));
    assert_eq!(session.turns().len(), 1);
    assert_eq!(session.turns()[0].text, "A1");
    assert_eq!(sink.finished.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_without_sink_no_synthesis_happens() {
    let synth = StubSynth::new(SynthMode::Tone);
    let (a, b) = pair(Labeled::new("A"), Labeled::new("B"));
    let a = a.with_synthesizer(synth.clone());
    let b = b.with_synthesizer(synth.clone());

    run_session(TOPIC, 2, &a, &b).await.unwrap();
    assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_observer_event_order() {
    let synth = StubSynth::new(SynthMode::Tone);
    let (a, b) = pair(Labeled::new("A"), Labeled::new("B"));
    let a = a.with_synthesizer(synth.clone());
    let b = b.with_synthesizer(synth);

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut observer = ChannelObserver::new(tx);
    let mut session = Session::new(TOPIC, 1).unwrap();
    let mut orchestrator = Orchestrator::new().with_sink(Collected::default());
    orchestrator
        .run(&mut session, &a, &b, &mut observer)
        .await
        .unwrap();

    let kinds: Vec<&'static str> = rx
        .try_iter()
        .map(|event| match event {
            DebateEvent::Started { .. } => "started",
            DebateEvent::Thinking { .. } => "thinking",
            DebateEvent::TurnCompleted { .. } => "turn",
            DebateEvent::Speaking { .. } => "speaking",
            DebateEvent::Finished { .. } => "finished",
            _ => "other",
        })
        .collect();

    assert_eq!(
        kinds,
        [
            "started", "thinking", "turn", "speaking", "thinking", "turn", "speaking", "finished"
        ]
    );
}

fn recv_until<F>(rx: &crossbeam_channel::Receiver<DebateEvent>, mut done: F) -> Vec<DebateEvent>
where
    F: FnMut(&DebateEvent) -> bool,
{
    let mut events = Vec::new();
    loop {
        let event = rx
            .recv_timeout(Duration::from_secs(10))
            .expect("worker went quiet");
        let stop = done(&event);
        events.push(event);
        if stop {
            return events;
        }
    }
}

#[test]
fn test_worker_runs_session_and_reports_transcript() {
    let (a, b) = pair(Labeled::new("A"), Labeled::new("B"));
    let (handle, join) = DebateWorker::new(a, b).spawn().unwrap();
    let rx = handle.event_receiver();

    handle.start(TOPIC, 2).unwrap();
    let events = recv_until(&rx, |e| matches!(e, DebateEvent::Finished { .. }));

    assert!(matches!(events[0], DebateEvent::Started { rounds: 2, .. }));
    let turns = events
        .iter()
        .filter(|e| matches!(e, DebateEvent::TurnCompleted { .. }))
        .count();
    assert_eq!(turns, 4);

    match events.last() {
        Some(DebateEvent::Finished { transcript }) => {
            let texts: Vec<&str> = transcript.iter().map(|t| t.text.as_str()).collect();
            assert_eq!(texts, ["A1", "B1", "A2", "B2"]);
        }
        other => panic!("unexpected final event: {:?}", other),
    }

    handle.shutdown().unwrap();
    join.join().unwrap();
}

#[test]
fn test_worker_rejects_blank_topic() {
    let gen_a = Labeled::new("A");
    let (a, b) = pair(gen_a.clone(), Labeled::new("B"));
    let (handle, join) = DebateWorker::new(a, b).spawn().unwrap();
    let rx = handle.event_receiver();

    handle.start("  ", 2).unwrap();
    let events = recv_until(&rx, |e| matches!(e, DebateEvent::Failed { .. }));

    match &events[0] {
        DebateEvent::Failed { error, transcript } => {
            assert!(matches!(error, ParleyError::InvalidConfiguration(_)));
            assert!(transcript.is_empty());
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert!(gen_a.prompts().is_empty());

    handle.shutdown().unwrap();
    join.join().unwrap();
}

#[test]
fn test_worker_replays_cached_audio() {
    let synth = StubSynth::new(SynthMode::Tone);
    let (a, b) = pair(Labeled::new("A"), Labeled::new("B"));
    let a = a.with_synthesizer(synth.clone());
    let b = b.with_synthesizer(synth.clone());

    let player = Collected::default();
    let (handle, join) = DebateWorker::new(a, b)
        .with_player(player.clone())
        .spawn()
        .unwrap();
    let rx = handle.event_receiver();

    handle.start(TOPIC, 1).unwrap();
    let events = recv_until(&rx, |e| matches!(e, DebateEvent::Finished { .. }));
    let ready = events
        .iter()
        .filter(|e| matches!(e, DebateEvent::AudioReady { .. }))
        .count();
    assert_eq!(ready, 2);

    let transcript = match events.last() {
        Some(DebateEvent::Finished { transcript }) => transcript.clone(),
        other => panic!("unexpected final event: {:?}", other),
    };

    handle.speak_all(transcript).unwrap();
    let playback = recv_until(&rx, |e| matches!(e, DebateEvent::PlaybackFinished));
    let started: Vec<usize> = playback
        .iter()
        .filter_map(|e| match e {
            DebateEvent::PlaybackStarted { ordinal } => Some(*ordinal),
            _ => None,
        })
        .collect();

    assert_eq!(started, vec![1, 2]);
    assert_eq!(*player.ordinals.lock(), vec![1, 2]);
    // Replay comes from the cache, not a second synthesis
    assert_eq!(synth.calls.load(Ordering::SeqCst), 2);

    handle.shutdown().unwrap();
    join.join().unwrap();
}

#[test]
fn test_worker_speak_without_player_reports_error() {
    let (a, b) = pair(Labeled::new("A"), Labeled::new("B"));
    let (handle, join) = DebateWorker::new(a, b).spawn().unwrap();
    let rx = handle.event_receiver();

    let turn = Turn::new(1, 1, Speaker::A, "Optimist", "Hello");
    handle.speak(turn).unwrap();
    let events = recv_until(&rx, |e| matches!(e, DebateEvent::PlaybackFinished));

    assert!(matches!(events[0], DebateEvent::Error { .. }));

    handle.shutdown().unwrap();
    join.join().unwrap();
}

#[test]
fn test_worker_cancel_holds_for_queued_start() {
    let synth = StubSynth::new(SynthMode::Tone);
    let gen_a = Labeled::new("A");
    let (a, b) = pair(gen_a.clone(), Labeled::new("B"));
    let a = a.with_synthesizer(synth.clone());
    let b = b.with_synthesizer(synth.clone());

    let player = SlowPlayer::default();
    let (handle, join) = DebateWorker::new(a, b)
        .with_player(player.clone())
        .spawn()
        .unwrap();
    let rx = handle.event_receiver();

    let turns = vec![
        Turn::new(1, 1, Speaker::A, "Optimist", "Hello"),
        Turn::new(2, 1, Speaker::B, "Skeptic", "Hardly"),
    ];
    handle.speak_all(turns).unwrap();
    handle.start(TOPIC, 3).unwrap();
    handle.cancel().unwrap();

    let events = recv_until(&rx, |e| {
        matches!(
            e,
            DebateEvent::Cancelled { .. } | DebateEvent::Finished { .. } | DebateEvent::Failed { .. }
        )
    });

    match events.last() {
        Some(DebateEvent::Cancelled { transcript }) => assert!(transcript.is_empty()),
        other => panic!("expected a cancelled session, got {:?}", other),
    }
    assert_eq!(player.played.load(Ordering::SeqCst), 2);
    assert!(gen_a.prompts().is_empty());

    // The next start is not affected by the earlier cancel
    handle.start(TOPIC, 1).unwrap();
    let events = recv_until(&rx, |e| matches!(e, DebateEvent::Finished { .. }));
    match events.last() {
        Some(DebateEvent::Finished { transcript }) => assert_eq!(transcript.len(), 2),
        other => panic!("unexpected final event: {:?}", other),
    }

    handle.shutdown().unwrap();
    join.join().unwrap();
}
