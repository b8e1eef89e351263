//! Background debate worker
//!
//! Sessions run on a dedicated thread with its own Tokio runtime so a UI
//! render loop never blocks. Callers talk to it through a [`DebateHandle`]:
//! commands go in over one channel, [`DebateEvent`]s come back over another.

use crate::agents::Participant;
use crate::audio::{AudioSink, Recorder, SinkSet};
use crate::debate::events::{DebateCommand, DebateEvent};
use crate::debate::observer::ChannelObserver;
use crate::debate::orchestrator::{CancelFlag, Orchestrator};
use crate::debate::session::{Session, Speaker, Turn};
use crate::speech::{collect_stream, EncodedAudio};
use crate::{ParleyError, Result};
use async_trait::async_trait;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};

type AudioCache = Arc<Mutex<HashMap<usize, EncodedAudio>>>;

/// Caller side of a running [`DebateWorker`]
#[derive(Clone)]
pub struct DebateHandle {
    command_tx: Sender<DebateCommand>,
    event_rx: Receiver<DebateEvent>,
    cancel: CancelFlag,
    stop_playback: CancelFlag,
}

impl DebateHandle {
    pub fn send_command(&self, cmd: DebateCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| ParleyError::ChannelError(format!("Failed to send command: {}", e)))
    }

    pub fn try_recv_event(&self) -> Option<DebateEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn event_receiver(&self) -> Receiver<DebateEvent> {
        self.event_rx.clone()
    }

    /// Queue a session behind whatever the worker is doing
    ///
    /// The cancel flag is cleared here rather than when the worker picks
    /// the command up, so a cancel issued while the start is queued holds.
    pub fn start(&self, topic: impl Into<String>, rounds: usize) -> Result<()> {
        self.cancel.reset();
        self.send_command(DebateCommand::Start {
            topic: topic.into(),
            rounds,
        })
    }

    /// Stop the running session before its next turn
    ///
    /// The flag is raised directly because the worker does not read
    /// commands while a session is in progress.
    pub fn cancel(&self) -> Result<()> {
        self.cancel.cancel();
        self.send_command(DebateCommand::Cancel)
    }

    pub fn speak(&self, turn: Turn) -> Result<()> {
        self.send_command(DebateCommand::Speak { turn })
    }

    pub fn speak_all(&self, turns: Vec<Turn>) -> Result<()> {
        self.send_command(DebateCommand::SpeakAll { turns })
    }

    /// Skip the rest of the playback queue after the current utterance
    pub fn stop_playback(&self) -> Result<()> {
        self.stop_playback.cancel();
        self.send_command(DebateCommand::StopPlayback)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send_command(DebateCommand::Shutdown)
    }
}

/// Runs debates between two fixed participants
pub struct DebateWorker {
    a: Participant,
    b: Participant,
    player: Option<Box<dyn AudioSink>>,
    recording: Option<(PathBuf, u32)>,
    queue_size: usize,
}

impl DebateWorker {
    pub fn new(a: Participant, b: Participant) -> Self {
        Self {
            a,
            b,
            player: None,
            recording: None,
            queue_size: 100,
        }
    }

    /// Sink used for `Speak` / `SpeakAll`
    pub fn with_player(mut self, player: impl AudioSink + 'static) -> Self {
        self.player = Some(Box::new(player));
        self
    }

    /// Record every session to `path`, overwriting the previous one
    pub fn with_recording(mut self, path: impl Into<PathBuf>, sample_rate: u32) -> Self {
        self.recording = Some((path.into(), sample_rate));
        self
    }

    /// Spawn the worker thread
    pub fn spawn(self) -> Result<(DebateHandle, JoinHandle<()>)> {
        let (command_tx, command_rx) = bounded(self.queue_size);
        let (event_tx, event_rx) = bounded(self.queue_size);

        let handle = DebateHandle {
            command_tx,
            event_rx,
            cancel: CancelFlag::new(),
            stop_playback: CancelFlag::new(),
        };

        let cancel = handle.cancel.clone();
        let stop_playback = handle.stop_playback.clone();

        let join = thread::Builder::new()
            .name("debate-worker".into())
            .spawn(move || {
                info!("Debate worker starting");

                let runtime = match Runtime::new() {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!("Failed to create tokio runtime: {}", e);
                        let _ = event_tx.send(DebateEvent::Error {
                            message: format!("Runtime creation failed: {}", e),
                        });
                        let _ = event_tx.send(DebateEvent::Shutdown);
                        return;
                    }
                };

                let mut state = WorkerState {
                    worker: self,
                    event_tx,
                    cancel,
                    stop_playback,
                    cache: Arc::new(Mutex::new(HashMap::new())),
                };

                info!("Debate worker ready");

                loop {
                    match command_rx.recv() {
                        Ok(DebateCommand::Start { topic, rounds }) => {
                            runtime.block_on(state.run_session(topic, rounds));
                        }

                        Ok(DebateCommand::Cancel) => {
                            debug!("Cancel received while idle");
                        }

                        Ok(DebateCommand::Speak { turn }) => {
                            state.stop_playback.reset();
                            runtime.block_on(state.speak(vec![turn]));
                        }

                        Ok(DebateCommand::SpeakAll { turns }) => {
                            state.stop_playback.reset();
                            runtime.block_on(state.speak(turns));
                        }

                        Ok(DebateCommand::StopPlayback) => {
                            debug!("Stop playback received while idle");
                        }

                        Ok(DebateCommand::Shutdown) => {
                            info!("Debate worker shutting down");
                            let _ = state.event_tx.send(DebateEvent::Shutdown);
                            break;
                        }

                        Err(e) => {
                            error!("Command channel error: {}", e);
                            break;
                        }
                    }
                }

                info!("Debate worker stopped");
            })
            .map_err(|e| ParleyError::ChannelError(format!("Failed to spawn debate worker: {}", e)))?;

        Ok((handle, join))
    }
}

struct WorkerState {
    worker: DebateWorker,
    event_tx: Sender<DebateEvent>,
    cancel: CancelFlag,
    stop_playback: CancelFlag,
    cache: AudioCache,
}

impl WorkerState {
    fn emit(&self, event: DebateEvent) {
        if self.event_tx.send(event).is_err() {
            warn!("Debate event dropped: receiver gone");
        }
    }

    fn participant(&self, speaker: Speaker) -> &Participant {
        match speaker {
            Speaker::A => &self.worker.a,
            Speaker::B => &self.worker.b,
        }
    }

    async fn run_session(&mut self, topic: String, rounds: usize) {
        self.cache.lock().clear();

        let mut session = match Session::new(topic, rounds) {
            Ok(session) => session,
            Err(error) => {
                self.emit(DebateEvent::Failed {
                    error,
                    transcript: Vec::new(),
                });
                return;
            }
        };

        let mut sinks = SinkSet::new().with(CacheSink {
            cache: Arc::clone(&self.cache),
            event_tx: self.event_tx.clone(),
        });

        if let Some((path, sample_rate)) = &self.worker.recording {
            match Recorder::create(path, *sample_rate) {
                Ok(recorder) => sinks.push(Box::new(recorder)),
                Err(e) => warn!("Recording disabled: {}", e),
            }
        }

        let mut orchestrator = Orchestrator::new()
            .with_cancel_flag(self.cancel.clone())
            .with_sink(sinks);
        let mut observer = ChannelObserver::new(self.event_tx.clone());

        // Outcome is reported through the observer
        let _ = orchestrator
            .run(&mut session, &self.worker.a, &self.worker.b, &mut observer)
            .await;
    }

    async fn audio_for(&self, turn: &Turn) -> Result<EncodedAudio> {
        if let Some(audio) = self.cache.lock().get(&turn.ordinal) {
            return Ok(audio.clone());
        }

        let participant = self.participant(turn.speaker);
        let stream = participant.speak(&turn.text).await?.ok_or_else(|| {
            ParleyError::SynthesisFailure(format!("{} has no voice configured", participant.name()))
        })?;
        let audio = collect_stream(stream, participant.voice().format).await?;

        self.cache.lock().insert(turn.ordinal, audio.clone());
        self.emit(DebateEvent::AudioReady {
            ordinal: turn.ordinal,
            audio: audio.clone(),
        });
        Ok(audio)
    }

    async fn speak(&mut self, turns: Vec<Turn>) {
        if self.worker.player.is_none() {
            self.emit(DebateEvent::Error {
                message: "Audio playback is not available".into(),
            });
            self.emit(DebateEvent::PlaybackFinished);
            return;
        }

        for turn in turns {
            if self.stop_playback.is_cancelled() {
                debug!("Playback queue stopped before turn {}", turn.ordinal);
                break;
            }

            let audio = match self.audio_for(&turn).await {
                Ok(audio) if audio.is_empty() => {
                    info!("No audio for turn {}, skipping", turn.ordinal);
                    continue;
                }
                Ok(audio) => audio,
                Err(e) => {
                    self.emit(DebateEvent::Error {
                        message: e.user_message(),
                    });
                    break;
                }
            };

            self.emit(DebateEvent::PlaybackStarted {
                ordinal: turn.ordinal,
            });

            let played = match self.worker.player.as_mut() {
                Some(player) => player.consume(&turn, &audio).await,
                None => Ok(()),
            };

            if let Err(e) = played {
                self.emit(DebateEvent::Error {
                    message: e.user_message(),
                });
                break;
            }
        }

        self.emit(DebateEvent::PlaybackFinished);
    }
}

/// Keeps each voiced turn for replay and announces it
struct CacheSink {
    cache: AudioCache,
    event_tx: Sender<DebateEvent>,
}

#[async_trait]
impl AudioSink for CacheSink {
    async fn consume(&mut self, turn: &Turn, audio: &EncodedAudio) -> Result<()> {
        self.cache.lock().insert(turn.ordinal, audio.clone());
        let _ = self.event_tx.send(DebateEvent::AudioReady {
            ordinal: turn.ordinal,
            audio: audio.clone(),
        });
        Ok(())
    }
}
