//! Terminal front end
//!
//! `parley debate` runs a session in the foreground, printing each turn as it
//! lands and voicing it through the configured sinks. `parley assistant`
//! is a read-eval loop around the tool assistant.

pub mod format;
pub mod prompt;

use crate::agents::{self, presets};
use crate::assistant::{Assistant, AssistantReply, SalutationTool, ToolRegistry};
use crate::audio::{AudioSink, Recorder, SinkSet};
use crate::config::ParleyConfig;
use crate::debate::{CancelFlag, Orchestrator, Session, Speaker, Turn, TurnObserver};
use crate::speech::SpeechOptions;
use crate::{ParleyError, Result};
use clap::{Args, Parser, Subcommand};
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// Two AI personas debate a topic, out loud.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about = "Two AI personas debate a topic, out loud")]
pub struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a debate in the terminal
    Debate(DebateArgs),

    /// Chat with the tool-using assistant
    Assistant(AssistantArgs),

    /// Open the desktop interface
    Ui,
}

#[derive(Args, Debug, Default)]
pub struct DebateArgs {
    /// Topic to debate; asked for when omitted
    #[arg(long)]
    pub topic: Option<String>,

    /// Turns per participant; asked for when omitted
    #[arg(long)]
    pub turns: Option<usize>,

    /// Where to save the session recording
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Text only: no synthesis, playback or recording
    #[arg(long)]
    pub no_audio: bool,

    /// Record but do not play through the speakers
    #[arg(long)]
    pub no_playback: bool,
}

#[derive(Args, Debug, Default)]
pub struct AssistantArgs {
    /// Print replies without speaking them
    #[arg(long)]
    pub no_audio: bool,

    /// Talk instead of typing
    #[arg(long)]
    pub voice: bool,
}

/// Apply command-line overrides on top of the loaded configuration
pub fn apply_debate_args(mut config: ParleyConfig, args: &DebateArgs) -> ParleyConfig {
    if let Some(output) = &args.output {
        config = config.with_recording(output);
    }
    if args.no_audio {
        config = config.without_audio();
    }
    if args.no_playback {
        config = config.without_playback();
    }
    config
}

/// Prints progress the way the debate unfolds
pub struct TerminalObserver<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> TerminalObserver<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn print(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            warn!("Failed to write to terminal: {}", e);
        }
    }
}

impl<W: Write + Send> TurnObserver for TerminalObserver<W> {
    fn on_session_started(&mut self, session: &Session) {
        self.print(&format::intro("AI Debate - Two Agents Discussing a Topic"));
        self.print(&format::info(&format!("Starting a debate on: {}", session.topic())));
        self.print(&format::info(&format!(
            "The debate will continue for {} turns each. Press Ctrl+C to stop after the current turn.",
            session.rounds()
        )));
    }

    fn on_generating(&mut self, ordinal: usize, speaker: Speaker, _name: &str) {
        if speaker == Speaker::A {
            self.print(&format::step(&format!("Turn {}", ordinal.div_ceil(2))));
        }
    }

    fn on_turn(&mut self, turn: &Turn, _transcript: &[Turn]) {
        self.print(&format::note(&turn.name, &turn.text));
    }

    fn on_failed(&mut self, error: &ParleyError, transcript: &[Turn]) {
        self.print(&format::error(&format!(
            "{} ({} turns completed)",
            error.user_message(),
            transcript.len()
        )));
    }

    fn on_cancelled(&mut self, transcript: &[Turn]) {
        self.print(&format::outro(&format!(
            "Debate stopped after {} turns.",
            transcript.len()
        )));
    }
}

fn stdin_lock() -> io::StdinLock<'static> {
    io::stdin().lock()
}

fn debate_sinks(config: &ParleyConfig) -> Result<SinkSet> {
    let mut sinks = SinkSet::new();
    if !config.speech.enabled {
        return Ok(sinks);
    }

    if let Some(path) = &config.debate.recording_path {
        sinks.push(Box::new(Recorder::create(path, config.debate.recording_sample_rate)?));
    }

    if config.debate.playback {
        #[cfg(feature = "audio-io")]
        match crate::audio::Player::start() {
            Ok(player) => sinks.push(Box::new(crate::audio::SpeakerSink::new(player))),
            Err(e) => warn!("Playback disabled: {}", e),
        }
        #[cfg(not(feature = "audio-io"))]
        warn!("Playback disabled: built without the `audio-io` feature");
    }

    Ok(sinks)
}

/// Run one debate in the terminal and return its transcript
pub async fn run_debate(config: ParleyConfig, args: DebateArgs) -> Result<Vec<Turn>> {
    let config = apply_debate_args(config, &args);
    config.validate()?;

    let (topic, rounds) = {
        let mut stdin = stdin_lock();
        let mut stdout = io::stdout();
        let topic = match args.topic {
            Some(topic) => topic,
            None => prompt::prompt_topic(&mut stdin, &mut stdout)?,
        };
        let rounds = match args.turns {
            Some(turns) => turns,
            None => prompt::prompt_turns(&mut stdin, &mut stdout, config.debate.rounds)?,
        };
        (topic, rounds)
    };

    let mut session = Session::new(topic, rounds)?;
    let (a, b) = agents::debaters(&config).await?;

    let sinks = debate_sinks(&config)?;
    let recording = if sinks.is_empty() { None } else { config.debate.recording_path.clone() };

    let mut orchestrator = Orchestrator::new();
    if !sinks.is_empty() {
        orchestrator = orchestrator.with_sink(sinks);
    }

    let cancel = orchestrator.cancel_handle();
    let ctrl_c = tokio::spawn(async move {
        if watch_interrupts(cancel, interrupt_stream()).await {
            std::process::exit(130);
        }
    });

    let mut observer = TerminalObserver::new(io::stdout());
    let outcome = orchestrator.run(&mut session, &a, &b, &mut observer).await;
    ctrl_c.abort();

    match outcome {
        Ok(()) => {
            let message = match recording {
                Some(path) => format!("Debate concluded! The full audio has been saved to {}", path.display()),
                None => "Debate concluded!".to_string(),
            };
            observer.print(&format::outro(&message));
            Ok(session.into_turns())
        }
        Err(ParleyError::Cancelled) => Ok(session.into_turns()),
        Err(e) => Err(e),
    }
}

/// Every Ctrl-C from here on, one item each
fn interrupt_stream() -> BoxStream<'static, ()> {
    stream::unfold((), |()| async { tokio::signal::ctrl_c().await.ok().map(|()| ((), ())) }).boxed()
}

/// Raise `cancel` on the first interrupt
///
/// Returns `true` on a second interrupt, when the caller should exit
/// without waiting for the turn in flight.
async fn watch_interrupts<S>(cancel: CancelFlag, mut interrupts: S) -> bool
where
    S: Stream<Item = ()> + Unpin,
{
    if interrupts.next().await.is_none() {
        return false;
    }
    info!("Interrupt received, stopping after the current turn (press Ctrl+C again to quit)");
    cancel.cancel();

    if interrupts.next().await.is_none() {
        return false;
    }
    warn!("Second interrupt received, exiting");
    true
}

/// Interactive loop with the tool assistant
pub async fn run_assistant(config: ParleyConfig, args: AssistantArgs) -> Result<()> {
    let config = if args.no_audio { config.without_audio() } else { config };
    config.validate()?;

    let generator = agents::build_generator(&config).await?;
    let synthesizer = agents::build_synthesizer(&config)?;
    let voice = SpeechOptions::new(config.debate.optimist_voice.clone()).with_format(config.speech.format);

    let participant = presets::assistant(generator)
        .with_voice(voice)
        .with_optional_synthesizer(synthesizer);
    let assistant = Assistant::new(participant, ToolRegistry::new().with_tool(SalutationTool));

    let mut speaker = assistant_speaker(&config);

    if args.voice {
        return listen_loop(&config, &assistant, &mut speaker).await;
    }

    let mut stdout = io::stdout();
    println!("{}", format::intro("Assistant - type 'exit' to quit"));

    let mut lines = stdin_lock().lines();
    loop {
        write!(stdout, "│\n◆  ")?;
        stdout.flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let request = line.trim();
        if request.is_empty() {
            continue;
        }
        if matches!(request, "exit" | "quit") {
            break;
        }

        match assistant.respond(request).await {
            Ok(reply) => answer(&assistant, &mut speaker, &reply).await,
            Err(e) if e.is_recoverable() => println!("{}", format::error(&e.user_message())),
            Err(e) => return Err(e),
        }
    }

    println!("{}", format::outro("Goodbye!"));
    Ok(())
}

/// Spoken requests from the microphone until Ctrl-C
///
/// The listener is muted from the moment an utterance is taken until the
/// reply has finished playing.
#[cfg(feature = "audio-io")]
async fn listen_loop(
    config: &ParleyConfig,
    assistant: &Assistant,
    speaker: &mut Option<Box<dyn AudioSink>>,
) -> Result<()> {
    use crate::assistant::{discard_stale, Listener};
    use crate::audio::AudioInput;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let transcriber = agents::build_transcriber(config)?;
    let segmenter = agents::build_segmenter(config)?;

    let mut input = AudioInput::new()?;
    let (chunk_tx, chunk_rx) = crossbeam_channel::bounded(MIC_QUEUE);
    let muted = Arc::new(AtomicBool::new(false));
    let (mut utterances, _listener) =
        Listener::new(input.sample_rate(), segmenter)?.spawn(chunk_rx, Arc::clone(&muted))?;
    input.start(chunk_tx)?;

    println!("{}", format::intro("Assistant - speak when ready, Ctrl+C to quit"));
    let mut interrupts = interrupt_stream();

    loop {
        println!("{}", format::step("Listening..."));
        let samples = tokio::select! {
            utterance = utterances.recv() => match utterance {
                Some(samples) => samples,
                None => break,
            },
            _ = interrupts.next() => break,
        };

        muted.store(true, Ordering::Relaxed);
        let outcome = tokio::select! {
            outcome = assistant.respond_to_speech(transcriber.as_ref(), &samples) => outcome,
            _ = interrupts.next() => break,
        };

        match outcome {
            Ok(Some(exchange)) => {
                println!("{}", format::note("You", &exchange.heard));
                answer(assistant, speaker, &exchange.reply).await;
            }
            Ok(None) => info!("Nothing intelligible heard"),
            Err(e) if e.is_recoverable() => println!("{}", format::error(&e.user_message())),
            Err(e) => return Err(e),
        }
        discard_stale(&mut utterances);
        muted.store(false, Ordering::Relaxed);
    }

    input.stop();
    println!("{}", format::outro("Goodbye!"));
    Ok(())
}

#[cfg(not(feature = "audio-io"))]
async fn listen_loop(
    _config: &ParleyConfig,
    _assistant: &Assistant,
    _speaker: &mut Option<Box<dyn AudioSink>>,
) -> Result<()> {
    Err(ParleyError::ConfigError(
        "spoken input requires the `voice-input` feature".into(),
    ))
}

#[cfg(feature = "audio-io")]
const MIC_QUEUE: usize = 64;

/// Print a reply and voice it when there is a speaker
async fn answer(assistant: &Assistant, speaker: &mut Option<Box<dyn AudioSink>>, reply: &AssistantReply) {
    println!("{}", format::note(presets::ASSISTANT_NAME, &reply.text));
    if let Some(sink) = speaker.as_mut() {
        if let Err(e) = speak_reply(assistant, sink.as_mut(), &reply.text).await {
            warn!("Could not speak reply: {}", e);
        }
    }
}

fn assistant_speaker(config: &ParleyConfig) -> Option<Box<dyn AudioSink>> {
    if !config.speech.enabled || !config.debate.playback {
        return None;
    }

    #[cfg(feature = "audio-io")]
    match crate::audio::Player::start() {
        Ok(player) => return Some(Box::new(crate::audio::SpeakerSink::new(player))),
        Err(e) => warn!("Playback disabled: {}", e),
    }

    None
}

async fn speak_reply(assistant: &Assistant, sink: &mut dyn AudioSink, text: &str) -> Result<()> {
    let Some(stream) = assistant.participant().speak(text).await? else {
        return Ok(());
    };
    let audio = crate::speech::collect_stream(stream, assistant.participant().voice().format).await?;
    if audio.is_empty() {
        return Ok(());
    }

    let turn = Turn::new(1, 1, Speaker::A, presets::ASSISTANT_NAME, text);
    sink.consume(&turn, &audio).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_debate_flags() {
        let cli = Cli::try_parse_from([
            "parley", "debate", "--topic", "Remote work", "--turns", "2", "--no-playback",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Debate(args)) => {
                assert_eq!(args.topic.as_deref(), Some("Remote work"));
                assert_eq!(args.turns, Some(2));
                assert!(args.no_playback);
                assert!(!args.no_audio);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_assistant_voice_flag() {
        let cli = Cli::try_parse_from(["parley", "assistant", "--voice", "--no-audio"]).unwrap();
        match cli.command {
            Some(Command::Assistant(args)) => {
                assert!(args.voice);
                assert!(args.no_audio);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["parley", "assistant"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Assistant(AssistantArgs { voice: false, .. }))));
    }

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["parley", "--config", "custom.toml"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }

    #[test]
    fn test_rejects_non_numeric_turns() {
        assert!(Cli::try_parse_from(["parley", "debate", "--turns", "lots"]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let args = DebateArgs {
            output: Some(PathBuf::from("out.wav")),
            no_playback: true,
            ..Default::default()
        };
        let config = apply_debate_args(ParleyConfig::default(), &args);
        assert_eq!(config.debate.recording_path, Some(PathBuf::from("out.wav")));
        assert!(!config.debate.playback);
        assert!(config.speech.enabled);

        let silent = apply_debate_args(
            ParleyConfig::default(),
            &DebateArgs { no_audio: true, ..Default::default() },
        );
        assert!(!silent.speech.enabled);
        assert_eq!(silent.debate.recording_path, None);
    }

    #[tokio::test]
    async fn test_first_interrupt_cancels_second_exits() {
        let cancel = CancelFlag::new();
        let exit = watch_interrupts(cancel.clone(), stream::iter([(), ()])).await;
        assert!(cancel.is_cancelled());
        assert!(exit);

        let cancel = CancelFlag::new();
        let exit = watch_interrupts(cancel.clone(), stream::iter([()])).await;
        assert!(cancel.is_cancelled());
        assert!(!exit, "one interrupt only stops the debate");

        let cancel = CancelFlag::new();
        assert!(!watch_interrupts(cancel.clone(), stream::empty()).await);
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn test_terminal_observer_output() {
        let mut buffer = Vec::new();
        {
            let mut observer = TerminalObserver::new(&mut buffer);
            let turns = vec![
                Turn::new(1, 1, Speaker::A, "Optimist", "It will be great."),
                Turn::new(2, 1, Speaker::B, "Skeptic", "Doubt it."),
                Turn::new(3, 2, Speaker::A, "Optimist", "Wait and see."),
            ];
            observer.on_generating(1, Speaker::A, "Optimist");
            observer.on_turn(&turns[0], &turns[..1]);
            observer.on_generating(2, Speaker::B, "Skeptic");
            observer.on_turn(&turns[1], &turns[..2]);
            observer.on_generating(3, Speaker::A, "Optimist");
            observer.on_turn(&turns[2], &turns);
        }

        let shown = String::from_utf8(buffer).unwrap();
        assert_eq!(shown.matches("Turn 1").count(), 1);
        assert_eq!(shown.matches("Turn 2").count(), 1);
        assert!(shown.contains("Optimist"));
        assert!(shown.contains("Doubt it."));
    }
}
