//! Desktop interface
//!
//! A topic form, the transcript as it grows, and replay buttons per turn.
//! All generation and playback happens on the debate worker; the UI only
//! sends commands and drains events each frame.

mod app;
pub mod components;
mod state;
mod theme;

pub use app::ParleyApp;
pub use state::{AppState, DebatePhase, MAX_ROUNDS, MIN_ROUNDS};
pub use theme::Theme;

use crate::agents;
use crate::config::ParleyConfig;
use crate::debate::{DebateHandle, DebateWorker};
use crate::Result;
use tokio::runtime::Runtime;
use tracing::{error, warn};

/// Build the participants and spawn the worker that serves the UI
pub fn start_backend(config: &ParleyConfig, runtime: &Runtime) -> Result<DebateHandle> {
    config.validate()?;
    let (a, b) = runtime.block_on(agents::debaters(config))?;

    let mut worker = DebateWorker::new(a, b);

    if let Some(path) = &config.debate.recording_path {
        if config.speech.enabled {
            worker = worker.with_recording(path, config.debate.recording_sample_rate);
        }
    }

    if config.speech.enabled && config.debate.playback {
        #[cfg(feature = "audio-io")]
        match crate::audio::Player::start() {
            Ok(player) => worker = worker.with_player(crate::audio::SpeakerSink::new(player)),
            Err(e) => warn!("Playback disabled: {}", e),
        }
        #[cfg(not(feature = "audio-io"))]
        warn!("Playback disabled: built without the `audio-io` feature");
    }

    // The worker runs detached and exits on Shutdown
    let (handle, _join) = worker.spawn()?;
    Ok(handle)
}

/// Run the desktop application
pub fn run(config: ParleyConfig) -> eframe::Result<()> {
    let runtime = Runtime::new().map_err(|e| eframe::Error::AppCreation(Box::new(e)))?;

    let backend = start_backend(&config, &runtime);
    if let Err(e) = &backend {
        error!("Debate backend unavailable: {}", e);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 720.0])
            .with_min_inner_size([600.0, 400.0])
            .with_title("Parley"),
        ..Default::default()
    };

    let rounds = config.debate.rounds;
    let result = eframe::run_native(
        "Parley",
        options,
        Box::new(move |cc| Ok(Box::new(ParleyApp::new(cc, backend, rounds)))),
    );

    drop(runtime);
    result
}
