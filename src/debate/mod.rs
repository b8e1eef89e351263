//! Two-party debate sessions
//!
//! This module provides:
//! - The session data model ([`Session`], [`Turn`], [`Speaker`])
//! - Turn prompts and the strictly serial [`Orchestrator`]
//! - Progress reporting via [`TurnObserver`] and cooperative cancellation
//! - A background [`DebateWorker`] speaking a command/event protocol

pub mod events;
pub mod observer;
pub mod orchestrator;
pub mod prompts;
pub mod session;
pub mod worker;

pub use events::{DebateCommand, DebateEvent};
pub use observer::{ChannelObserver, NoopObserver, TurnObserver};
pub use orchestrator::{run_session, CancelFlag, Orchestrator, SessionFailure};
pub use prompts::{opening_prompt, prompt_for, rebuttal_prompt};
pub use session::{Session, Speaker, Turn};
pub use worker::{DebateHandle, DebateWorker};
