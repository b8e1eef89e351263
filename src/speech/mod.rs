//! Speech synthesis and transcription backends
//!
//! This module provides:
//! - The [`Synthesizer`] capability and its lazy [`AudioStream`] output
//! - Hosted synthesis through the OpenAI speech endpoint
//! - Local VITS synthesis with sherpa-rs (feature `local-tts`), fed through
//!   [`normalize_for_speech`]
//! - The [`Transcriber`] capability for spoken requests, hosted or with
//!   whisper.cpp (feature `local-stt`)

pub mod normalize;
pub mod openai;
pub mod synth;
pub mod transcribe;
#[cfg(feature = "local-tts")]
pub mod vits;
#[cfg(feature = "local-stt")]
pub mod whisper;

pub use normalize::normalize_for_speech;
pub use openai::OpenAiSynthesizer;
pub use synth::{
    collect_stream, AudioFormat, AudioStream, EncodedAudio, SpeechOptions, Synthesizer,
};
pub use transcribe::{OpenAiTranscriber, Transcriber, LISTEN_SAMPLE_RATE};
#[cfg(feature = "local-tts")]
pub use vits::VitsSynthesizer;
#[cfg(feature = "local-stt")]
pub use whisper::WhisperTranscriber;
