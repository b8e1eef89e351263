#[cfg(feature = "audio-io")]
pub mod input;
#[cfg(feature = "audio-io")]
pub mod output;
pub mod recorder;
pub mod resampler;
pub mod sink;
pub mod vad;
pub mod wav;

#[cfg(feature = "audio-io")]
pub use input::AudioInput;
#[cfg(feature = "audio-io")]
pub use output::{AudioOutput, Player, SpeakerSink};
pub use recorder::Recorder;
pub use resampler::{resample_audio, AudioResampler};
pub use sink::{AudioSink, SinkSet};
#[cfg(feature = "voice-input")]
pub use vad::SileroDetector;
pub use vad::{SegmenterSettings, SpeechDetector, UtteranceSegmenter, VAD_CHUNK};
pub use wav::{decode, decode_wav, encode_wav, read_wav, write_wav, DecodedAudio};
