//! Voice activity detection and utterance segmentation
//!
//! Audio is scored in fixed 32 ms chunks at 16 kHz. An utterance opens on
//! the first voiced chunk and closes after enough trailing silence, or when
//! it grows past the maximum length.

use crate::config::ListenSettings;
use crate::speech::LISTEN_SAMPLE_RATE;
use tracing::debug;

/// Samples per detector call (32 ms at 16 kHz)
pub const VAD_CHUNK: usize = 512;

/// Scores how likely a chunk of 16 kHz mono audio is to contain speech
pub trait SpeechDetector: Send {
    /// Probability in 0.0..=1.0 for one [`VAD_CHUNK`]-sample chunk
    fn speech_probability(&mut self, chunk: &[f32]) -> f32;

    fn reset(&mut self) {}
}

/// Silero VAD through the `voice_activity_detector` crate
#[cfg(feature = "voice-input")]
pub struct SileroDetector {
    detector: voice_activity_detector::VoiceActivityDetector,
}

#[cfg(feature = "voice-input")]
impl SileroDetector {
    pub fn new() -> crate::Result<Self> {
        let detector = voice_activity_detector::VoiceActivityDetector::builder()
            .sample_rate(LISTEN_SAMPLE_RATE as i32)
            .chunk_size(VAD_CHUNK)
            .build()
            .map_err(|e| {
                crate::ParleyError::AudioProcessingError(format!("Failed to create VAD: {:?}", e))
            })?;

        tracing::info!("Initialized Silero VAD at {} Hz", LISTEN_SAMPLE_RATE);
        Ok(Self { detector })
    }
}

#[cfg(feature = "voice-input")]
impl SpeechDetector for SileroDetector {
    fn speech_probability(&mut self, chunk: &[f32]) -> f32 {
        self.detector.predict(chunk.iter().copied())
    }

    fn reset(&mut self) {
        self.detector.reset();
    }
}

/// Thresholds for cutting the input into utterances
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmenterSettings {
    /// Probability at or above which a chunk is voiced
    pub threshold: f32,
    pub silence_secs: f32,
    pub min_utterance_secs: f32,
    pub max_utterance_secs: f32,
}

impl Default for SegmenterSettings {
    fn default() -> Self {
        Self::from(&ListenSettings::default())
    }
}

impl From<&ListenSettings> for SegmenterSettings {
    fn from(listen: &ListenSettings) -> Self {
        Self {
            threshold: listen.vad_threshold,
            silence_secs: listen.silence_secs,
            min_utterance_secs: listen.min_utterance_secs,
            max_utterance_secs: listen.max_utterance_secs,
        }
    }
}

/// Cuts a continuous 16 kHz stream into utterances
pub struct UtteranceSegmenter {
    detector: Box<dyn SpeechDetector>,
    settings: SegmenterSettings,
    pending: Vec<f32>,
    utterance: Vec<f32>,
    in_speech: bool,
    silence_secs: f32,
}

impl UtteranceSegmenter {
    pub fn new(detector: Box<dyn SpeechDetector>, settings: SegmenterSettings) -> Self {
        Self {
            detector,
            settings,
            pending: Vec::with_capacity(VAD_CHUNK),
            utterance: Vec::new(),
            in_speech: false,
            silence_secs: 0.0,
        }
    }

    pub fn is_in_speech(&self) -> bool {
        self.in_speech
    }

    /// Feed samples of any length; returns the utterances they completed
    pub fn push(&mut self, samples: &[f32]) -> Vec<Vec<f32>> {
        self.pending.extend_from_slice(samples);

        let mut completed = Vec::new();
        while self.pending.len() >= VAD_CHUNK {
            let chunk: Vec<f32> = self.pending.drain(..VAD_CHUNK).collect();
            if let Some(utterance) = self.process_chunk(&chunk) {
                completed.push(utterance);
            }
        }
        completed
    }

    /// Drop buffered audio and any half-heard utterance
    pub fn reset(&mut self) {
        self.pending.clear();
        self.clear_utterance();
        self.detector.reset();
    }

    fn process_chunk(&mut self, chunk: &[f32]) -> Option<Vec<f32>> {
        let chunk_secs = chunk.len() as f32 / LISTEN_SAMPLE_RATE as f32;
        let voiced = self.detector.speech_probability(chunk) >= self.settings.threshold;

        if voiced {
            if !self.in_speech {
                debug!("Speech started");
                self.in_speech = true;
                self.utterance.clear();
            }
            self.utterance.extend_from_slice(chunk);
            self.silence_secs = 0.0;

            if self.utterance_secs() >= self.settings.max_utterance_secs {
                debug!("Maximum utterance length reached");
                return Some(self.take_utterance());
            }
        } else if self.in_speech {
            self.utterance.extend_from_slice(chunk);
            self.silence_secs += chunk_secs;

            if self.silence_secs >= self.settings.silence_secs {
                let spoken = self.utterance_secs() - self.silence_secs;
                if spoken >= self.settings.min_utterance_secs {
                    debug!("Utterance of {:.2}s complete", spoken);
                    return Some(self.take_utterance());
                }
                debug!("Utterance too short ({:.2}s), discarding", spoken);
                self.clear_utterance();
            }
        }

        None
    }

    fn utterance_secs(&self) -> f32 {
        self.utterance.len() as f32 / LISTEN_SAMPLE_RATE as f32
    }

    fn take_utterance(&mut self) -> Vec<f32> {
        self.in_speech = false;
        self.silence_secs = 0.0;
        std::mem::take(&mut self.utterance)
    }

    fn clear_utterance(&mut self) {
        self.in_speech = false;
        self.silence_secs = 0.0;
        self.utterance.clear();
    }
}
