//! Destinations for voiced turns

use crate::debate::Turn;
use crate::speech::EncodedAudio;
use crate::Result;
use async_trait::async_trait;
use tracing::warn;

/// Receives each utterance once its audio stream has been drained
///
/// `consume` must not return before the audio has been fully handled, so a
/// playing sink finishes speaking turn `n` before turn `n + 1` is generated.
#[async_trait]
pub trait AudioSink: Send {
    async fn consume(&mut self, turn: &Turn, audio: &EncodedAudio) -> Result<()>;

    /// Called once after the last turn, including after failures
    async fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Fans utterances out to several sinks in order
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Box<dyn AudioSink>>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl AudioSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn push(&mut self, sink: Box<dyn AudioSink>) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

#[async_trait]
impl AudioSink for SinkSet {
    async fn consume(&mut self, turn: &Turn, audio: &EncodedAudio) -> Result<()> {
        for sink in self.sinks.iter_mut() {
            sink.consume(turn, audio).await?;
        }
        Ok(())
    }

    /// Finishes every sink even if one fails; the first error wins
    async fn finish(&mut self) -> Result<()> {
        let mut first_error = None;
        for sink in self.sinks.iter_mut() {
            if let Err(e) = sink.finish().await {
                warn!("Audio sink failed to finish: {}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
