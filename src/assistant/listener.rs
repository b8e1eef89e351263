//! Microphone chunks in, finished utterances out
//!
//! The listener runs on its own thread: it converts device-rate audio to
//! 16 kHz, cuts it into utterances and hands each one to the async side
//! over a Tokio channel. While muted (the assistant is talking) input is
//! discarded so the assistant does not hear itself.

use crate::audio::{AudioResampler, UtteranceSegmenter};
use crate::speech::LISTEN_SAMPLE_RATE;
use crate::{ParleyError, Result};
use crossbeam_channel::Receiver;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const UTTERANCE_QUEUE: usize = 4;

pub struct Listener {
    resampler: Option<AudioResampler>,
    segmenter: UtteranceSegmenter,
}

impl Listener {
    /// Listen to mono input arriving at `input_rate`
    pub fn new(input_rate: u32, segmenter: UtteranceSegmenter) -> Result<Self> {
        let resampler = if input_rate == LISTEN_SAMPLE_RATE {
            None
        } else {
            Some(AudioResampler::new(input_rate, LISTEN_SAMPLE_RATE, 1)?)
        };

        Ok(Self { resampler, segmenter })
    }

    /// Feed one chunk of input; returns the utterances it completed
    pub fn feed(&mut self, samples: &[f32]) -> Result<Vec<Vec<f32>>> {
        match self.resampler.as_mut() {
            Some(resampler) => {
                let converted = resampler.push(samples)?;
                Ok(self.segmenter.push(&converted))
            }
            None => Ok(self.segmenter.push(samples)),
        }
    }

    /// Forget anything half-heard
    pub fn reset(&mut self) {
        self.segmenter.reset();
    }

    /// Run on a background thread until `chunks` closes or the returned
    /// receiver is dropped
    pub fn spawn(
        mut self,
        chunks: Receiver<Vec<f32>>,
        muted: Arc<AtomicBool>,
    ) -> Result<(mpsc::Receiver<Vec<f32>>, JoinHandle<()>)> {
        let (utterance_tx, utterance_rx) = mpsc::channel(UTTERANCE_QUEUE);

        let join = thread::Builder::new()
            .name("listener".into())
            .spawn(move || {
                info!("Listener started");
                let mut was_muted = false;

                for chunk in chunks.iter() {
                    if muted.load(Ordering::Relaxed) {
                        if !was_muted {
                            debug!("Listener muted");
                            self.reset();
                        }
                        was_muted = true;
                        continue;
                    }
                    was_muted = false;

                    let utterances = match self.feed(&chunk) {
                        Ok(utterances) => utterances,
                        Err(e) => {
                            warn!("Dropping microphone chunk: {}", e);
                            continue;
                        }
                    };

                    for utterance in utterances {
                        if utterance_tx.blocking_send(utterance).is_err() {
                            info!("Listener stopped: nobody is waiting for utterances");
                            return;
                        }
                    }
                }

                info!("Listener stopped: microphone closed");
            })
            .map_err(|e| ParleyError::ChannelError(format!("Failed to spawn listener: {}", e)))?;

        Ok((utterance_rx, join))
    }
}

/// Drop utterances that finished before the listener was muted
///
/// Call before unmuting, otherwise speech from before the reply (or the
/// start of the reply itself) gets answered afterwards.
pub fn discard_stale(utterances: &mut mpsc::Receiver<Vec<f32>>) -> usize {
    let mut dropped = 0;
    while utterances.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        debug!("Discarded {} stale utterance(s)", dropped);
    }
    dropped
}
