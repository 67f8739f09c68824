use anyhow::{anyhow, Context, Result};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::JoinHandle;

use super::VoiceSink;

pub const DEFAULT_QUEUE_CAPACITY: usize = 4;

/// Bounded hand-off between the drive loop and a voice sink.
///
/// A worker thread owns the sink and speaks utterances in submission order.
/// `submit` never blocks: when the queue is full the utterance is dropped.
pub struct VoiceQueue {
    tx: Option<SyncSender<String>>,
    worker: Option<JoinHandle<()>>,
    sink_name: &'static str,
}

impl VoiceQueue {
    pub fn spawn(mut sink: Box<dyn VoiceSink>, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(anyhow!("voice queue capacity must be at least 1"));
        }
        let sink_name = sink.name();
        let (tx, rx) = mpsc::sync_channel::<String>(capacity);
        let worker = std::thread::Builder::new()
            .name("voice".to_string())
            .spawn(move || {
                for utterance in rx {
                    if let Err(err) = sink.speak(&utterance) {
                        log::warn!(
                            "voice sink {} failed to speak '{}': {:#}",
                            sink.name(),
                            utterance,
                            err
                        );
                    }
                }
            })
            .context("failed to spawn voice worker")?;
        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
            sink_name,
        })
    }

    pub fn sink_name(&self) -> &'static str {
        self.sink_name
    }

    /// Enqueue an utterance. Returns false if it was dropped.
    pub fn submit(&self, utterance: &str) -> bool {
        let Some(tx) = self.tx.as_ref() else {
            return false;
        };
        match tx.try_send(utterance.to_string()) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                log::warn!("voice queue full, dropping '{}'", dropped);
                false
            }
            Err(TrySendError::Disconnected(dropped)) => {
                log::warn!("voice worker stopped, dropping '{}'", dropped);
                false
            }
        }
    }

    /// Close the queue, let the worker finish what is queued, and join it.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("voice worker panicked");
            }
        }
    }
}

impl Drop for VoiceQueue {
    fn drop(&mut self) {
        self.stop();
    }
}
