//! Voice output.
//!
//! A `VoiceSink` speaks one utterance at a time. The drive loop talks to a
//! `Voice`, which either calls the sink inline (blocking on playback) or
//! forwards utterances through a bounded `VoiceQueue` so inference keeps
//! running while speech plays. Sink failures are logged and never reach the
//! drive loop.

mod espeak;
mod queue;

use anyhow::Result;
use serde::Deserialize;

use crate::alert::Utterance;
use crate::config::VoiceSettings;

pub use espeak::{EspeakSink, DEFAULT_PROGRAM, DEFAULT_RATE};
pub use queue::{VoiceQueue, DEFAULT_QUEUE_CAPACITY};

/// Something that can speak an utterance.
pub trait VoiceSink: Send {
    fn name(&self) -> &'static str;

    fn speak(&mut self, utterance: &str) -> Result<()>;
}

/// Log-only sink used when speech is disabled or unavailable.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentSink;

impl VoiceSink for SilentSink {
    fn name(&self) -> &'static str {
        "silent"
    }

    fn speak(&mut self, utterance: &str) -> Result<()> {
        log::info!("alert (silent): {}", utterance);
        Ok(())
    }
}

/// How utterances reach the sink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceMode {
    /// Speak inline; the drive loop waits for playback.
    #[default]
    Blocking,
    /// Hand off to a worker thread through a bounded queue.
    Queued,
}

pub enum Voice {
    Direct(Box<dyn VoiceSink>),
    Queued(VoiceQueue),
}

impl Voice {
    pub fn silent() -> Self {
        Voice::Direct(Box::new(SilentSink))
    }

    pub fn with_mode(sink: Box<dyn VoiceSink>, mode: VoiceMode, queue_capacity: usize) -> Result<Self> {
        match mode {
            VoiceMode::Blocking => Ok(Voice::Direct(sink)),
            VoiceMode::Queued => Ok(Voice::Queued(VoiceQueue::spawn(sink, queue_capacity)?)),
        }
    }

    pub fn sink_name(&self) -> &'static str {
        match self {
            Voice::Direct(sink) => sink.name(),
            Voice::Queued(queue) => queue.sink_name(),
        }
    }

    /// Speak or enqueue an utterance. Failures are logged, never returned.
    pub fn deliver(&mut self, utterance: &Utterance) {
        match self {
            Voice::Direct(sink) => {
                if let Err(err) = sink.speak(&utterance.text) {
                    log::warn!(
                        "voice sink {} failed to speak '{}': {:#}",
                        sink.name(),
                        utterance.text,
                        err
                    );
                }
            }
            Voice::Queued(queue) => {
                queue.submit(&utterance.text);
            }
        }
    }

    /// Drain any queued speech and stop the worker.
    pub fn shutdown(self) {
        if let Voice::Queued(queue) = self {
            queue.shutdown();
        }
    }
}

/// Build the configured voice. Any initialisation failure degrades to silent
/// mode with a single warning.
pub fn init_voice(settings: &VoiceSettings) -> Voice {
    if !settings.enabled {
        log::info!("voice output disabled; alerts will be logged only");
        return Voice::silent();
    }

    let sink = match EspeakSink::probe(&settings.program, settings.rate) {
        Ok(sink) => sink,
        Err(err) => {
            log::warn!("voice engine unavailable, continuing in silent mode: {:#}", err);
            return Voice::silent();
        }
    };

    match Voice::with_mode(Box::new(sink), settings.mode, settings.queue_capacity) {
        Ok(voice) => {
            log::info!(
                "voice output via {} ({:?}, rate {})",
                settings.program,
                settings.mode,
                settings.rate
            );
            voice
        }
        Err(err) => {
            log::warn!("voice queue failed to start, continuing in silent mode: {:#}", err);
            Voice::silent()
        }
    }
}
