//! Drive loop: frame -> inference -> dispatch -> voice, one frame at a time.
//!
//! ```text
//! Init --start ok--> Running --end of stream / read error / stop flag--> Stopped
//!   \--start err--> Failed
//! ```
//!
//! The stop flag is checked between iterations only; an in-flight read or
//! inference call is never interrupted. Nothing is retried.

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::alert::{AlertEngine, Dispatch};
use crate::detect::DetectorBackend;
use crate::ingest::FrameSource;
use crate::voice::Voice;

/// Monotonic time source for alert timestamps, in seconds.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Seconds elapsed since construction.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriveState {
    Init,
    Running,
    Stopped,
    /// The capture source could not be opened.
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The stop flag was raised (operator interrupt).
    Interrupted,
    EndOfStream,
    ReadFailed,
    InferenceFailed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub sightings: u64,
    pub alerts: u64,
    pub stop_reason: StopReason,
}

pub struct DriveLoop<C: Clock = MonotonicClock> {
    source: Box<dyn FrameSource>,
    backend: Option<Box<dyn DetectorBackend>>,
    engine: AlertEngine,
    voice: Option<Voice>,
    clock: C,
    state: DriveState,
}

impl<C: Clock> DriveLoop<C> {
    pub fn new(
        source: Box<dyn FrameSource>,
        backend: Box<dyn DetectorBackend>,
        engine: AlertEngine,
        voice: Voice,
        clock: C,
    ) -> Self {
        Self {
            source,
            backend: Some(backend),
            engine,
            voice: Some(voice),
            clock,
            state: DriveState::Init,
        }
    }

    pub fn state(&self) -> DriveState {
        self.state
    }

    pub fn engine(&self) -> &AlertEngine {
        &self.engine
    }

    /// Open the capture source and warm up the backend.
    ///
    /// A source that cannot be opened moves the loop to `Failed`.
    pub fn start(&mut self) -> Result<()> {
        if self.state != DriveState::Init {
            return Err(anyhow!("drive loop cannot start from {:?}", self.state));
        }
        if let Err(err) = self.source.open() {
            log::error!(
                "could not open capture source {}: {:#}",
                self.source.name(),
                err
            );
            self.state = DriveState::Failed;
            self.release();
            return Err(err.context("capture source unavailable"));
        }
        if let Some(backend) = self.backend.as_mut() {
            if let Err(err) = backend.warm_up() {
                log::error!("detector {} failed to warm up: {:#}", backend.name(), err);
                self.state = DriveState::Failed;
                self.source.close();
                self.release();
                return Err(err.context("detector warm-up failed"));
            }
        }
        self.state = DriveState::Running;
        log::info!(
            "drive loop running: source={} detector={} voice={}",
            self.source.name(),
            self.backend.as_ref().map(|b| b.name()).unwrap_or("none"),
            self.voice.as_ref().map(Voice::sink_name).unwrap_or("none")
        );
        Ok(())
    }

    /// Process frames until end of stream, a read or inference failure, or
    /// `stop` is raised. Resources are released before returning.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<RunSummary> {
        if self.state == DriveState::Init {
            self.start()?;
        }
        if self.state != DriveState::Running {
            return Err(anyhow!("drive loop cannot run from {:?}", self.state));
        }
        let (Some(backend), Some(voice)) = (self.backend.as_mut(), self.voice.as_mut()) else {
            return Err(anyhow!("drive loop resources already released"));
        };

        let mut frames = 0u64;
        let mut sightings = 0u64;
        let mut alerts = 0u64;

        let stop_reason = loop {
            if stop.load(Ordering::SeqCst) {
                log::info!("stop requested");
                break StopReason::Interrupted;
            }

            let frame = match self.source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    log::info!("capture source reached end of stream");
                    break StopReason::EndOfStream;
                }
                Err(err) => {
                    log::warn!("failed to grab frame: {:#}", err);
                    break StopReason::ReadFailed;
                }
            };
            frames += 1;

            let detections = match frame.run_detector(&mut **backend) {
                Ok(detections) => detections,
                Err(err) => {
                    log::error!("inference failed on frame {}: {:#}", frames, err);
                    break StopReason::InferenceFailed;
                }
            };
            log::debug!("frame {} processed in {:?}", frames, frame.age());
            drop(frame);

            let dispatch = self.engine.dispatch(&detections, self.clock.now());
            log_frame(frames, &dispatch);
            sightings += dispatch.sightings.len() as u64;
            alerts += dispatch.utterances.len() as u64;
            for utterance in &dispatch.utterances {
                voice.deliver(utterance);
            }
        };

        let stats = self.source.stats();
        self.source.close();
        self.release();
        self.state = DriveState::Stopped;

        let summary = RunSummary {
            frames,
            sightings,
            alerts,
            stop_reason,
        };
        log::info!(
            "drive loop stopped ({:?}): {} frames, {} sightings, {} alerts; {} captured {} frames",
            summary.stop_reason,
            summary.frames,
            summary.sightings,
            summary.alerts,
            stats.uri,
            stats.frames_captured
        );
        Ok(summary)
    }

    /// Drop the detector and drain the voice.
    fn release(&mut self) {
        self.backend.take();
        if let Some(voice) = self.voice.take() {
            voice.shutdown();
        }
    }
}

fn log_frame(frame_index: u64, dispatch: &Dispatch) {
    if dispatch.sightings.is_empty() {
        log::info!("frame {}: no high confidence objects detected", frame_index);
    }
    for sighting in &dispatch.sightings {
        log::info!(
            "frame {}: {} {:.2}",
            frame_index,
            sighting.class_name,
            sighting.confidence
        );
    }
    for utterance in &dispatch.utterances {
        log::info!("alert [{}]: {}", utterance.class_name, utterance.text);
    }
    log::info!("{}", "-".repeat(40));
}
