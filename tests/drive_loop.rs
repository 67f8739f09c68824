use std::cell::Cell;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use spotter::{
    AlertEngine, AlertPolicy, AlertSettings, Clock, Detection, DetectorBackend, DriveLoop,
    DriveState, Frame, FrameSource, LabelResolver, SourceSettings, SourceStats, StopReason,
    StubBackend, SyntheticSource, Voice, VoiceMode, VoiceSink,
};

/// Clock that advances a fixed step on every read.
struct SteppingClock {
    next: Cell<f64>,
    step: f64,
}

impl SteppingClock {
    fn new(step: f64) -> Self {
        Self {
            next: Cell::new(0.0),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> f64 {
        let now = self.next.get();
        self.next.set(now + self.step);
        now
    }
}

#[derive(Clone, Default)]
struct RecordingSink {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl VoiceSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn speak(&mut self, utterance: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(utterance.to_string());
        Ok(())
    }
}

struct UnavailableSource;

impl FrameSource for UnavailableSource {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn open(&mut self) -> Result<()> {
        Err(anyhow!("no camera at index 0"))
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        Err(anyhow!("not opened"))
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: 0,
            uri: "unavailable".to_string(),
        }
    }
}

/// Yields `good_frames` frames and then fails the read.
struct FlakySource {
    good_frames: u64,
    served: u64,
    closed: Arc<Mutex<bool>>,
}

impl FrameSource for FlakySource {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        if self.served >= self.good_frames {
            return Err(anyhow!("device unplugged"));
        }
        self.served += 1;
        Ok(Some(Frame::new(vec![0u8; 4 * 4 * 3], 4, 4)))
    }

    fn close(&mut self) {
        *self.closed.lock().unwrap() = true;
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.served,
            uri: "flaky".to_string(),
        }
    }
}

struct BrokenBackend;

impl DetectorBackend for BrokenBackend {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<Vec<Detection>> {
        Err(anyhow!("tensor shape mismatch"))
    }
}

fn stub_source(frames: u64) -> Box<dyn FrameSource> {
    Box::new(SyntheticSource::new(SourceSettings {
        uri: "stub://test".to_string(),
        width: 16,
        height: 12,
        target_fps: 0,
        max_frames: Some(frames),
    }))
}

fn person_engine() -> AlertEngine {
    let labels = LabelResolver::from_text("person\ncar\ndog");
    let policy =
        AlertPolicy::from_entries([("person", "Person ahead!"), ("car", "Vehicle ahead!")])
            .unwrap();
    AlertEngine::new(AlertSettings::default(), labels, policy).unwrap()
}

#[test]
fn alerts_are_debounced_across_frames() -> Result<()> {
    let sink = RecordingSink::default();
    let backend = StubBackend::with_script(vec![vec![
        Detection::new(0, 0.9),
        Detection::new(2, 0.99),
    ]]);
    // Frames land at t = 0, 1, 2, ..., 7: person alerts at 0, 4.
    let mut drive = DriveLoop::new(
        stub_source(8),
        Box::new(backend),
        person_engine(),
        Voice::Direct(Box::new(sink.clone())),
        SteppingClock::new(1.0),
    );

    let stop = AtomicBool::new(false);
    let summary = drive.run(&stop)?;

    assert_eq!(summary.frames, 8);
    assert_eq!(summary.sightings, 16);
    assert_eq!(summary.alerts, 2);
    assert_eq!(summary.stop_reason, StopReason::EndOfStream);
    assert_eq!(drive.state(), DriveState::Stopped);
    assert_eq!(
        *sink.spoken.lock().unwrap(),
        vec!["Person ahead!", "Person ahead!"]
    );
    assert_eq!(drive.engine().ledger().get("person"), Some(4.0));
    assert_eq!(drive.engine().ledger().get("dog"), None);
    Ok(())
}

#[test]
fn queued_voice_speaks_the_same_alerts() -> Result<()> {
    let sink = RecordingSink::default();
    let backend = StubBackend::with_script(vec![
        vec![Detection::new(0, 0.9), Detection::new(1, 0.8)],
        vec![Detection::new(1, 0.8)],
    ]);
    let voice = Voice::with_mode(Box::new(sink.clone()), VoiceMode::Queued, 8)?;
    let mut drive = DriveLoop::new(
        stub_source(3),
        Box::new(backend),
        person_engine(),
        voice,
        SteppingClock::new(0.5),
    );

    let summary = drive.run(&AtomicBool::new(false))?;

    // run() drains the queue before returning.
    assert_eq!(summary.alerts, 2);
    assert_eq!(
        *sink.spoken.lock().unwrap(),
        vec!["Person ahead!", "Vehicle ahead!"]
    );
    Ok(())
}

#[test]
fn stop_flag_is_checked_before_each_frame() -> Result<()> {
    let mut drive = DriveLoop::new(
        stub_source(100),
        Box::new(StubBackend::new()),
        person_engine(),
        Voice::silent(),
        SteppingClock::new(1.0),
    );
    drive.start()?;
    assert_eq!(drive.state(), DriveState::Running);

    let summary = drive.run(&AtomicBool::new(true))?;
    assert_eq!(summary.frames, 0);
    assert_eq!(summary.stop_reason, StopReason::Interrupted);
    assert_eq!(drive.state(), DriveState::Stopped);
    Ok(())
}

#[test]
fn unavailable_capture_source_fails_before_running() {
    let sink = RecordingSink::default();
    let mut drive = DriveLoop::new(
        Box::new(UnavailableSource),
        Box::new(StubBackend::new()),
        person_engine(),
        Voice::Direct(Box::new(sink.clone())),
        SteppingClock::new(1.0),
    );

    let err = drive.start().unwrap_err();
    assert!(format!("{:#}", err).contains("capture source unavailable"));
    assert_eq!(drive.state(), DriveState::Failed);
    assert!(drive.run(&AtomicBool::new(false)).is_err());
    assert!(sink.spoken.lock().unwrap().is_empty());
}

#[test]
fn frame_read_failure_stops_gracefully() -> Result<()> {
    let closed = Arc::new(Mutex::new(false));
    let source = FlakySource {
        good_frames: 2,
        served: 0,
        closed: closed.clone(),
    };
    let mut drive = DriveLoop::new(
        Box::new(source),
        Box::new(StubBackend::with_script(vec![vec![Detection::new(0, 0.9)]])),
        person_engine(),
        Voice::silent(),
        SteppingClock::new(1.0),
    );

    let summary = drive.run(&AtomicBool::new(false))?;
    assert_eq!(summary.frames, 2);
    assert_eq!(summary.alerts, 1);
    assert_eq!(summary.stop_reason, StopReason::ReadFailed);
    assert!(*closed.lock().unwrap());
    Ok(())
}

#[test]
fn inference_failure_ends_the_run() -> Result<()> {
    let mut drive = DriveLoop::new(
        stub_source(5),
        Box::new(BrokenBackend),
        person_engine(),
        Voice::silent(),
        SteppingClock::new(1.0),
    );

    let summary = drive.run(&AtomicBool::new(false))?;
    assert_eq!(summary.frames, 1);
    assert_eq!(summary.alerts, 0);
    assert_eq!(summary.stop_reason, StopReason::InferenceFailed);
    Ok(())
}

#[test]
fn a_stopped_loop_cannot_run_again() -> Result<()> {
    let mut drive = DriveLoop::new(
        stub_source(1),
        Box::new(StubBackend::new()),
        person_engine(),
        Voice::silent(),
        SteppingClock::new(1.0),
    );
    drive.run(&AtomicBool::new(false))?;
    assert!(drive.run(&AtomicBool::new(false)).is_err());
    Ok(())
}
