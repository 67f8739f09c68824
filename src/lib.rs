//! Spotter
//!
//! Samples a camera, runs object detection on every frame, and turns
//! confident detections into spoken alerts for the operator.
//!
//! # Pipeline
//!
//! ```text
//! FrameSource -> Frame -> DetectorBackend -> [Detection]
//!     -> AlertEngine (LabelResolver, AlertPolicy, DebounceLedger) -> [Utterance]
//!     -> Voice (inline sink or bounded queue)
//! ```
//!
//! The alert engine enforces at most one alert per class within any
//! `cooldown_secs` window. Classes are throttled independently; there is no
//! global alert-rate cap.
//!
//! # Module Structure
//!
//! - `frame`: captured frames (private pixels, zeroized on drop)
//! - `ingest`: capture sources (synthetic, V4L2)
//! - `detect`: inference backends (scripted stub, tract ONNX)
//! - `labels`, `policy`: class names and per-class utterances
//! - `alert`: debounce ledger and dispatch engine
//! - `voice`: speech sinks and the non-blocking voice queue
//! - `pipeline`: the drive loop state machine
//! - `config`: file + environment configuration

pub mod alert;
pub mod config;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod labels;
pub mod pipeline;
pub mod policy;
pub mod voice;

pub use alert::{AlertEngine, AlertSettings, DebounceLedger, Dispatch, Sighting, Utterance};
pub use config::{DetectorSettings, SourceSettings, SpotterConfig, VoiceSettings};
pub use detect::{build_backend, BoundingBox, Detection, DetectorBackend, RawOutputs, StubBackend};
pub use frame::Frame;
pub use ingest::{open_source, FrameSource, SourceStats, SyntheticSource};
pub use labels::{LabelResolver, UNKNOWN_LABEL};
pub use pipeline::{Clock, DriveLoop, DriveState, MonotonicClock, RunSummary, StopReason};
pub use policy::AlertPolicy;
pub use voice::{init_voice, EspeakSink, SilentSink, Voice, VoiceMode, VoiceQueue, VoiceSink};
