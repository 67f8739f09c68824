//! Frame capture sources.
//!
//! This module provides the sources the drive loop reads frames from:
//! - Synthetic patterned frames (`stub://` URIs, testing and demos)
//! - USB/V4L2 cameras (feature: ingest-v4l2)
//!
//! All sources produce `Frame` instances that are handed to the detector and
//! dropped at the end of the iteration. Sources MUST NOT:
//! - Store frames to disk
//! - Log frame content

pub(crate) mod normalize;
pub mod synthetic;
#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

use anyhow::Result;

use crate::config::SourceSettings;
use crate::frame::Frame;

pub use synthetic::SyntheticSource;
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::V4l2Source;

/// Frame statistics reported by a source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub uri: String,
}

/// A capture source driven by the drive loop.
pub trait FrameSource {
    /// Source identifier, for logging.
    fn name(&self) -> &'static str;

    /// Open the underlying device. Failure here is fatal for the run.
    fn open(&mut self) -> Result<()>;

    /// Read the next frame.
    ///
    /// `Ok(None)` signals end of stream. Both `Ok(None)` and `Err` end the run.
    fn read_frame(&mut self) -> Result<Option<Frame>>;

    /// Release the device. Called once when the drive loop stops.
    fn close(&mut self) {}

    fn stats(&self) -> SourceStats;
}

/// Build the source named by `settings.uri`.
///
/// `stub://` URIs produce synthetic frames; anything else is treated as a
/// V4L2 device path when that feature is enabled.
pub fn open_source(settings: &SourceSettings) -> Result<Box<dyn FrameSource>> {
    if settings.uri.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(settings.clone())));
    }
    #[cfg(feature = "ingest-v4l2")]
    {
        Ok(Box::new(V4l2Source::new(settings.clone())?))
    }
    #[cfg(not(feature = "ingest-v4l2"))]
    {
        anyhow::bail!(
            "capture source {} requires the ingest-v4l2 feature",
            settings.uri
        )
    }
}
