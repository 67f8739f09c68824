//! Captured frames.
//!
//! - `Frame`: owned RGB24 buffer produced by a `FrameSource`. Bytes are private.
//! - `Frame::run_detector`: the only path by which pixels reach a detector.
//!
//! A frame lives for exactly one drive-loop iteration and is zeroized on drop.

use anyhow::Result;
use std::time::{Duration, Instant};
use zeroize::Zeroize;

use crate::detect::{Detection, DetectorBackend};
use crate::ingest::normalize::resize_rgb;

/// One captured RGB24 frame. There is no `Clone` and no byte accessor.
pub struct Frame {
    /// Private pixel data, `width * height * 3` bytes.
    data: Vec<u8>,

    pub width: u32,
    pub height: u32,

    /// Monotonic capture instant (diagnostics only).
    captured_at: Instant,
}

impl Frame {
    /// Create a frame from RGB24 pixels. Called by ingestion sources.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            captured_at: Instant::now(),
        }
    }

    /// Time elapsed since capture.
    pub fn age(&self) -> Duration {
        self.captured_at.elapsed()
    }

    #[cfg(test)]
    pub(crate) fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Run a detector on this frame.
    ///
    /// When the backend declares a fixed input shape the pixels are resized to
    /// it first; the resized copy is zeroized once inference returns.
    pub fn run_detector(&self, backend: &mut dyn DetectorBackend) -> Result<Vec<Detection>> {
        match backend.input_shape() {
            Some((w, h)) if (w, h) != (self.width, self.height) => {
                let mut resized = resize_rgb(&self.data, self.width, self.height, w, h)?;
                let result = backend.detect(&resized, w, h);
                resized.zeroize();
                result
            }
            _ => backend.detect(&self.data, self.width, self.height),
        }
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        self.data.zeroize();
    }
}
