use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;

/// Scripted backend for tests and synthetic runs.
///
/// Replays one entry of the script per `detect` call, wrapping around at the
/// end. Pixels are ignored.
pub struct StubBackend {
    script: Vec<Vec<Detection>>,
    cursor: usize,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::with_script(default_script())
    }

    pub fn with_script(script: Vec<Vec<Detection>>) -> Self {
        Self { script, cursor: 0 }
    }

    /// Number of `detect` calls served so far.
    pub fn calls(&self) -> usize {
        self.cursor
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// A short street scene using COCO class ids (0 person, 2 car, 17 dog).
fn default_script() -> Vec<Vec<Detection>> {
    vec![
        vec![Detection::new(0, 0.91)],
        vec![Detection::new(0, 0.93), Detection::new(17, 0.62)],
        vec![Detection::new(2, 0.45)],
        vec![],
        vec![Detection::new(2, 0.81), Detection::new(0, 0.58)],
    ]
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<Vec<Detection>> {
        let frame = if self.script.is_empty() {
            Vec::new()
        } else {
            self.script[self.cursor % self.script.len()].clone()
        };
        self.cursor += 1;
        Ok(frame)
    }
}
