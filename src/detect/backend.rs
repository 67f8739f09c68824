use anyhow::Result;

use crate::detect::result::Detection;

/// Detector backend trait.
///
/// A backend wraps one loaded detection model. It receives RGB24 pixels for
/// the duration of a single `detect` call and returns candidate detections in
/// the model's output order.
///
/// Implementations must treat the pixel slice as read-only and ephemeral:
/// no copies retained past the call, no disk writes, no network requests.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Fixed input shape `(width, height)` declared by the model, if any.
    ///
    /// Frames are resized to this shape before `detect` is called.
    fn input_shape(&self) -> Option<(u32, u32)> {
        None
    }

    /// Run detection on a frame.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>>;

    /// Optional warm-up hook, run once before the first frame.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
