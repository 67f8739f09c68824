//! Synthetic frame source.
//!
//! Serves `stub://` URIs. Produces a moving gradient pattern at the configured
//! resolution at `target_fps` (0 = unpaced), optionally ending the stream
//! after `max_frames` frames.

use anyhow::{anyhow, Result};
use std::time::{Duration, Instant};

use super::normalize::rgb_len;
use super::{FrameSource, SourceStats};
use crate::config::SourceSettings;
use crate::frame::Frame;

pub struct SyntheticSource {
    settings: SourceSettings,
    frame_count: u64,
    /// Simulated scene state, bumped every 50 frames.
    scene_state: u8,
    opened: bool,
    next_due: Option<Instant>,
}

impl SyntheticSource {
    pub fn new(settings: SourceSettings) -> Self {
        Self {
            settings,
            frame_count: 0,
            scene_state: 0,
            opened: false,
            next_due: None,
        }
    }

    fn pace(&mut self) {
        if self.settings.target_fps == 0 {
            return;
        }
        let interval = Duration::from_secs(1) / self.settings.target_fps;
        let now = Instant::now();
        if let Some(due) = self.next_due {
            if due > now {
                std::thread::sleep(due - now);
            }
        }
        self.next_due = Some(Instant::now() + interval);
    }

    fn generate_pixels(&mut self) -> Result<Vec<u8>> {
        let pixel_count = rgb_len(self.settings.width, self.settings.height)?;

        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }

        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count + self.scene_state as u64) % 256) as u8;
        }
        Ok(pixels)
    }
}

impl FrameSource for SyntheticSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn open(&mut self) -> Result<()> {
        if self.settings.width == 0 || self.settings.height == 0 {
            return Err(anyhow!(
                "synthetic source {} has empty resolution",
                self.settings.uri
            ));
        }
        rgb_len(self.settings.width, self.settings.height)?;
        self.opened = true;
        log::info!("SyntheticSource: opened {}", self.settings.uri);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        if !self.opened {
            return Err(anyhow!("synthetic source not opened"));
        }
        if let Some(limit) = self.settings.max_frames {
            if self.frame_count >= limit {
                return Ok(None);
            }
        }
        self.pace();
        let pixels = self.generate_pixels()?;
        self.frame_count += 1;
        Ok(Some(Frame::new(
            pixels,
            self.settings.width,
            self.settings.height,
        )))
    }

    fn close(&mut self) {
        self.opened = false;
        log::info!(
            "SyntheticSource: closed {} after {} frames",
            self.settings.uri,
            self.frame_count
        );
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            uri: self.settings.uri.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_settings(max_frames: Option<u64>) -> SourceSettings {
        SourceSettings {
            uri: "stub://test".to_string(),
            width: 32,
            height: 24,
            target_fps: 0,
            max_frames,
        }
    }

    #[test]
    fn synthetic_source_produces_frames() -> Result<()> {
        let mut source = SyntheticSource::new(stub_settings(None));
        source.open()?;

        let frame = source.read_frame()?.expect("frame");
        assert_eq!(frame.width, 32);
        assert_eq!(frame.height, 24);
        assert_eq!(frame.byte_len(), 32 * 24 * 3);
        Ok(())
    }

    #[test]
    fn synthetic_source_ends_after_frame_limit() -> Result<()> {
        let mut source = SyntheticSource::new(stub_settings(Some(2)));
        source.open()?;

        assert!(source.read_frame()?.is_some());
        assert!(source.read_frame()?.is_some());
        assert!(source.read_frame()?.is_none());
        assert_eq!(source.stats().frames_captured, 2);
        Ok(())
    }

    #[test]
    fn oversized_resolution_is_rejected() {
        let mut settings = stub_settings(None);
        settings.width = u32::MAX;
        settings.height = 2;
        let mut source = SyntheticSource::new(settings);
        let err = source.open().unwrap_err();
        assert!(err.to_string().contains("overflow"));

        source.opened = true;
        assert!(source.read_frame().is_err());
        assert_eq!(source.stats().frames_captured, 0);
    }

    #[test]
    fn reading_before_open_fails() {
        let mut source = SyntheticSource::new(stub_settings(None));
        assert!(source.read_frame().is_err());
    }
}
