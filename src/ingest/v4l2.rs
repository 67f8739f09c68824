//! V4L2 camera source.
//!
//! Reads RGB3 frames from a local device node (e.g. `/dev/video0`) through a
//! memory-mapped stream. Frames are copied out of the mmap buffer and handed
//! to the drive loop; nothing is written to disk.

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use super::normalize::validate_rgb;
use super::{FrameSource, SourceStats};
use crate::config::SourceSettings;
use crate::frame::Frame;

pub struct V4l2Source {
    settings: SourceSettings,
    state: Option<DeviceState>,
    frame_count: u64,
    active_width: u32,
    active_height: u32,
}

#[self_referencing]
struct DeviceState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Source {
    pub fn new(settings: SourceSettings) -> Result<Self> {
        if settings.uri.contains("://") {
            return Err(anyhow!(
                "v4l2 source expects a device path, got {}",
                settings.uri
            ));
        }
        Ok(Self {
            active_width: settings.width,
            active_height: settings.height,
            settings,
            state: None,
            frame_count: 0,
        })
    }
}

impl FrameSource for V4l2Source {
    fn name(&self) -> &'static str {
        "v4l2"
    }

    fn open(&mut self) -> Result<()> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&self.settings.uri)
            .with_context(|| format!("open v4l2 device {}", self.settings.uri))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = self.settings.width;
        format.height = self.settings.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "V4l2Source: failed to set format on {}: {}",
                    self.settings.uri,
                    err
                );
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };
        if format.fourcc != v4l::FourCC::new(b"RGB3") {
            return Err(anyhow!(
                "v4l2 device {} does not deliver RGB3 frames (got {})",
                self.settings.uri,
                format.fourcc
            ));
        }

        if self.settings.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(self.settings.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!(
                    "V4l2Source: failed to set fps on {}: {}",
                    self.settings.uri,
                    err
                );
            }
        }

        self.active_width = format.width;
        self.active_height = format.height;

        let state = DeviceStateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;
        self.state = Some(state);

        log::info!(
            "V4l2Source: opened {} ({}x{})",
            self.settings.uri,
            self.active_width,
            self.active_height
        );
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut().context("v4l2 device not opened")?;
        let pixels = state
            .with_mut(|fields| fields.stream.next().map(|(buf, _meta)| buf.to_vec()))
            .context("capture v4l2 frame")?;
        validate_rgb(&pixels, self.active_width, self.active_height)?;

        self.frame_count += 1;
        Ok(Some(Frame::new(
            pixels,
            self.active_width,
            self.active_height,
        )))
    }

    fn close(&mut self) {
        if self.state.take().is_some() {
            log::info!("V4l2Source: released {}", self.settings.uri);
        }
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            uri: self.settings.uri.clone(),
        }
    }
}
