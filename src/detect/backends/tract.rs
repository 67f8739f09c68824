#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{Detection, RawOutputs};
use crate::ingest::normalize::validate_rgb;

/// Tract-based backend for SSD-style ONNX detection models.
///
/// Expects a float NHWC input `[1, height, width, 3]` and three outputs in
/// order: boxes `[1, N, 4]`, classes `[1, N]`, scores `[1, N]`.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    width: u32,
    height: u32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, height as usize, width as usize, 3),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        log::info!(
            "TractBackend: loaded {} (input {}x{})",
            model_path.display(),
            width,
            height
        );
        Ok(Self {
            model,
            width,
            height,
        })
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        if width != self.width || height != self.height {
            return Err(anyhow!(
                "frame size {}x{} does not match model input {}x{}",
                width,
                height,
                self.width,
                self.height
            ));
        }
        validate_rgb(pixels, width, height)?;

        let width = width as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, height as usize, width, 3),
            |(_, y, x, channel)| {
                let idx = (y * width + x) * 3 + channel;
                (pixels[idx] as f32 - 127.5) / 127.5
            },
        );

        Ok(input.into_tensor())
    }

    fn extract_detections(&self, outputs: TVec<TValue>) -> Result<Vec<Detection>> {
        if outputs.len() < 3 {
            return Err(anyhow!(
                "model produced {} outputs, expected boxes, classes and scores",
                outputs.len()
            ));
        }
        let flatten = |index: usize, what: &str| -> Result<Vec<f32>> {
            let view = outputs[index]
                .to_array_view::<f32>()
                .with_context(|| format!("model {} tensor was not f32", what))?;
            Ok(view.iter().copied().collect())
        };
        RawOutputs {
            boxes: flatten(0, "boxes")?,
            class_ids: flatten(1, "classes")?,
            scores: flatten(2, "scores")?,
        }
        .into_detections()
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn input_shape(&self) -> Option<(u32, u32)> {
        Some((self.width, self.height))
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.extract_detections(outputs)
    }

    fn warm_up(&mut self) -> Result<()> {
        let blank = vec![0u8; (self.width * self.height * 3) as usize];
        self.detect(&blank, self.width, self.height).map(|_| ())
    }
}
