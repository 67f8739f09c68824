//! Inference adapters.
//!
//! A `DetectorBackend` turns one frame into a list of `Detection`s. The drive
//! loop owns exactly one backend for the whole run.

mod backend;
mod backends;
mod result;

use anyhow::Result;

use crate::config::DetectorSettings;

pub use backend::DetectorBackend;
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use result::{BoundingBox, Detection, RawOutputs};

/// Build the backend named by `settings.backend`.
pub fn build_backend(settings: &DetectorSettings) -> Result<Box<dyn DetectorBackend>> {
    match settings.backend.as_str() {
        "stub" => Ok(Box::new(StubBackend::new())),
        #[cfg(feature = "backend-tract")]
        "tract" => {
            let model_path = settings
                .model_path
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("tract backend requires a model path"))?;
            Ok(Box::new(TractBackend::new(
                model_path,
                settings.input_width,
                settings.input_height,
            )?))
        }
        #[cfg(not(feature = "backend-tract"))]
        "tract" => anyhow::bail!("tract backend requires the backend-tract feature"),
        other => anyhow::bail!("unknown detector backend '{}'", other),
    }
}
