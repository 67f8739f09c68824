//! Class id to class name lookup.

use anyhow::{Context, Result};
use std::io::BufRead;
use std::path::Path;

/// Name returned for ids the label table does not cover.
pub const UNKNOWN_LABEL: &str = "unknown";

const COCO_LABELS: &str = include_str!("../assets/coco_labels.txt");

/// Static label table loaded once at startup. Line index is the class id.
#[derive(Clone, Debug, Default)]
pub struct LabelResolver {
    labels: Vec<String>,
}

impl LabelResolver {
    /// Built-in COCO table in the 90-id layout SSD MobileNet detectors emit.
    /// Retired ids are blank lines and resolve to [`UNKNOWN_LABEL`].
    pub fn coco() -> Self {
        Self::from_text(COCO_LABELS)
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            labels: text.lines().map(|line| line.trim().to_string()).collect(),
        }
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let labels = reader
            .lines()
            .map(|line| line.map(|l| l.trim().to_string()))
            .collect::<std::io::Result<Vec<_>>>()
            .context("failed to read label table")?;
        Ok(Self { labels })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open label file {}", path.display()))?;
        let resolver = Self::from_reader(std::io::BufReader::new(file))?;
        log::info!(
            "loaded {} labels from {}",
            resolver.len(),
            path.display()
        );
        Ok(resolver)
    }

    /// Resolve a class id. Negative, out-of-range and blank entries resolve
    /// to [`UNKNOWN_LABEL`].
    pub fn resolve(&self, class_id: i64) -> &str {
        usize::try_from(class_id)
            .ok()
            .and_then(|index| self.labels.get(index))
            .filter(|label| !label.is_empty())
            .map(String::as_str)
            .unwrap_or(UNKNOWN_LABEL)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
