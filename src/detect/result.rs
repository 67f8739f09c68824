use anyhow::{anyhow, Result};

/// Bounding box in normalized 0..1 coordinates, as emitted by SSD-style
/// models (`ymin, xmin, ymax, xmax`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub ymin: f32,
    pub xmin: f32,
    pub ymax: f32,
    pub xmax: f32,
}

/// One candidate object reported by inference for a single frame.
///
/// The box is carried along for downstream consumers; alerting ignores it.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub class_id: i64,
    pub confidence: f32,
    pub bbox: Option<BoundingBox>,
}

impl Detection {
    pub fn new(class_id: i64, confidence: f32) -> Self {
        Self {
            class_id,
            confidence,
            bbox: None,
        }
    }

    pub fn with_box(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }
}

/// The three parallel output sequences of a detection model.
///
/// Entries are unsorted by confidence. `boxes` holds four floats per
/// detection and may be empty when the model emits no box tensor.
#[derive(Clone, Debug, Default)]
pub struct RawOutputs {
    pub boxes: Vec<f32>,
    pub class_ids: Vec<f32>,
    pub scores: Vec<f32>,
}

impl RawOutputs {
    /// Zip the parallel outputs into detections, preserving inference order.
    pub fn into_detections(self) -> Result<Vec<Detection>> {
        let count = self.scores.len();
        if self.class_ids.len() != count {
            return Err(anyhow!(
                "model produced {} class ids for {} scores",
                self.class_ids.len(),
                count
            ));
        }
        let has_boxes = !self.boxes.is_empty();
        if has_boxes && self.boxes.len() != count * 4 {
            return Err(anyhow!(
                "model produced {} box coordinates for {} scores",
                self.boxes.len(),
                count
            ));
        }

        let detections = self
            .class_ids
            .iter()
            .zip(&self.scores)
            .enumerate()
            .map(|(i, (&class_id, &confidence))| {
                // Class tensors are float-typed; truncate like an int cast.
                let detection = Detection::new(class_id as i64, confidence);
                if has_boxes {
                    let b = &self.boxes[i * 4..i * 4 + 4];
                    detection.with_box(BoundingBox {
                        ymin: b[0],
                        xmin: b[1],
                        ymax: b[2],
                        xmax: b[3],
                    })
                } else {
                    detection
                }
            })
            .collect();
        Ok(detections)
    }
}
