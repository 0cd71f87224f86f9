use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use super::{
    LandmarkDetector,
    common::{self, HANDPOSE_INPUT_SIZE},
    palm::{PalmDetector, PalmDetectorConfig, crop_from_palm, pick_primary_region},
};
use crate::{
    config::MIN_TRACKING_CONFIDENCE,
    types::{Frame, LandmarkSet},
};

/// Palm detector followed by the 21-point landmark model, both on ONNX Runtime.
pub struct OrtHandDetector {
    handpose: Session,
    palm_detector: PalmDetector,
}

impl OrtHandDetector {
    pub fn new(handpose_model_path: &Path, palm_detector_model_path: &Path) -> Result<Self> {
        let handpose = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(handpose_model_path)
            .with_context(|| {
                format!(
                    "failed to load ORT session from {}",
                    handpose_model_path.display()
                )
            })?;

        let palm_detector =
            PalmDetector::new(palm_detector_model_path, PalmDetectorConfig::default())?;

        Ok(Self {
            handpose,
            palm_detector,
        })
    }
}

impl LandmarkDetector for OrtHandDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>> {
        let palm_regions = self.palm_detector.detect(frame)?;
        let Some(selected) = pick_primary_region(&palm_regions) else {
            return Ok(None);
        };
        let (center, side, angle) = crop_from_palm(selected);

        let (input, transform) =
            common::rotated_crop_tensor(frame, center, side, angle, HANDPOSE_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .handpose
            .run(ort::inputs![tensor])
            .context("failed to run ORT session")?;

        if outputs.len() < 2 {
            return Err(anyhow!(
                "handpose model returned {} outputs, expected at least 2",
                outputs.len()
            ));
        }

        let coords: Vec<f32> = outputs[0].try_extract_array::<f32>()?.iter().copied().collect();
        let landmarks = common::decode_landmarks(&coords)?;
        let confidence = outputs[1]
            .try_extract_array::<f32>()?
            .iter()
            .next()
            .copied()
            .unwrap_or(0.0);

        if confidence < MIN_TRACKING_CONFIDENCE {
            log::trace!("hand dropped at tracking confidence {confidence:.2}");
            return Ok(None);
        }

        let projected = transform.project_all(&landmarks);
        Ok(LandmarkSet::from_pixels(
            &projected,
            frame.width,
            frame.height,
            confidence.clamp(0.0, 1.0),
        ))
    }
}
