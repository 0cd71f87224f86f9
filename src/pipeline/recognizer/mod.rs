mod common;
mod ort;
mod palm;

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::{
    model_download::{
        ModelKind, ensure_handpose_estimator_model_ready, ensure_palm_detector_model_ready,
    },
    types::{Frame, LandmarkSet},
};

pub use self::ort::OrtHandDetector;

/// Finds at most one hand per frame.
pub trait LandmarkDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>>;
}

#[derive(Clone, Debug)]
pub struct ModelPaths {
    pub handpose_estimator: PathBuf,
    pub palm_detector: PathBuf,
}

impl ModelPaths {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            handpose_estimator: dir.join(ModelKind::HandposeEstimator.file_name()),
            palm_detector: dir.join(ModelKind::PalmDetector.file_name()),
        }
    }
}

/// Makes sure both models are on disk, then loads them.
pub fn load_detector(paths: &ModelPaths) -> Result<OrtHandDetector> {
    ensure_handpose_estimator_model_ready(&paths.handpose_estimator, |_evt| {})
        .with_context(|| {
            format!(
                "failed to prepare handpose model at {}",
                paths.handpose_estimator.display()
            )
        })?;
    ensure_palm_detector_model_ready(&paths.palm_detector, |_evt| {}).with_context(|| {
        format!(
            "failed to prepare palm detector model at {}",
            paths.palm_detector.display()
        )
    })?;

    let detector = OrtHandDetector::new(&paths.handpose_estimator, &paths.palm_detector)?;
    log::info!(
        "handpose ORT backend ready using {} and palm detector {}",
        paths.handpose_estimator.display(),
        paths.palm_detector.display()
    );
    Ok(detector)
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::{
        pointer::PointerPipeline,
        types::{HandLandmark, LandmarkSet, NUM_LANDMARKS},
    };
    use common::CropTransform;

    #[test]
    fn model_paths_live_in_the_configured_dir() {
        let paths = ModelPaths::in_dir("/tmp/gm-models");
        assert_eq!(
            paths.handpose_estimator,
            PathBuf::from("/tmp/gm-models/handpose_estimation_mediapipe_2023feb.onnx")
        );
        assert_eq!(
            paths.palm_detector,
            PathBuf::from("/tmp/gm-models/palm_detection_mediapipe_2023feb.onnx")
        );
    }

    #[test]
    fn fingertip_past_frame_corner_reaches_screen_corner() {
        let transform = CropTransform {
            center: (630.0, 470.0),
            side: 200.0,
            angle: 0.0,
            output_size: 224,
            orig_w: 640,
            orig_h: 480,
        };
        let mut raw = [[0.0f32; 3]; NUM_LANDMARKS];
        raw[HandLandmark::IndexFingerTip as usize] = [224.0, 224.0, 0.0];
        let projected = transform.project_all(&raw);
        let hand = LandmarkSet::from_pixels(&projected, 640, 480, 0.9).unwrap();

        let pipeline = PointerPipeline::new((1920.0, 1080.0), 1.0, 50.0);
        let outcome = pipeline.advance(Default::default(), Some(&hand), (640, 480), Instant::now());
        assert_eq!(outcome.state.previous_position, (1920.0, 1080.0));
    }
}
