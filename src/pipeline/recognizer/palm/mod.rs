mod anchors;

use std::{cmp::Ordering, f32::consts::PI, path::Path};

use anyhow::{Context, Result, anyhow};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use crate::{
    config::{MAX_NUM_HANDS, MIN_DETECTION_CONFIDENCE},
    types::{Frame, PalmRegion},
};

use super::common::{LetterboxInfo, PALM_INPUT_SIZE, letterbox_tensor};

const PALM_LANDMARKS: usize = 7;
const BOX_FEATURES: usize = 4 + PALM_LANDMARKS * 2;

#[derive(Clone, Debug)]
pub struct PalmDetectorConfig {
    pub score_threshold: f32,
    pub nms_threshold: f32,
    pub top_k: usize,
}

impl Default for PalmDetectorConfig {
    fn default() -> Self {
        Self {
            score_threshold: MIN_DETECTION_CONFIDENCE,
            nms_threshold: 0.3,
            top_k: MAX_NUM_HANDS,
        }
    }
}

pub struct PalmDetector {
    session: Session,
    anchors: Vec<[f32; 2]>,
    cfg: PalmDetectorConfig,
}

impl PalmDetector {
    pub fn new(model_path: &Path, cfg: PalmDetectorConfig) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(model_path)
            .with_context(|| {
                format!("failed to load palm detector from {}", model_path.display())
            })?;

        Ok(Self {
            session,
            anchors: anchors::generate_anchors(PALM_INPUT_SIZE),
            cfg,
        })
    }

    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<PalmRegion>> {
        let (input, letterbox) = letterbox_tensor(frame, PALM_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("failed to run palm detector session")?;

        if outputs.len() < 2 {
            return Err(anyhow!(
                "palm detector returned {} outputs, expected at least 2",
                outputs.len()
            ));
        }

        let boxes = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let box_features = *boxes
            .shape()
            .last()
            .ok_or_else(|| anyhow!("palm box output has no dimensions"))?;
        let score_features = *scores
            .shape()
            .last()
            .ok_or_else(|| anyhow!("palm score output has no dimensions"))?;

        let boxes: Vec<f32> = boxes.iter().copied().collect();
        let scores: Vec<f32> = scores.iter().copied().collect();

        decode_palms(
            &RawPalmOutput {
                boxes: &boxes,
                box_features,
                scores: &scores,
                score_features,
            },
            &self.anchors,
            &letterbox,
            &self.cfg,
        )
    }
}

struct RawPalmOutput<'a> {
    boxes: &'a [f32],
    box_features: usize,
    scores: &'a [f32],
    score_features: usize,
}

fn decode_palms(
    raw: &RawPalmOutput<'_>,
    anchors: &[[f32; 2]],
    letterbox: &LetterboxInfo,
    cfg: &PalmDetectorConfig,
) -> Result<Vec<PalmRegion>> {
    if raw.box_features < BOX_FEATURES {
        return Err(anyhow!(
            "palm box feature dimension too small: {}",
            raw.box_features
        ));
    }
    if raw.score_features == 0 {
        return Err(anyhow!("palm score feature dimension is zero"));
    }

    let box_rows = raw.boxes.len() / raw.box_features;
    let score_rows = raw.scores.len() / raw.score_features;
    if box_rows != score_rows {
        return Err(anyhow!(
            "anchor count mismatch between boxes ({box_rows}) and scores ({score_rows})"
        ));
    }

    let input = PALM_INPUT_SIZE as f32;
    let scale = letterbox.orig_w.max(letterbox.orig_h) as f32;
    let bias = (
        letterbox.pad_x / letterbox.scale,
        letterbox.pad_y / letterbox.scale,
    );
    let to_frame = |nx: f32, ny: f32| (nx * scale - bias.0, ny * scale - bias.1);

    let mut candidates = Vec::new();
    for (idx, anchor) in anchors.iter().enumerate().take(box_rows) {
        let score = sigmoid(raw.scores[idx * raw.score_features]);
        if score < cfg.score_threshold {
            continue;
        }

        let f = &raw.boxes[idx * raw.box_features..][..BOX_FEATURES];
        let cx = f[0] / input + anchor[0];
        let cy = f[1] / input + anchor[1];
        let hw = f[2] / input / 2.0;
        let hh = f[3] / input / 2.0;

        let (x1, y1) = to_frame(cx - hw, cy - hh);
        let (x2, y2) = to_frame(cx + hw, cy + hh);
        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        let landmarks = f[4..]
            .chunks_exact(2)
            .map(|p| to_frame(p[0] / input + anchor[0], p[1] / input + anchor[1]))
            .collect();

        candidates.push(PalmRegion {
            bbox: clamp_box([x1, y1, x2, y2], letterbox.orig_w, letterbox.orig_h),
            landmarks,
            score,
        });
    }

    let kept = nms(&candidates, cfg.nms_threshold, cfg.top_k);
    Ok(kept.into_iter().map(|i| candidates[i].clone()).collect())
}

pub fn pick_primary_region(regions: &[PalmRegion]) -> Option<&PalmRegion> {
    regions
        .iter()
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal))
}

/// Center, side length and rotation of the square the landmark model sees.
pub fn crop_from_palm(region: &PalmRegion) -> ((f32, f32), f32, f32) {
    let center = if region.landmarks.is_empty() {
        (
            (region.bbox[0] + region.bbox[2]) * 0.5,
            (region.bbox[1] + region.bbox[3]) * 0.5,
        )
    } else {
        let n = region.landmarks.len() as f32;
        let (sx, sy) = region
            .landmarks
            .iter()
            .fold((0.0_f32, 0.0_f32), |acc, p| (acc.0 + p.0, acc.1 + p.1));
        (sx / n, sy / n)
    };

    let base = (region.bbox[2] - region.bbox[0])
        .abs()
        .max((region.bbox[3] - region.bbox[1]).abs());
    let span = if region.landmarks.is_empty() {
        0.0
    } else {
        let (min_x, max_x, min_y, max_y) = region.landmarks.iter().fold(
            (f32::MAX, f32::MIN, f32::MAX, f32::MIN),
            |acc, (x, y)| (acc.0.min(*x), acc.1.max(*x), acc.2.min(*y), acc.3.max(*y)),
        );
        (max_x - min_x).max(max_y - min_y)
    };
    // Expand generously to avoid cropping fingers away.
    let side = base.max(span).max(80.0) * 2.4;

    (center, side, estimate_orientation(region))
}

fn estimate_orientation(region: &PalmRegion) -> f32 {
    if region.landmarks.len() < 2 {
        return 0.0;
    }

    let n = region.landmarks.len() as f32;
    let (sx, sy) = region
        .landmarks
        .iter()
        .fold((0.0_f32, 0.0_f32), |acc, (x, y)| (acc.0 + x, acc.1 + y));
    let mean = (sx / n, sy / n);

    let (mut xx, mut xy, mut yy) = (0.0, 0.0, 0.0);
    for (x, y) in &region.landmarks {
        let dx = x - mean.0;
        let dy = y - mean.1;
        xx += dx * dx;
        xy += dx * dy;
        yy += dy * dy;
    }
    xx /= n;
    xy /= n;
    yy /= n;

    // Principal axis of the 2x2 covariance.
    let half_trace = (xx + yy) * 0.5;
    let det = xx * yy - xy * xy;
    let lambda = (half_trace + (half_trace * half_trace - det).max(0.0).sqrt()).max(1e-6);
    let (vx, vy) = if xy.abs() > 1e-6 {
        (lambda - yy, xy)
    } else if xx >= yy {
        (1.0, 0.0)
    } else {
        (0.0, 1.0)
    };

    vy.atan2(vx) - PI * 0.5
}

fn nms(candidates: &[PalmRegion], threshold: f32, top_k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|a, b| {
        candidates[*b]
            .score
            .partial_cmp(&candidates[*a].score)
            .unwrap_or(Ordering::Equal)
    });

    let mut keep: Vec<usize> = Vec::new();
    for idx in order {
        if keep.len() >= top_k {
            break;
        }
        let overlaps = keep
            .iter()
            .any(|&k| iou(&candidates[idx].bbox, &candidates[k].bbox) >= threshold);
        if !overlaps {
            keep.push(idx);
        }
    }
    keep
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let inter_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let inter_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = inter_w * inter_h;
    if inter <= 0.0 {
        return 0.0;
    }

    let area = |r: &[f32; 4]| (r[2] - r[0]).max(0.0) * (r[3] - r[1]).max(0.0);
    let union = area(a) + area(b) - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn clamp_box(bbox: [f32; 4], w: u32, h: u32) -> [f32; 4] {
    let max_w = (w.saturating_sub(1)) as f32;
    let max_h = (h.saturating_sub(1)) as f32;
    [
        bbox[0].clamp(0.0, max_w),
        bbox[1].clamp(0.0, max_h),
        bbox[2].clamp(0.0, max_w),
        bbox[3].clamp(0.0, max_h),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(bbox: [f32; 4], score: f32) -> PalmRegion {
        PalmRegion {
            bbox,
            landmarks: Vec::new(),
            score,
        }
    }

    fn identity_letterbox() -> LetterboxInfo {
        LetterboxInfo {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 0.0,
            orig_w: PALM_INPUT_SIZE,
            orig_h: PALM_INPUT_SIZE,
        }
    }

    #[test]
    fn iou_of_identical_and_disjoint_boxes() {
        let a = [0.0, 0.0, 10.0, 10.0];
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
        assert_eq!(iou(&a, &[20.0, 20.0, 30.0, 30.0]), 0.0);
    }

    #[test]
    fn nms_drops_overlapping_lower_scores() {
        let candidates = vec![
            region([0.0, 0.0, 10.0, 10.0], 0.8),
            region([1.0, 1.0, 11.0, 11.0], 0.9),
            region([50.0, 50.0, 60.0, 60.0], 0.75),
        ];
        assert_eq!(nms(&candidates, 0.3, 8), vec![1, 2]);
        assert_eq!(nms(&candidates, 0.3, 1), vec![1]);
    }

    #[test]
    fn primary_region_is_highest_score() {
        let regions = vec![
            region([0.0, 0.0, 1.0, 1.0], 0.71),
            region([0.0, 0.0, 1.0, 1.0], 0.93),
            region([0.0, 0.0, 1.0, 1.0], 0.8),
        ];
        assert_eq!(pick_primary_region(&regions).unwrap().score, 0.93);
        assert!(pick_primary_region(&[]).is_none());
    }

    #[test]
    fn decode_filters_by_score_and_projects_boxes() {
        let anchors = vec![[0.5, 0.5], [0.25, 0.25]];
        let mut boxes = vec![0.0; BOX_FEATURES * 2];
        boxes[2] = 48.0;
        boxes[3] = 48.0;
        boxes[BOX_FEATURES + 2] = 48.0;
        boxes[BOX_FEATURES + 3] = 48.0;
        let scores = vec![4.0, -4.0];

        let palms = decode_palms(
            &RawPalmOutput {
                boxes: &boxes,
                box_features: BOX_FEATURES,
                scores: &scores,
                score_features: 1,
            },
            &anchors,
            &identity_letterbox(),
            &PalmDetectorConfig::default(),
        )
        .unwrap();

        assert_eq!(palms.len(), 1);
        let palm = &palms[0];
        assert!(palm.score > MIN_DETECTION_CONFIDENCE);
        assert_eq!(palm.bbox, [72.0, 72.0, 120.0, 120.0]);
        assert_eq!(palm.landmarks.len(), PALM_LANDMARKS);
        assert_eq!(palm.landmarks[0], (96.0, 96.0));
    }

    #[test]
    fn decode_rejects_mismatched_outputs() {
        let boxes = vec![0.0; BOX_FEATURES * 2];
        let scores = vec![0.0; 3];
        let err = decode_palms(
            &RawPalmOutput {
                boxes: &boxes,
                box_features: BOX_FEATURES,
                scores: &scores,
                score_features: 1,
            },
            &[[0.5, 0.5]; 3],
            &identity_letterbox(),
            &PalmDetectorConfig::default(),
        );
        assert!(err.is_err());
    }

    #[test]
    fn crop_covers_the_palm_generously() {
        let palm = region([100.0, 100.0, 150.0, 160.0], 0.9);
        let (center, side, angle) = crop_from_palm(&palm);
        assert_eq!(center, (125.0, 130.0));
        assert!((side - 80.0 * 2.4).abs() < 1e-4);
        assert_eq!(angle, 0.0);
    }
}
