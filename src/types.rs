use std::time::{Duration, Instant};

pub const NUM_LANDMARKS: usize = 21;

#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: Instant,
}

impl Frame {
    pub fn new(rgba: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            rgba,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    /// Time since capture.
    pub fn age(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// Keypoint indices of the 21-point hand topology.
#[allow(dead_code)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandLandmark {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexFingerMcp = 5,
    IndexFingerPip = 6,
    IndexFingerDip = 7,
    IndexFingerTip = 8,
    MiddleFingerMcp = 9,
    MiddleFingerPip = 10,
    MiddleFingerDip = 11,
    MiddleFingerTip = 12,
    RingFingerMcp = 13,
    RingFingerPip = 14,
    RingFingerDip = 15,
    RingFingerTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

/// One detected hand, every point normalized to [0, 1] against the frame it
/// was detected in.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSet {
    points: [(f32, f32); NUM_LANDMARKS],
    pub confidence: f32,
}

impl LandmarkSet {
    pub fn new(points: [(f32, f32); NUM_LANDMARKS], confidence: f32) -> Self {
        Self { points, confidence }
    }

    /// Builds a set from pixel coordinates, normalizing by the frame size.
    pub fn from_pixels(pixels: &[(f32, f32)], width: u32, height: u32, confidence: f32) -> Option<Self> {
        if pixels.len() < NUM_LANDMARKS || width == 0 || height == 0 {
            return None;
        }
        let mut points = [(0.0, 0.0); NUM_LANDMARKS];
        for (dst, (x, y)) in points.iter_mut().zip(pixels) {
            *dst = (
                (x / width as f32).clamp(0.0, 1.0),
                (y / height as f32).clamp(0.0, 1.0),
            );
        }
        Some(Self { points, confidence })
    }

    pub fn get(&self, landmark: HandLandmark) -> (f32, f32) {
        self.points[landmark as usize]
    }

    /// Truncating conversion to integer pixel coordinates.
    pub fn pixel(&self, landmark: HandLandmark, width: u32, height: u32) -> (i32, i32) {
        let (x, y) = self.get(landmark);
        ((x * width as f32) as i32, (y * height as f32) as i32)
    }

    pub fn to_pixels(&self, width: u32, height: u32) -> Vec<(f32, f32)> {
        self.points
            .iter()
            .map(|(x, y)| (x * width as f32, y * height as f32))
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct PalmRegion {
    pub bbox: [f32; 4],
    pub landmarks: Vec<(f32, f32)>,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pixels_normalizes_against_frame() {
        let mut pixels = vec![(0.0, 0.0); NUM_LANDMARKS];
        pixels[HandLandmark::IndexFingerTip as usize] = (320.0, 240.0);
        pixels[HandLandmark::ThumbTip as usize] = (700.0, -5.0);

        let set = LandmarkSet::from_pixels(&pixels, 640, 480, 0.9).unwrap();
        assert_eq!(set.get(HandLandmark::IndexFingerTip), (0.5, 0.5));
        assert_eq!(set.get(HandLandmark::ThumbTip), (1.0, 0.0));
        assert_eq!(set.pixel(HandLandmark::IndexFingerTip, 640, 480), (320, 240));
    }

    #[test]
    fn frame_age_counts_from_capture() {
        let mut frame = Frame::new(vec![0u8; 16], 2, 2);
        frame.timestamp -= Duration::from_millis(40);
        assert!(frame.age() >= Duration::from_millis(40));
    }

    #[test]
    fn from_pixels_rejects_short_input() {
        assert!(LandmarkSet::from_pixels(&[(1.0, 1.0); 4], 640, 480, 1.0).is_none());
        assert!(LandmarkSet::from_pixels(&[(1.0, 1.0); NUM_LANDMARKS], 0, 480, 1.0).is_none());
    }

    #[test]
    fn pixel_conversion_truncates() {
        let mut points = [(0.0, 0.0); NUM_LANDMARKS];
        points[HandLandmark::ThumbTip as usize] = (0.4999, 0.25);
        let set = LandmarkSet::new(points, 1.0);
        assert_eq!(set.pixel(HandLandmark::ThumbTip, 640, 480), (319, 120));
    }
}
