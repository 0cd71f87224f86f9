pub mod camera;
pub mod recognizer;
pub mod rgba_converter;
pub mod skeleton;

// Re-exports for convenience
pub use camera::{CameraSource, FrameSource, available_cameras};
pub use recognizer::{LandmarkDetector, ModelPaths, load_detector};
