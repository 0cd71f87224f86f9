mod app;
mod config;
mod model_download;
mod overlay;
mod pipeline;
mod pointer;
mod types;

use anyhow::Result;

use app::{CycleOptions, LaunchError};
use config::Config;
use overlay::Overlay;
use pipeline::{CameraSource, ModelPaths, available_cameras, load_detector};
use pointer::{EnigoSink, PointerPipeline};

const PREVIEW_WIDTH: u32 = 640;
const PREVIEW_HEIGHT: u32 = 480;

fn main() -> Result<()> {
    env_logger::init();

    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("Error: invalid configuration: {err}");
            return Ok(());
        }
    };
    log::debug!("configuration: {cfg:?}");

    let sink = match EnigoSink::new() {
        Ok(sink) => sink,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return Ok(());
        }
    };
    let screen = match sink.screen_size() {
        Ok(size) => size,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return Ok(());
        }
    };
    let pipeline = PointerPipeline::from_config(&cfg, screen);
    log::info!("screen size {:?}", pipeline.screen());

    let detector = match load_detector(&ModelPaths::in_dir(&cfg.model_dir)) {
        Ok(detector) => detector,
        Err(err) => {
            log::error!("failed to load hand models: {err:?}");
            eprintln!("Error: could not load hand tracking models: {err:#}");
            return Ok(());
        }
    };

    match available_cameras() {
        Ok(cameras) => {
            for camera in cameras {
                log::debug!("found camera {} ({:?})", camera.label, camera.index);
            }
        }
        Err(err) => log::warn!("failed to enumerate cameras: {err:?}"),
    }

    let result = app::launch(
        || CameraSource::open(cfg.camera_index),
        || Overlay::open(PREVIEW_WIDTH, PREVIEW_HEIGHT),
        detector,
        sink,
        pipeline,
        CycleOptions::from(&cfg),
    );

    match result {
        Ok(reason) => log::info!("exited: {reason:?}"),
        Err(LaunchError::CameraUnavailable(err)) => {
            log::error!("failed to open camera {}: {err:?}", cfg.camera_index);
            println!("Error: Could not open webcam.");
        }
        Err(err @ LaunchError::DisplayUnavailable(_)) => {
            log::error!("{err}");
            eprintln!("Error: {err}");
        }
    }

    Ok(())
}
