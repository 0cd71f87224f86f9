use std::time::Instant;

use anyhow::Result;
use thiserror::Error;

use crate::{
    config::Config,
    overlay::FrameDisplay,
    pipeline::{FrameSource, LandmarkDetector, rgba_converter, skeleton},
    pointer::{PointerPipeline, PointerPipelineState, PointerSink},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Running,
    Terminated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    FrameSourceEnded,
    QuitRequested,
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("could not open webcam: {0:#}")]
    CameraUnavailable(anyhow::Error),
    #[error("could not open preview window: {0:#}")]
    DisplayUnavailable(anyhow::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleOptions {
    pub draw_landmarks: bool,
    pub mirror: bool,
}

impl From<&Config> for CycleOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            draw_landmarks: cfg.draw_landmarks,
            mirror: cfg.mirror,
        }
    }
}

/// Drives capture, detection, pointer output and preview, one frame at a time.
pub struct VirtualMouse<S, D, P, O>
where
    S: FrameSource,
    D: LandmarkDetector,
    P: PointerSink,
    O: FrameDisplay,
{
    source: S,
    detector: D,
    sink: P,
    display: O,
    pipeline: PointerPipeline,
    options: CycleOptions,
    state: PointerPipelineState,
    run_state: RunState,
    exit_reason: Option<ExitReason>,
}

impl<S, D, P, O> VirtualMouse<S, D, P, O>
where
    S: FrameSource,
    D: LandmarkDetector,
    P: PointerSink,
    O: FrameDisplay,
{
    pub fn new(
        source: S,
        detector: D,
        sink: P,
        display: O,
        pipeline: PointerPipeline,
        options: CycleOptions,
    ) -> Self {
        Self {
            source,
            detector,
            sink,
            display,
            pipeline,
            options,
            state: PointerPipelineState::default(),
            run_state: RunState::Running,
            exit_reason: None,
        }
    }

    pub fn state(&self) -> PointerPipelineState {
        self.state
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Loops until the camera stops or quit is requested, then releases the
    /// camera and the window.
    pub fn run(&mut self) -> ExitReason {
        let reason = loop {
            if let Some(reason) = self.cycle() {
                break reason;
            }
        };
        self.terminate(reason);
        log::info!("loop finished: {reason:?}");
        reason
    }

    /// One pass: frame, detect, pointer, preview, quit check. Once terminated
    /// it only repeats the reason the loop stopped for.
    pub fn cycle(&mut self) -> Option<ExitReason> {
        if self.run_state == RunState::Terminated {
            return self.exit_reason;
        }

        let mut frame = match self.source.read() {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("no frame from camera, stopping: {err:#}");
                return Some(ExitReason::FrameSourceEnded);
            }
        };

        if self.options.mirror {
            if let Err(err) = rgba_converter::mirror_horizontal(&mut frame) {
                log::warn!("failed to mirror frame: {err:#}");
            }
        }

        let hand = match self.detector.detect(&frame) {
            Ok(hand) => hand,
            Err(err) => {
                log::warn!("hand detection failed: {err:#}");
                None
            }
        };

        if let Some(hand) = &hand {
            log::trace!("hand tracked at confidence {:.2}", hand.confidence);
        }

        let outcome = self.pipeline.advance(
            self.state,
            hand.as_ref(),
            (frame.width, frame.height),
            Instant::now(),
        );
        self.state = outcome.state;

        for command in outcome.commands {
            log::trace!("pointer {command:?}");
            if let Err(err) = self.sink.apply(command) {
                log::warn!("pointer command {command:?} failed: {err:#}");
            }
        }

        if let Some(markers) = outcome.markers {
            if markers.clicked {
                log::debug!("click at index tip {:?}", markers.index);
                println!("Left Click!");
            }
            if self.options.draw_landmarks {
                if let Some(hand) = &hand {
                    let points = hand.to_pixels(frame.width, frame.height);
                    skeleton::draw_skeleton(&mut frame, &points);
                }
            }
            skeleton::draw_fingertips(&mut frame, &markers);
        }

        if let Err(err) = self.display.present(&frame) {
            log::warn!("failed to present frame: {err:#}");
        }
        log::trace!("frame handled {:?} after capture", frame.age());

        if self.display.quit_requested() {
            return Some(ExitReason::QuitRequested);
        }
        None
    }

    fn terminate(&mut self, reason: ExitReason) {
        if self.run_state == RunState::Terminated {
            return;
        }
        self.source.release();
        self.display.close();
        self.run_state = RunState::Terminated;
        self.exit_reason = Some(reason);
    }
}

/// Opens the camera, then the window, then runs until termination. A camera
/// that won't open ends things before any pointer command is sent.
pub fn launch<S, D, P, O, FS, FO>(
    open_source: FS,
    open_display: FO,
    detector: D,
    sink: P,
    pipeline: PointerPipeline,
    options: CycleOptions,
) -> Result<ExitReason, LaunchError>
where
    S: FrameSource,
    D: LandmarkDetector,
    P: PointerSink,
    O: FrameDisplay,
    FS: FnOnce() -> Result<S>,
    FO: FnOnce() -> Result<O>,
{
    let mut source = open_source().map_err(LaunchError::CameraUnavailable)?;
    let display = match open_display() {
        Ok(display) => display,
        Err(err) => {
            source.release();
            return Err(LaunchError::DisplayUnavailable(err));
        }
    };

    println!("Gesture Mouse started. Press 'q' to quit.");
    println!("Move your index finger to control the mouse.");
    println!("Pinch your thumb and index finger together to left click.");

    let mut app = VirtualMouse::new(source, detector, sink, display, pipeline, options);
    let reason = app.run();
    debug_assert_eq!(app.run_state(), RunState::Terminated);
    log::debug!("final pointer state {:?}", app.state());

    println!("Gesture Mouse stopped.");
    Ok(reason)
}
