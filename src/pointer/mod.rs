pub mod click;
pub mod mapper;
pub mod sink;
pub mod smoothing;

use std::time::{Duration, Instant};

use crate::{
    config::{CLICK_DEBOUNCE, Config},
    types::{HandLandmark, LandmarkSet},
};

pub use sink::{EnigoSink, PointerSink};

/// State carried from one cycle to the next.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerPipelineState {
    pub previous_position: (f64, f64),
    pub last_click: Option<Instant>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerCommand {
    MoveTo { x: f64, y: f64 },
    Click,
}

/// Fingertip pixels of the current frame, kept for the overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FingertipMarkers {
    pub index: (i32, i32),
    pub thumb: (i32, i32),
    pub clicked: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CycleOutcome {
    pub state: PointerPipelineState,
    pub commands: Vec<PointerCommand>,
    pub markers: Option<FingertipMarkers>,
}

#[derive(Clone, Debug)]
pub struct PointerPipeline {
    screen: (f64, f64),
    smoothing_factor: f64,
    click_threshold: f64,
    debounce: Duration,
}

impl PointerPipeline {
    pub fn new(screen: (f64, f64), smoothing_factor: f64, click_threshold: f64) -> Self {
        Self {
            screen,
            smoothing_factor,
            click_threshold,
            debounce: CLICK_DEBOUNCE,
        }
    }

    pub fn from_config(cfg: &Config, screen: (f64, f64)) -> Self {
        Self::new(screen, cfg.smoothing_factor, cfg.click_threshold)
    }

    pub fn screen(&self) -> (f64, f64) {
        self.screen
    }

    /// Runs one cycle. Without a hand the state comes back untouched and no
    /// commands are produced.
    pub fn advance(
        &self,
        state: PointerPipelineState,
        hand: Option<&LandmarkSet>,
        frame: (u32, u32),
        now: Instant,
    ) -> CycleOutcome {
        let Some(hand) = hand else {
            return CycleOutcome {
                state,
                commands: Vec::new(),
                markers: None,
            };
        };

        let index = hand.pixel(HandLandmark::IndexFingerTip, frame.0, frame.1);
        let thumb = hand.pixel(HandLandmark::ThumbTip, frame.0, frame.1);

        let target = mapper::map_to_screen(index, frame, self.screen);
        let current = smoothing::smooth(state.previous_position, target, self.smoothing_factor);

        let mut commands = vec![PointerCommand::MoveTo {
            x: current.0,
            y: current.1,
        }];
        let mut next = PointerPipelineState {
            previous_position: current,
            last_click: state.last_click,
        };

        let distance = click::pinch_distance(index, thumb);
        let clicked = click::should_click(
            distance,
            self.click_threshold,
            state.last_click,
            now,
            self.debounce,
        );
        if clicked {
            commands.push(PointerCommand::Click);
            next.last_click = Some(now);
        }

        CycleOutcome {
            state: next,
            commands,
            markers: Some(FingertipMarkers {
                index,
                thumb,
                clicked,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NUM_LANDMARKS;

    const FRAME: (u32, u32) = (640, 480);
    const SCREEN: (f64, f64) = (1920.0, 1080.0);

    fn hand(index: (f32, f32), thumb: (f32, f32)) -> LandmarkSet {
        let mut pixels = vec![(0.0, 0.0); NUM_LANDMARKS];
        pixels[HandLandmark::IndexFingerTip as usize] = index;
        pixels[HandLandmark::ThumbTip as usize] = thumb;
        LandmarkSet::from_pixels(&pixels, FRAME.0, FRAME.1, 0.95).unwrap()
    }

    fn pipeline() -> PointerPipeline {
        PointerPipeline::new(SCREEN, 7.0, 50.0)
    }

    #[test]
    fn centered_fingertip_moves_a_seventh_of_the_way() {
        let outcome = pipeline().advance(
            PointerPipelineState::default(),
            Some(&hand((320.0, 240.0), (100.0, 100.0))),
            FRAME,
            Instant::now(),
        );

        let (x, y) = outcome.state.previous_position;
        assert!((x - 960.0 / 7.0).abs() < 1e-9);
        assert!((y - 540.0 / 7.0).abs() < 1e-9);
        assert!((x - 137.1).abs() < 0.05 && (y - 77.1).abs() < 0.05);
        assert_eq!(outcome.commands, vec![PointerCommand::MoveTo { x, y }]);
        assert_eq!(outcome.state.last_click, None);
    }

    #[test]
    fn pinch_fires_click_and_records_time() {
        let now = Instant::now();
        let outcome = pipeline().advance(
            PointerPipelineState::default(),
            Some(&hand((320.0, 240.0), (300.0, 240.0))),
            FRAME,
            now,
        );

        assert_eq!(outcome.commands.len(), 2);
        assert_eq!(outcome.commands[1], PointerCommand::Click);
        assert_eq!(outcome.state.last_click, Some(now));
        let markers = outcome.markers.unwrap();
        assert_eq!(markers.index, (320, 240));
        assert_eq!(markers.thumb, (300, 240));
        assert!(markers.clicked);
    }

    #[test]
    fn pinch_within_debounce_clicks_once() {
        let p = pipeline();
        let pinch = hand((320.0, 240.0), (300.0, 240.0));
        let t = Instant::now();

        let clicks_at = |offsets: &[u64]| {
            let mut state = PointerPipelineState::default();
            let mut clicks = 0;
            for &ms in offsets {
                let outcome = p.advance(state, Some(&pinch), FRAME, t + Duration::from_millis(ms));
                clicks += outcome
                    .commands
                    .iter()
                    .filter(|c| **c == PointerCommand::Click)
                    .count();
                state = outcome.state;
            }
            clicks
        };

        assert_eq!(clicks_at(&[0, 400]), 1);
        assert_eq!(clicks_at(&[0, 600]), 2);
        assert_eq!(clicks_at(&[0, 100, 200, 300, 400, 501, 1100]), 3);
    }

    #[test]
    fn threshold_distance_does_not_click() {
        let p = pipeline();
        let at_threshold = p.advance(
            PointerPipelineState::default(),
            Some(&hand((350.0, 240.0), (300.0, 240.0))),
            FRAME,
            Instant::now(),
        );
        assert!(!at_threshold.commands.contains(&PointerCommand::Click));

        let just_inside = p.advance(
            PointerPipelineState::default(),
            Some(&hand((349.0, 240.0), (300.0, 240.0))),
            FRAME,
            Instant::now(),
        );
        assert!(just_inside.commands.contains(&PointerCommand::Click));
    }

    #[test]
    fn absent_hand_leaves_state_alone() {
        let state = PointerPipelineState {
            previous_position: (412.5, 87.25),
            last_click: Some(Instant::now()),
        };
        let outcome = pipeline().advance(state, None, FRAME, Instant::now());
        assert_eq!(outcome.state, state);
        assert!(outcome.commands.is_empty());
        assert!(outcome.markers.is_none());
    }

    #[test]
    fn outputs_stay_on_screen() {
        let p = PointerPipeline::new(SCREEN, 1.0, 50.0);
        let corner = p.advance(
            PointerPipelineState::default(),
            Some(&hand((640.0, 480.0), (0.0, 0.0))),
            FRAME,
            Instant::now(),
        );
        assert_eq!(corner.state.previous_position, SCREEN);
    }
}
