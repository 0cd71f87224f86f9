use std::{env, path::PathBuf, time::Duration};

use thiserror::Error;

pub const SMOOTHING_FACTOR: f64 = 7.0;
pub const CLICK_THRESHOLD: f64 = 50.0;
pub const DRAW_LANDMARKS: bool = true;
pub const CLICK_DEBOUNCE: Duration = Duration::from_millis(500);
pub const MAX_NUM_HANDS: usize = 1;
pub const MIN_DETECTION_CONFIDENCE: f32 = 0.7;
pub const MIN_TRACKING_CONFIDENCE: f32 = 0.7;

const ENV_CAMERA: &str = "GESTURE_MOUSE_CAMERA";
const ENV_SMOOTHING: &str = "GESTURE_MOUSE_SMOOTHING";
const ENV_CLICK_THRESHOLD: &str = "GESTURE_MOUSE_CLICK_THRESHOLD";
const ENV_DRAW_LANDMARKS: &str = "GESTURE_MOUSE_DRAW_LANDMARKS";
const ENV_MIRROR: &str = "GESTURE_MOUSE_MIRROR";
const ENV_MODEL_DIR: &str = "GESTURE_MOUSE_MODEL_DIR";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key}: cannot parse {value:?} as {expected}")]
    Parse {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("{key}: smoothing factor must be finite and at least 1, got {value}")]
    SmoothingTooSmall { key: &'static str, value: f64 },
    #[error("{key}: click threshold must be finite and positive, got {value}")]
    ThresholdNotPositive { key: &'static str, value: f64 },
}

/// Startup-time settings. Nothing here changes once the loop is running.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub camera_index: u32,
    pub smoothing_factor: f64,
    pub click_threshold: f64,
    pub draw_landmarks: bool,
    pub mirror: bool,
    pub model_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_index: 0,
            smoothing_factor: SMOOTHING_FACTOR,
            click_threshold: CLICK_THRESHOLD,
            draw_landmarks: DRAW_LANDMARKS,
            mirror: true,
            model_dir: PathBuf::from("models"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();

        if let Some(raw) = lookup(ENV_CAMERA) {
            cfg.camera_index = parse(ENV_CAMERA, &raw, "camera index")?;
        }
        if let Some(raw) = lookup(ENV_SMOOTHING) {
            let value: f64 = parse(ENV_SMOOTHING, &raw, "number")?;
            if !value.is_finite() || value < 1.0 {
                return Err(ConfigError::SmoothingTooSmall {
                    key: ENV_SMOOTHING,
                    value,
                });
            }
            cfg.smoothing_factor = value;
        }
        if let Some(raw) = lookup(ENV_CLICK_THRESHOLD) {
            let value: f64 = parse(ENV_CLICK_THRESHOLD, &raw, "number")?;
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::ThresholdNotPositive {
                    key: ENV_CLICK_THRESHOLD,
                    value,
                });
            }
            cfg.click_threshold = value;
        }
        if let Some(raw) = lookup(ENV_DRAW_LANDMARKS) {
            cfg.draw_landmarks = parse_flag(ENV_DRAW_LANDMARKS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MIRROR) {
            cfg.mirror = parse_flag(ENV_MIRROR, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MODEL_DIR) {
            if !raw.trim().is_empty() {
                cfg.model_dir = PathBuf::from(raw.trim());
            }
        }

        Ok(cfg)
    }
}

fn parse<T: std::str::FromStr>(
    key: &'static str,
    raw: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Parse {
        key,
        value: raw.to_string(),
        expected,
    })
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Parse {
            key,
            value: raw.to_string(),
            expected: "boolean",
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_constants() {
        let cfg = Config::from_lookup(|_| None).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.smoothing_factor, 7.0);
        assert_eq!(cfg.click_threshold, 50.0);
        assert!(cfg.draw_landmarks);
        assert!(cfg.mirror);
        assert_eq!(cfg.camera_index, 0);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = Config::from_lookup(lookup_from(&[
            (ENV_CAMERA, "2"),
            (ENV_SMOOTHING, "1"),
            (ENV_CLICK_THRESHOLD, " 35.5 "),
            (ENV_DRAW_LANDMARKS, "off"),
            (ENV_MIRROR, "FALSE"),
            (ENV_MODEL_DIR, "/opt/models"),
        ]))
        .unwrap();

        assert_eq!(cfg.camera_index, 2);
        assert_eq!(cfg.smoothing_factor, 1.0);
        assert_eq!(cfg.click_threshold, 35.5);
        assert!(!cfg.draw_landmarks);
        assert!(!cfg.mirror);
        assert_eq!(cfg.model_dir, PathBuf::from("/opt/models"));
    }

    #[test]
    fn smoothing_below_one_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[(ENV_SMOOTHING, "0.5")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::SmoothingTooSmall {
                key: ENV_SMOOTHING,
                value: 0.5
            }
        );
    }

    #[test]
    fn garbage_values_are_rejected() {
        assert!(matches!(
            Config::from_lookup(lookup_from(&[(ENV_CAMERA, "front")])),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[(ENV_DRAW_LANDMARKS, "maybe")])),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[(ENV_CLICK_THRESHOLD, "0")])),
            Err(ConfigError::ThresholdNotPositive { .. })
        ));
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        for raw in ["inf", "-inf", "NaN", "infinity"] {
            assert!(
                matches!(
                    Config::from_lookup(lookup_from(&[(ENV_SMOOTHING, raw)])),
                    Err(ConfigError::SmoothingTooSmall { .. })
                ),
                "smoothing {raw}"
            );
            assert!(
                matches!(
                    Config::from_lookup(lookup_from(&[(ENV_CLICK_THRESHOLD, raw)])),
                    Err(ConfigError::ThresholdNotPositive { .. })
                ),
                "threshold {raw}"
            );
        }
    }
}
