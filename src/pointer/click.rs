use std::time::{Duration, Instant};

pub fn pinch_distance(index: (i32, i32), thumb: (i32, i32)) -> f64 {
    let dx = (index.0 - thumb.0) as f64;
    let dy = (index.1 - thumb.1) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Returns true when a pinch of `distance` pixels should click at `now`.
///
/// The cooldown is purely time based: a pinch held past `debounce` fires
/// again without being released first.
pub fn should_click(
    distance: f64,
    threshold: f64,
    last_click: Option<Instant>,
    now: Instant,
    debounce: Duration,
) -> bool {
    if distance >= threshold {
        return false;
    }
    match last_click {
        None => true,
        Some(last) => now.saturating_duration_since(last) > debounce,
    }
}
