/// First-order exponential moving average over screen positions.
pub fn smooth(previous: (f64, f64), target: (f64, f64), factor: f64) -> (f64, f64) {
    (
        previous.0 + (target.0 - previous.0) / factor,
        previous.1 + (target.1 - previous.1) / factor,
    )
}
