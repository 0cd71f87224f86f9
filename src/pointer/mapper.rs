/// Linear interpolation of `value` from `src` into `dst`. Inputs outside the
/// source range clamp to its endpoints.
pub fn interp(value: f64, src: (f64, f64), dst: (f64, f64)) -> f64 {
    let (src_lo, src_hi) = src;
    let (dst_lo, dst_hi) = dst;
    if src_hi <= src_lo {
        return dst_lo;
    }
    if value <= src_lo {
        return dst_lo;
    }
    if value >= src_hi {
        return dst_hi;
    }
    let t = (value - src_lo) / (src_hi - src_lo);
    dst_lo + (dst_hi - dst_lo) * t
}

/// Maps a fingertip pixel inside the frame onto the screen.
pub fn map_to_screen(pixel: (i32, i32), frame: (u32, u32), screen: (f64, f64)) -> (f64, f64) {
    (
        interp(pixel.0 as f64, (0.0, frame.0 as f64), (0.0, screen.0)),
        interp(pixel.1 as f64, (0.0, frame.1 as f64), (0.0, screen.1)),
    )
}
