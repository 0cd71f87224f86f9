use crate::{pointer::FingertipMarkers, types::Frame};

pub const CONNECTIONS: &[(usize, usize)] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (0, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (0, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
    (5, 9),
    (9, 13),
    (13, 17),
];

const SKELETON_LINE_THICKNESS: i32 = 3;
const SKELETON_LINE_COLOR: [u8; 4] = [56, 189, 248, 255];
const SKELETON_POINT_COLOR: [u8; 4] = [248, 113, 113, 255];
const FINGERTIP_RADIUS: i32 = 10;
const FINGERTIP_COLOR: [u8; 4] = [255, 0, 255, 255];
const CLICK_RADIUS: i32 = 15;
const CLICK_COLOR: [u8; 4] = [0, 255, 0, 255];

pub fn draw_skeleton(frame: &mut Frame, points: &[(f32, f32)]) {
    if points.len() < 2 {
        return;
    }

    for &(a, b) in CONNECTIONS {
        if let (Some(pa), Some(pb)) = (points.get(a), points.get(b)) {
            draw_line(frame, *pa, *pb, SKELETON_LINE_COLOR, SKELETON_LINE_THICKNESS);
        }
    }

    for &(x, y) in points {
        draw_circle(frame, (x as i32, y as i32), 4, SKELETON_POINT_COLOR);
    }
}

/// Index and thumb tip dots; a click paints a larger green disc under the
/// index tip first.
pub fn draw_fingertips(frame: &mut Frame, markers: &FingertipMarkers) {
    if markers.clicked {
        draw_circle(frame, markers.index, CLICK_RADIUS, CLICK_COLOR);
    }
    draw_circle(frame, markers.index, FINGERTIP_RADIUS, FINGERTIP_COLOR);
    draw_circle(frame, markers.thumb, FINGERTIP_RADIUS, FINGERTIP_COLOR);
}

fn draw_line(frame: &mut Frame, p0: (f32, f32), p1: (f32, f32), color: [u8; 4], thickness: i32) {
    let (mut x0, mut y0) = (p0.0 as i32, p0.1 as i32);
    let (x1, y1) = (p1.0 as i32, p1.1 as i32);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let radius = (thickness.max(1) - 1) / 2;

    loop {
        for ox in -radius..=radius {
            for oy in -radius..=radius {
                if ox.abs() + oy.abs() <= radius {
                    put_pixel(frame, x0 + ox, y0 + oy, color);
                }
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_circle(frame: &mut Frame, center: (i32, i32), radius: i32, color: [u8; 4]) {
    let (cx, cy) = center;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel(frame, cx + dx, cy + dy, color);
            }
        }
    }
}

fn put_pixel(frame: &mut Frame, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x as u32 >= frame.width || y as u32 >= frame.height {
        return;
    }
    let idx = (y as usize * frame.width as usize + x as usize) * 4;
    if let Some(px) = frame.rgba.get_mut(idx..idx + 4) {
        px.copy_from_slice(&color);
    }
}
