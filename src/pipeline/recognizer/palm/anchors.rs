//! SSD anchor centers for the 192x192 palm detector.
//!
//! Four feature layers with strides 8, 16, 16, 16. Layers sharing a stride
//! share a grid, so the stride-8 grid carries 2 anchors per cell and the
//! stride-16 grid carries 6.

pub const NUM_ANCHORS: usize = 2016;

const ANCHOR_OFFSET: f32 = 0.5;
const GRIDS: [(u32, usize); 2] = [(8, 2), (16, 6)];

pub fn generate_anchors(input_size: u32) -> Vec<[f32; 2]> {
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);
    for (stride, per_cell) in GRIDS {
        let cells = input_size.div_ceil(stride);
        for y in 0..cells {
            for x in 0..cells {
                let cx = (x as f32 + ANCHOR_OFFSET) / cells as f32;
                let cy = (y as f32 + ANCHOR_OFFSET) / cells as f32;
                anchors.extend(std::iter::repeat_n([cx, cy], per_cell));
            }
        }
    }
    anchors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palm_input_yields_expected_count() {
        let anchors = generate_anchors(192);
        assert_eq!(anchors.len(), NUM_ANCHORS);
    }

    #[test]
    fn anchors_are_cell_centers() {
        let anchors = generate_anchors(192);
        assert_eq!(anchors[0], [0.5 / 24.0, 0.5 / 24.0]);
        assert_eq!(anchors[1], anchors[0]);
        assert_eq!(anchors[2], [1.5 / 24.0, 0.5 / 24.0]);
        assert_eq!(anchors[1152], [0.5 / 12.0, 0.5 / 12.0]);
        assert_eq!(anchors[NUM_ANCHORS - 1], [11.5 / 12.0, 11.5 / 12.0]);
    }
}
