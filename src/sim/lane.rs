//! Viewport and lane geometry
//!
//! The viewport arrives in physical pixels. Everything downstream works in dp,
//! so the conversion happens exactly once, here.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::lane_for_x;

/// Render surface size as last reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width_px: u32,
    pub height_px: u32,
    /// Physical pixels per dp
    pub density: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width_px: 0,
            height_px: 0,
            density: 1.0,
        }
    }
}

impl Viewport {
    /// Zero-sized viewports disable update, draw and tap handling
    pub fn is_valid(&self) -> bool {
        self.width_px > 0 && self.height_px > 0 && self.density > 0.0
    }

    pub fn width(&self) -> f32 {
        self.width_px as f32 / self.density
    }

    pub fn height(&self) -> f32 {
        self.height_px as f32 / self.density
    }

    /// Convert a pixel position into dp
    pub fn to_dp(&self, x_px: f32, y_px: f32) -> Vec2 {
        Vec2::new(x_px, y_px) / self.density
    }
}

/// One vertical track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub index: usize,
    pub left: f32,
    pub right: f32,
}

impl Lane {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }
}

/// Even partition of the play width into lanes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneLayout {
    lanes: Vec<Lane>,
    lane_width: f32,
}

impl LaneLayout {
    /// Lay out `lane_count` lanes across `width`; empty if either is zero
    pub fn new(width: f32, lane_count: usize) -> Self {
        if lane_count == 0 || !(width > 0.0) {
            return Self::default();
        }
        let lane_width = width / lane_count as f32;
        let lanes = (0..lane_count)
            .map(|index| {
                let left = index as f32 * lane_width;
                Lane {
                    index,
                    left,
                    right: left + lane_width,
                }
            })
            .collect();
        Self { lanes, lane_width }
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn lane_width(&self) -> f32 {
        self.lane_width
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn get(&self, index: usize) -> Option<&Lane> {
        self.lanes.get(index)
    }

    /// Lane under a horizontal position; out-of-range positions clamp to the
    /// nearest edge lane. `None` only when there are no lanes.
    pub fn lane_at(&self, x: f32) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        Some(lane_for_x(x, self.lane_width, self.lanes.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_layout_partitions_width() {
        let layout = LaneLayout::new(400.0, 4);
        assert_eq!(layout.len(), 4);
        assert_eq!(layout.lane_width(), 100.0);
        assert_eq!(layout.lanes()[0].left, 0.0);
        assert_eq!(layout.lanes()[3].right, 400.0);
        assert_eq!(layout.lanes()[2].center_x(), 250.0);
    }

    #[test]
    fn test_empty_layouts() {
        assert!(LaneLayout::new(0.0, 4).is_empty());
        assert!(LaneLayout::new(400.0, 0).is_empty());
        assert_eq!(LaneLayout::default().lane_at(10.0), None);
    }

    #[test]
    fn test_out_of_range_positions_clamp() {
        let layout = LaneLayout::new(300.0, 3);
        assert_eq!(layout.lane_at(-50.0), Some(0));
        assert_eq!(layout.lane_at(300.0), Some(2));
        assert_eq!(layout.lane_at(10_000.0), Some(2));
        assert_eq!(layout.lane_at(f32::NAN), Some(0));
    }

    #[test]
    fn test_viewport_density_conversion() {
        let viewport = Viewport {
            width_px: 1080,
            height_px: 1920,
            density: 2.0,
        };
        assert!(viewport.is_valid());
        assert_eq!(viewport.width(), 540.0);
        assert_eq!(viewport.height(), 960.0);
        assert_eq!(viewport.to_dp(100.0, 50.0), Vec2::new(50.0, 25.0));
        assert!(!Viewport::default().is_valid());
    }

    proptest! {
        #[test]
        fn prop_any_x_in_width_maps_to_valid_lane(
            lanes in 3usize..=6,
            width in 1.0f32..4000.0,
            frac in 0.0f32..1.0,
        ) {
            let x = width * frac;
            let layout = LaneLayout::new(width, lanes);
            let lane = layout.lane_at(x).unwrap();
            prop_assert!(lane < lanes);
            let expected = ((x / layout.lane_width()).floor() as usize).min(lanes - 1);
            prop_assert_eq!(lane, expected);
        }

        #[test]
        fn prop_lane_lookup_is_monotonic_and_hits_centers(
            lanes in 3usize..=6,
            width in 1.0f32..4000.0,
            a in 0.0f32..1.0,
            b in 0.0f32..1.0,
        ) {
            let layout = LaneLayout::new(width, lanes);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(layout.lane_at(width * lo) <= layout.lane_at(width * hi));
            for lane in layout.lanes() {
                prop_assert_eq!(layout.lane_at(lane.center_x()), Some(lane.index));
            }
        }
    }
}
