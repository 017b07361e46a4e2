// src/race/grid.rs
//
// Starting grid. Slots are handed out front to back, alternating between the
// left and right lane; the front row sits just behind the start line.

use serde::Serialize;
use std::collections::HashMap;

use crate::math::{left_vector, Vec3};
use crate::track::Course;

const LINE_GAP: f32 = 4.0; // m from the start line to the front row
const ROW_SPACING: f32 = 6.0; // m between rows
const LANE_OFFSET: f32 = 0.25; // fraction of track width either side of center

// ---------------------------------------------
// LANE
// ---------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lane {
    Left,
    Right,
}

impl Lane {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lane::Left => "left",
            Lane::Right => "right",
        }
    }

    fn side(self) -> f32 {
        match self {
            Lane::Left => 1.0,
            Lane::Right => -1.0,
        }
    }
}

// ---------------------------------------------
// SLOT RETURNED TO THE RACE
// ---------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSlot {
    pub index: usize, // 0 = pole
    pub row: usize,
    pub lane: Lane,
    pub position: Vec3,
    pub heading: f32,
}

#[derive(Debug, Default)]
pub struct GridAllocator {
    lane_counts: HashMap<Lane, usize>,
}

impl GridAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emptier lane first, left on ties.
    fn choose_lane(&self) -> Lane {
        let left = *self.lane_counts.get(&Lane::Left).unwrap_or(&0);
        let right = *self.lane_counts.get(&Lane::Right).unwrap_or(&0);
        if left <= right { Lane::Left } else { Lane::Right }
    }

    pub fn allocated(&self) -> usize {
        self.lane_counts.values().sum()
    }

    // ---------------------------------------------------------
    // Next free slot on the course
    // ---------------------------------------------------------
    pub fn allocate(&mut self, course: &Course) -> GridSlot {
        let index = self.allocated();
        let lane = self.choose_lane();
        let row = *self.lane_counts.get(&lane).unwrap_or(&0);
        *self.lane_counts.entry(lane).or_insert(0) += 1;

        // Row 0 closest to the line, counting back along the centerline.
        let back = LINE_GAP + row as f32 * ROW_SPACING;
        let (center, heading) = course.point_at_distance(course.length() - back);
        let lateral = lane.side() * course.def().track_width * LANE_OFFSET;
        let position = center + left_vector(heading) * lateral;

        GridSlot { index, row, lane, position, heading }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{CourseDef, TrackQuery};

    #[test]
    fn pole_is_furthest_ahead_and_lanes_alternate() {
        let course = Course::new(CourseDef::oval());
        let mut grid = GridAllocator::new();
        let slots: Vec<GridSlot> = (0..6).map(|_| grid.allocate(&course)).collect();

        assert_eq!(slots[0].lane, Lane::Left);
        assert_eq!(slots[1].lane, Lane::Right);
        assert_eq!(slots[2].row, 1);
        assert_eq!(grid.allocated(), 6);

        let progress: Vec<f32> = slots
            .iter()
            .map(|s| course.progress_fraction(s.position.x, s.position.z))
            .collect();
        // All behind the line, each row further back than the one before.
        assert!(progress.iter().all(|&p| p > 0.5));
        assert!(progress[0] > progress[2] && progress[2] > progress[4]);
        assert!(slots.iter().all(|s| course.is_on_track(s.position.x, s.position.z)));
    }
}
