// src/ai/racing_line.rs
//
// Racing line = evenly spaced centerline samples, each tagged with a target
// speed (fraction of max speed) from the sharpest turn a few samples ahead.

use crate::math::{angle_between, bearing, planar_distance, Vec3};

pub const RACING_LINE_SAMPLES: usize = 64;

const LOOKAHEAD_WINDOW: usize = 4; // samples scanned ahead for corners
const TURN_SPAN: usize = 3; // samples a "turn" is measured over
const MIN_CORNER_SPEED: f32 = 0.5; // fraction of max speed at a right angle
const FULL_CORNER_ANGLE: f32 = std::f32::consts::FRAC_PI_2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub position: Vec3,
    pub target_speed: f32, // fraction of max speed, 0..1
}

#[derive(Debug, Clone, Default)]
pub struct RacingLine {
    waypoints: Vec<Waypoint>,
    spacing: f32,
}

impl RacingLine {
    pub fn build(samples: &[Vec3]) -> Self {
        let n = samples.len();
        if n < 3 {
            return Self::default();
        }

        let heading = |i: usize| bearing(&samples[i % n], &samples[(i + 1) % n]);
        let turn_at = |i: usize| angle_between(heading(i), heading(i + TURN_SPAN)).abs();

        let waypoints = (0..n)
            .map(|i| {
                let sharpest = (0..LOOKAHEAD_WINDOW)
                    .map(|k| turn_at(i + k))
                    .fold(0.0_f32, f32::max);
                let severity = (sharpest / FULL_CORNER_ANGLE).min(1.0);
                Waypoint {
                    position: samples[i],
                    target_speed: 1.0 - severity * (1.0 - MIN_CORNER_SPEED),
                }
            })
            .collect();

        let perimeter: f32 = (0..n).map(|i| planar_distance(&samples[i], &samples[(i + 1) % n])).sum();

        Self {
            waypoints,
            spacing: perimeter / n as f32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Wrapping access. Panics on an empty line; callers check `is_empty`.
    pub fn get(&self, index: usize) -> &Waypoint {
        &self.waypoints[index % self.waypoints.len()]
    }

    pub fn nearest_index(&self, position: &Vec3) -> Option<usize> {
        self.waypoints
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                planar_distance(&a.position, position).total_cmp(&planar_distance(&b.position, position))
            })
            .map(|(i, _)| i)
    }

    pub fn segment_heading(&self, index: usize) -> f32 {
        bearing(&self.get(index).position, &self.get(index + 1).position)
    }

    /// Signed heading change from segment `index` to segment `index + span`.
    pub fn turn_ahead(&self, index: usize, span: usize) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        angle_between(self.segment_heading(index), self.segment_heading(index + span))
    }

    /// Number of samples covering `distance` metres.
    pub fn samples_for(&self, distance: f32) -> usize {
        if self.spacing <= 1e-3 {
            return 1;
        }
        ((distance / self.spacing).ceil() as usize).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{Course, CourseDef, TrackQuery};

    #[test]
    fn corners_are_slower_than_straights() {
        let course = Course::new(CourseDef::oval());
        let line = RacingLine::build(&course.centerline_samples(RACING_LINE_SAMPLES));
        assert_eq!(line.len(), RACING_LINE_SAMPLES);

        // sample 0 sits at the start of the front straight (x = 50, z = -60)
        let apex = line.nearest_index(&crate::math::vec3(0.0, 0.0, 110.0)).unwrap();
        let straight = line.nearest_index(&crate::math::vec3(50.0, 0.0, -30.0)).unwrap();
        assert!(line.get(apex).target_speed < line.get(straight).target_speed);
        assert!(line.get(apex).target_speed >= MIN_CORNER_SPEED);
        assert!(line.get(straight).target_speed <= 1.0);
    }

    #[test]
    fn too_few_samples_give_an_empty_line() {
        assert!(RacingLine::build(&[Vec3::zeros(), Vec3::zeros()]).is_empty());
        assert_eq!(RacingLine::default().turn_ahead(0, 2), 0.0);
    }
}
