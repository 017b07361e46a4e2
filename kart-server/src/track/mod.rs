// ==============================================================================
// track — COURSE QUERY SURFACE
// ------------------------------------------------------------------------------
// Everything the simulation asks about the course goes through `TrackQuery`:
// - drivable surface test, nearest centerline point, course heading
// - lap progress fraction in [0, 1)
// - per-position physics modifiers (friction, grip, brake, top speed, zones)
// - static obstacle feelers (rapier ray casts, see obstacles.rs)
//
// Vehicle physics never sees the trait; the race loop resolves modifiers at
// the vehicle's position and hands them over as a plain value.
// ==============================================================================

pub mod course;
pub mod obstacles;

pub use course::{Course, CourseDef, CourseTheme, SurfaceKind, SurfaceZone};
pub use obstacles::{ObstacleDef, ObstacleField, ObstacleHit};

use crate::math::Vec3;

/// Physics multipliers the course applies at one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsModifiers {
    pub friction: f32,         // multiplier on generic rolling friction
    pub turn_grip: f32,        // 0..1, lateral grip (ice is low)
    pub brake_efficiency: f32, // 0..1
    pub top_speed: f32,        // multiplier on the kart's max speed
    pub ground_height: f32,    // course surface height under the kart
    pub on_ice: bool,
    pub on_lava: bool,
    pub off_road: bool,
    pub boost_pad: bool,
    pub ramp: bool,
    pub zone: Option<usize>, // index of the surface zone touched, if any
}

impl Default for PhysicsModifiers {
    fn default() -> Self {
        Self {
            friction: 1.0,
            turn_grip: 1.0,
            brake_efficiency: 1.0,
            top_speed: 1.0,
            ground_height: 0.0,
            on_ice: false,
            on_lava: false,
            off_road: false,
            boost_pad: false,
            ramp: false,
            zone: None,
        }
    }
}

pub trait TrackQuery {
    fn is_on_track(&self, x: f32, z: f32) -> bool;
    fn nearest_centerline_point(&self, x: f32, z: f32) -> Vec3;
    /// Heading of the course at the centerline point nearest to (x, z).
    fn course_direction(&self, x: f32, z: f32) -> f32;
    fn progress_fraction(&self, x: f32, z: f32) -> f32;
    fn physics_modifiers(&self, x: f32, z: f32) -> PhysicsModifiers;

    fn track_width(&self) -> f32;
    fn arena_center(&self) -> Vec3;
    fn arena_radius(&self) -> f32;

    /// Evenly spaced (by arc length) centerline samples, starting at the finish line.
    fn centerline_samples(&self, count: usize) -> Vec<Vec3>;

    /// First static obstacle hit by a ray along `direction`, if any.
    fn probe_obstacle(&self, origin: &Vec3, direction: &Vec3, max_distance: f32)
        -> Option<ObstacleHit>;

    fn half_width(&self) -> f32 {
        self.track_width() * 0.5
    }
}
