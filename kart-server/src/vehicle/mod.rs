// ==============================================================================
// vehicle — KART STATE, STATS AND COMMAND CHANNEL
// ------------------------------------------------------------------------------
// One `Vehicle` per racer, human or AI. The only way to drive it is a
// `Command` (six booleans) handed to `physics::advance` once per frame.
//
// Sub-modules:
// - drift.rs   : drift charge + boost state machine
// - status.rs  : timed status effects, hit gate, max-speed stash/restore
// - physics.rs : per-frame integration (engine, steering, terrain, safety)
// ==============================================================================

pub mod drift;
pub mod physics;
pub mod status;

use serde::{Deserialize, Serialize};

use crate::items::ItemKind;
use crate::math::{heading_vector, Vec3};

pub use drift::{BoostState, DriftState};
pub use physics::advance;
pub use status::{HitEffect, HitOutcome, SpeedPenalty, StatusEffects};

/// Backward top speed as a fraction of the base max speed.
pub const REVERSE_FRACTION: f32 = 0.35;

/// Collision radius used for kart-vs-kart and kart-vs-item overlap.
pub const VEHICLE_RADIUS: f32 = 1.2; // m

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub u32);

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "kart#{}", self.0)
    }
}

/// Presentation only; no physics reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightClass {
    Light,
    #[default]
    Medium,
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleStats {
    pub max_speed: f32,      // m/s
    pub acceleration: f32,   // m/s^2 at standstill
    pub deceleration: f32,   // m/s^2 coasting
    pub brake_strength: f32, // m/s^2
    pub turn_rate: f32,      // rad/s at full steer
    pub friction: f32,       // 1/s rolling loss
    pub grass_friction: f32, // 1/s extra loss off-road
}

/// The one shared archetype every kart is derived from.
pub const STANDARD_KART: VehicleStats = VehicleStats {
    max_speed: 28.0,
    acceleration: 16.0,
    deceleration: 6.0,
    brake_strength: 32.0,
    turn_rate: 2.2,
    friction: 0.12,
    grass_friction: 1.4,
};

impl VehicleStats {
    /// Archetype scaled by a difficulty multiplier (speed-related stats only).
    pub fn scaled(&self, multiplier: f32) -> Self {
        let m = if multiplier.is_finite() { multiplier.clamp(0.5, 1.5) } else { 1.0 };
        Self {
            max_speed: self.max_speed * m,
            acceleration: self.acceleration * m,
            brake_strength: self.brake_strength * m,
            ..*self
        }
    }
}

/// Per-frame driving intent. Human input and AI decisions both end up here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Command {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub drift: bool,
    pub use_item: bool,
}

impl Command {
    /// +1 for left, -1 for right, 0 for none or both.
    pub fn steer_axis(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RaceProgress {
    pub lap: u32,               // completed laps
    pub last_checkpoint: usize, // last checkpoint confirmed in order this lap
    pub fraction: f32,          // position along the lap, [0, 1)
    pub race_position: usize,   // 1-based rank
    pub finished: bool,
    pub finish_time: Option<f32>,
    pub wrong_way: bool,
    pub left_grid: bool, // crossed the start line (or spawned past it)
}

impl RaceProgress {
    /// Laps + fraction. A kart still on the grid behind the line counts as
    /// slightly below zero rather than almost one lap ahead.
    pub fn total(&self) -> f32 {
        if !self.left_grid && self.fraction > 0.5 {
            return self.fraction - 1.0;
        }
        self.lap as f32 + self.fraction
    }
}

/// Last surface zone (pad, lava) that acted on the kart, so it does not
/// retrigger every frame while the kart is still inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardTouch {
    pub zone: usize,
    pub expires_in: f32,
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
    pub is_human: bool,
    pub weight: WeightClass,

    // --- kinematics ---
    pub position: Vec3,
    pub heading: f32,          // rad
    pub speed: f32,            // m/s, negative when reversing
    pub lateral_velocity: f32, // m/s along the kart's left axis
    pub vertical_velocity: f32,
    pub airborne: bool,

    // --- tuning ---
    pub stats: VehicleStats,
    pub max_speed: f32,         // current max speed incl. status penalties
    pub surface_top_speed: f32, // course multiplier seen on the last advance
    pub engine_power: f32,      // eased -1..1

    pub drift: DriftState,
    pub boost: BoostState,
    pub status: StatusEffects,
    pub held_item: Option<ItemKind>,
    pub progress: RaceProgress,
    pub command: Command,

    pub last_valid_position: Vec3,
    pub last_hazard_touched: Option<HazardTouch>,
    pub off_road_cap_timer: f32,
}

impl Vehicle {
    pub fn new(
        id: VehicleId,
        name: impl Into<String>,
        is_human: bool,
        stats: VehicleStats,
        position: Vec3,
        heading: f32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            is_human,
            weight: WeightClass::default(),
            position,
            heading,
            speed: 0.0,
            lateral_velocity: 0.0,
            vertical_velocity: 0.0,
            airborne: false,
            stats,
            max_speed: stats.max_speed,
            surface_top_speed: 1.0,
            engine_power: 0.0,
            drift: DriftState::default(),
            boost: BoostState::default(),
            status: StatusEffects::default(),
            held_item: None,
            progress: RaceProgress::default(),
            command: Command::default(),
            last_valid_position: position,
            last_hazard_touched: None,
            off_road_cap_timer: 0.0,
        }
    }

    pub fn with_weight(mut self, weight: WeightClass) -> Self {
        self.weight = weight;
        self
    }

    pub fn forward(&self) -> Vec3 {
        heading_vector(self.heading)
    }

    /// max speed × boost × course top-speed multiplier.
    pub fn effective_max_speed(&self) -> f32 {
        (self.max_speed * self.boost.multiplier * self.surface_top_speed).max(0.0)
    }

    pub fn reverse_limit(&self) -> f32 {
        -self.stats.max_speed * REVERSE_FRACTION
    }

    pub fn clamp_speed(&mut self) {
        if !self.speed.is_finite() {
            self.speed = 0.0;
        }
        self.speed = self.speed.clamp(self.reverse_limit(), self.effective_max_speed());
    }

    pub fn is_drifting(&self) -> bool {
        self.drift.active
    }

    /// Begin a drift. Ignored while already drifting or below the minimum speed.
    pub fn start_drift(&mut self, direction: f32) -> bool {
        if self.airborne || self.speed.abs() <= drift::DRIFT_MIN_SPEED || direction == 0.0 {
            return false;
        }
        self.drift.start(direction)
    }

    /// End the drift and cash in its level. Returns the level that was released.
    pub fn end_drift(&mut self) -> u8 {
        let level = self.drift.end();
        if let Some((duration, multiplier)) = drift::boost_tier(level) {
            self.apply_boost(duration, multiplier);
            tracing::debug!(kart = %self.id, level, "drift boost");
        }
        level
    }

    /// Combine a boost with any running one (max, never additive) and give
    /// the kart one partial kick toward the new cap.
    pub fn apply_boost(&mut self, duration: f32, multiplier: f32) {
        self.boost.combine(duration, multiplier);
        let cap = self.effective_max_speed();
        if self.speed >= 0.0 && self.speed < cap {
            self.speed += (cap - self.speed) * drift::BOOST_SPEED_KICK;
        }
    }

    /// Hard reset onto the course: stopped, facing along it, no status.
    pub fn snap_to_track(&mut self, position: Vec3, heading: f32) {
        self.position = position;
        self.last_valid_position = position;
        self.heading = crate::math::wrap_angle(heading);
        self.speed = 0.0;
        self.lateral_velocity = 0.0;
        self.vertical_velocity = 0.0;
        self.airborne = false;
        self.engine_power = 0.0;
        self.drift = DriftState::default();
        self.boost = BoostState::default();
        self.clear_status();
        self.last_hazard_touched = None;
        self.off_road_cap_timer = 0.0;
        self.command = Command::default();
        tracing::info!(kart = %self.id, x = position.x, z = position.z, "snapped back onto the track");
    }
}
