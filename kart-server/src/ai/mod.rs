// ==============================================================================
// ai — AUTONOMOUS DRIVING CONTROLLER
// ------------------------------------------------------------------------------
// One `DrivingController` per computer kart. Each frame `decide` reads the
// track, its own kart and everyone else, and returns a `Decision`: the
// `Command` for its kart plus an optional snap-to-track request. It never
// writes to any vehicle; the race loop applies the decision.
//
// Pipeline per frame:
//   racing line check → off-track measure → hard snap → recovery script
//   → target mode (roam / chase / return) → off-track correction
//   → steering (+ avoidance) → throttle (+ rubber band) → drift gate
//   → item gate → stuck check → mistakes
// ==============================================================================

pub mod difficulty;
pub mod racing_line;
pub mod recovery;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::items::{ItemCategory, ItemKind};
use crate::math::{
    angle_between, bearing, heading_vector, left_vector, planar_cross, planar_distance, smoothing, Vec3,
};
use crate::track::TrackQuery;
use crate::vehicle::{Command, Vehicle, VehicleId};

pub use difficulty::{rubber_band, Difficulty, DifficultyProfile};
pub use racing_line::{RacingLine, Waypoint, RACING_LINE_SAMPLES};
pub use recovery::{recovery_command, RecoveryState, StuckDetector};

use recovery::{HARD_OFF_TRACK_FACTOR, OFF_TRACK_LIMIT, RECOVERY_DURATION};

// --- targeting ---
const BASE_LOOKAHEAD: f32 = 10.0; // m
const LOOKAHEAD_PER_SPEED: f32 = 0.4; // s, extra metres per m/s
const WANDER_INTERVAL: (f32, f32) = (2.0, 4.0); // s
const WANDER_LATERAL: f32 = 3.0; // m at zero consistency
const CHASE_RADIUS: f32 = 18.0; // m
const CHASE_CONE: f32 = 1.0; // rad either side of the nose
const FALLBACK_HALF_WIDTH: f32 = 7.0; // m, used without a track

// --- off-track correction ---
const OFF_TRACK_LOOKAHEAD: f32 = 8.0; // m
const OFF_TRACK_SPEED_CAP: f32 = 0.45; // fraction of max speed
const OFF_TRACK_RESPONSIVENESS: f32 = 1.8;

// --- steering / throttle ---
const DEAD_BAND: f32 = 0.05; // rad
const SHARP_TURN_ANGLE: f32 = 0.9; // rad
const SHARP_TURN_SPEED: f32 = 0.6; // fraction of max speed
const SPEED_MARGIN: f32 = 1.5; // m/s

// --- avoidance ---
pub const FEELER_LENGTH: f32 = 14.0; // m
const FEELER_SPREAD: f32 = 0.3; // rad
const AVOID_RANGE: f32 = 9.0; // m
const AVOID_CONE: f32 = 0.45; // rad
const AVOID_OFFSET: f32 = 0.35; // added to the steering signal

// --- drift / items ---
const DRIFT_DECISION_INTERVAL: f32 = 0.25; // s
const DRIFT_ENTER_ANGLE: f32 = 0.45; // rad between current and next-next segment
const DRIFT_CONTINUE_ANGLE: f32 = 0.2;
const DRIFT_ENTER_SPEED: f32 = 0.6; // fraction of max speed
const ITEM_DECISION_INTERVAL: f32 = 0.5; // s
const OFFENSE_RANGE: f32 = 35.0; // m
const OFFENSE_CONE: f32 = 0.35; // rad
const THREAT_RANGE: f32 = 15.0; // m
const FAR_BEHIND: f32 = 0.15; // laps behind the leader
const STRAIGHT_ANGLE: f32 = 0.15; // rad

// --- mistakes ---
const MISTAKE_DURATION: f32 = 0.3; // s

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMode {
    Roam,
    Chase,
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mistake {
    InvertSteer,
    ReleaseThrottle,
}

/// Tie-breaking biases, rolled per kart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Personality {
    pub aggression: f32,  // 0..1
    pub consistency: f32, // 0.5..1
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Decision {
    pub command: Command,
    /// Teleport the kart here (position, heading) with a full state reset.
    pub snap_to: Option<(Vec3, f32)>,
}

impl Decision {
    fn drive(command: Command) -> Self {
        Self { command, snap_to: None }
    }
}

pub struct DrivingController {
    vehicle: VehicleId,
    difficulty: Difficulty,
    profile: DifficultyProfile,
    personality: Personality,
    rng: StdRng,

    racing_line: RacingLine,
    regen_attempted: bool,
    target_index: usize,
    lookahead: f32,
    mode: TargetMode,
    wander_offset: f32,
    wander_timer: f32,
    last_target: Option<Vec3>,
    perceived_angle: f32,

    drift_timer: f32,
    drift_wanted: Option<f32>, // direction
    item_timer: f32,

    stuck: StuckDetector,
    off_track_time: f32,
    recovery: RecoveryState,
    mistake: Option<(Mistake, f32)>,
}

/// Obstacle feelers: straight ahead, then either side of the nose.
pub fn feeler_directions(heading: f32) -> [Vec3; 3] {
    [
        heading_vector(heading),
        heading_vector(heading + FEELER_SPREAD),
        heading_vector(heading - FEELER_SPREAD),
    ]
}

impl DrivingController {
    pub fn new(vehicle: VehicleId, difficulty: Difficulty, seed: u64, track: Option<&dyn TrackQuery>) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let personality = Personality {
            aggression: rng.gen_range(0.0..1.0),
            consistency: rng.gen_range(0.5..1.0),
        };
        let racing_line = track
            .map(|t| RacingLine::build(&t.centerline_samples(RACING_LINE_SAMPLES)))
            .unwrap_or_default();
        let item_timer = rng.gen_range(0.0..ITEM_DECISION_INTERVAL);

        Self {
            vehicle,
            difficulty,
            profile: difficulty.profile(),
            personality,
            rng,
            racing_line,
            regen_attempted: false,
            target_index: 0,
            lookahead: BASE_LOOKAHEAD,
            mode: TargetMode::Roam,
            wander_offset: 0.0,
            wander_timer: 0.0,
            last_target: None,
            perceived_angle: 0.0,
            drift_timer: 0.0,
            drift_wanted: None,
            item_timer,
            stuck: StuckDetector::new(Vec3::zeros()),
            off_track_time: 0.0,
            recovery: RecoveryState::Normal,
            mistake: None,
        }
    }

    pub fn vehicle(&self) -> VehicleId {
        self.vehicle
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn personality(&self) -> Personality {
        self.personality
    }

    pub fn mode(&self) -> TargetMode {
        self.mode
    }

    pub fn recovery(&self) -> RecoveryState {
        self.recovery
    }

    /// Where the controller steered toward on its last decision.
    pub fn last_target(&self) -> Option<Vec3> {
        self.last_target
    }

    pub fn decide(&mut self, track: Option<&dyn TrackQuery>, vehicles: &[Vehicle], dt: f32) -> Decision {
        let dt = if dt.is_finite() { dt.clamp(0.0, crate::vehicle::physics::MAX_FRAME_DT) } else { 0.0 };
        let Some(me) = vehicles.iter().find(|v| v.id == self.vehicle) else {
            return Decision::default();
        };
        if me.progress.finished {
            // cruise to a stop past the line
            self.last_target = None;
            return Decision::default();
        }

        // 0) Racing line, regenerated once if missing
        if self.racing_line.is_empty() && !self.regen_attempted {
            self.regen_attempted = true;
            if let Some(track) = track {
                self.racing_line = RacingLine::build(&track.centerline_samples(RACING_LINE_SAMPLES));
            }
            tracing::warn!(kart = %self.vehicle, rebuilt = !self.racing_line.is_empty(), "racing line missing, regenerating");
        }

        // 1) Where are we relative to the course?
        let position = me.position;
        let (on_track, nearest, course_heading, half_width) = match track {
            Some(t) => (
                t.is_on_track(position.x, position.z),
                Some(t.nearest_centerline_point(position.x, position.z)),
                t.course_direction(position.x, position.z),
                t.half_width(),
            ),
            None => match self.racing_line.nearest_index(&position) {
                Some(i) => {
                    let wp = self.racing_line.get(i).position;
                    (
                        planar_distance(&wp, &position) <= FALLBACK_HALF_WIDTH,
                        Some(wp),
                        self.racing_line.segment_heading(i),
                        FALLBACK_HALF_WIDTH,
                    )
                }
                None => (true, None, me.heading, FALLBACK_HALF_WIDTH),
            },
        };
        let off_distance = nearest.map_or(0.0, |c| planar_distance(&c, &position));

        // 2) Hard off-track: teleport, no gradual recovery
        if let Some(center) = nearest {
            if off_distance >= HARD_OFF_TRACK_FACTOR * half_width {
                self.reset_after_snap(center);
                tracing::info!(kart = %self.vehicle, off_distance, "far off track, snapping back");
                return Decision {
                    command: Command::default(),
                    snap_to: Some((center, course_heading)),
                };
            }
        }

        if on_track {
            self.off_track_time = 0.0;
        } else {
            self.off_track_time += dt;
        }

        // 3) Recovery script overrides everything else
        if let RecoveryState::Recovering { elapsed, turn } = self.recovery {
            let elapsed = elapsed + dt;
            if elapsed < RECOVERY_DURATION {
                self.recovery = RecoveryState::Recovering { elapsed, turn };
                return Decision::drive(recovery_command(elapsed, turn));
            }
            self.recovery = RecoveryState::Normal;
            self.stuck.reset(position);
            self.off_track_time = 0.0;
            tracing::debug!(kart = %self.vehicle, "recovery finished");
        }

        // 4) Target mode and point
        let mode = self.select_mode(me, vehicles, track);
        if mode != self.mode {
            tracing::debug!(kart = %self.vehicle, from = ?self.mode, to = ?mode, "ai mode");
            self.mode = mode;
        }

        let mut speed_cap = 1.0;
        let mut responsiveness = 1.0;
        let mut dead_band = DEAD_BAND;
        let mut target = match mode {
            TargetMode::Chase => self.chase_target(me, vehicles).unwrap_or(position),
            TargetMode::Return => track.map_or(Vec3::zeros(), |t| t.arena_center()),
            TargetMode::Roam => self.roam_target(me, dt),
        };
        let mut line_speed = match mode {
            TargetMode::Roam if !self.racing_line.is_empty() => self.racing_line.get(self.target_index).target_speed,
            _ => 1.0,
        };

        if !on_track && mode != TargetMode::Return {
            if let Some(center) = nearest {
                target = center + heading_vector(course_heading) * OFF_TRACK_LOOKAHEAD;
                speed_cap = OFF_TRACK_SPEED_CAP;
                responsiveness = OFF_TRACK_RESPONSIVENESS;
                dead_band = DEAD_BAND * 0.4;
                line_speed = line_speed.min(speed_cap);
            }
        }
        self.last_target = Some(target);

        // 5) Steering
        let raw_angle = angle_between(me.heading, bearing(&position, &target));
        let reaction = (smoothing(1.0 / self.profile.reaction_time.max(0.02), dt) * responsiveness).min(1.0);
        self.perceived_angle += (raw_angle - self.perceived_angle) * reaction;
        let mut steer = self.perceived_angle * self.profile.turn_accuracy * responsiveness;
        steer += self.avoidance_bias(me, vehicles, track);

        let mut command = Command::default();
        if steer > dead_band {
            command.left = true;
        } else if steer < -dead_band {
            command.right = true;
        }

        // 6) Throttle with rubber banding
        let band = rubber_band(&self.profile, self.ranks_behind_human(me, vehicles));
        let target_speed = me.max_speed * line_speed.min(speed_cap) * (1.0 + band);
        let sharp = raw_angle.abs() > SHARP_TURN_ANGLE && me.speed > me.max_speed * SHARP_TURN_SPEED;
        if sharp || me.speed > target_speed + SPEED_MARGIN {
            command.backward = true;
        } else if me.speed < target_speed {
            command.forward = true;
        }

        // 7) Drift, re-evaluated on a timer
        self.drift_timer -= dt;
        if self.drift_timer <= 0.0 {
            self.drift_timer = DRIFT_DECISION_INTERVAL;
            self.drift_wanted = self.drift_choice(me, on_track);
        }
        if let Some(direction) = self.drift_wanted {
            command.drift = true;
            command.forward = true;
            command.backward = false;
            if !me.is_drifting() {
                command.left = direction > 0.0;
                command.right = direction < 0.0;
            }
        }

        // 8) Items, re-evaluated on a timer
        if let Some(kind) = me.held_item {
            self.item_timer -= dt;
            if self.item_timer <= 0.0 {
                self.item_timer = ITEM_DECISION_INTERVAL * self.rng.gen_range(0.8..1.2);
                let p = self.profile.item_use_probability.clamp(0.0, 1.0) as f64;
                if self.rng.gen_bool(p) && self.should_use_item(kind, me, vehicles, on_track) {
                    command.use_item = true;
                    tracing::debug!(kart = %self.vehicle, ?kind, "ai uses item");
                }
            }
        }

        // 9) Stuck or off-track for too long → scripted recovery
        let stuck = self.stuck.observe(&position, command.forward, dt);
        if stuck || self.off_track_time > OFF_TRACK_LIMIT {
            let toward = angle_between(me.heading, course_heading);
            let turn = if toward >= 0.0 { 1.0 } else { -1.0 };
            self.recovery = RecoveryState::Recovering { elapsed: 0.0, turn };
            self.off_track_time = 0.0;
            self.mistake = None;
            tracing::debug!(kart = %self.vehicle, stuck, "starting recovery");
            return Decision::drive(recovery_command(0.0, turn));
        }

        // 10) Mistakes, never while off-track
        if on_track {
            self.inject_mistake(&mut command, dt);
        } else {
            self.mistake = None;
        }

        Decision::drive(command)
    }

    fn reset_after_snap(&mut self, position: Vec3) {
        self.recovery = RecoveryState::Normal;
        self.off_track_time = 0.0;
        self.stuck.reset(position);
        self.mistake = None;
        self.drift_wanted = None;
        self.perceived_angle = 0.0;
    }

    fn select_mode(&self, me: &Vehicle, vehicles: &[Vehicle], track: Option<&dyn TrackQuery>) -> TargetMode {
        if let Some(t) = track {
            if planar_distance(&me.position, &t.arena_center()) > t.arena_radius() {
                return TargetMode::Return;
            }
        }
        if self.chase_target(me, vehicles).is_some() {
            return TargetMode::Chase;
        }
        TargetMode::Roam
    }

    /// Closest human in front of us within the detection radius.
    fn chase_target(&self, me: &Vehicle, vehicles: &[Vehicle]) -> Option<Vec3> {
        let radius = CHASE_RADIUS * (0.8 + 0.4 * self.personality.aggression);
        vehicles
            .iter()
            .filter(|v| v.is_human && v.id != me.id && !v.progress.finished)
            .filter(|v| planar_distance(&v.position, &me.position) < radius)
            .filter(|v| angle_between(me.heading, bearing(&me.position, &v.position)).abs() < CHASE_CONE)
            .min_by(|a, b| {
                planar_distance(&a.position, &me.position).total_cmp(&planar_distance(&b.position, &me.position))
            })
            .map(|v| v.position)
    }

    fn roam_target(&mut self, me: &Vehicle, dt: f32) -> Vec3 {
        self.wander_timer -= dt;
        let repick = self.wander_timer <= 0.0;
        if repick {
            self.wander_timer = self.rng.gen_range(WANDER_INTERVAL.0..WANDER_INTERVAL.1);
            let looseness = 1.0 - self.personality.consistency;
            self.wander_offset = self.rng.gen_range(-1.0..1.0) * WANDER_LATERAL * looseness;
        }

        let Some(nearest) = self.racing_line.nearest_index(&me.position) else {
            // no line: loose wander point ahead of the nose
            return me.position + heading_vector(me.heading + self.wander_offset * 0.1) * self.lookahead;
        };

        self.lookahead = BASE_LOOKAHEAD + me.speed.max(0.0) * LOOKAHEAD_PER_SPEED;
        let next = (nearest + self.racing_line.samples_for(self.lookahead)) % self.racing_line.len();
        if next != self.target_index && !repick {
            // point reached; new offset for the next one is rolled lazily
            self.wander_timer = self.wander_timer.min(WANDER_INTERVAL.0);
        }
        self.target_index = next;

        let wp = self.racing_line.get(next).position;
        wp + left_vector(self.racing_line.segment_heading(next)) * self.wander_offset
    }

    /// Steering bias away from the first obstacle or kart in the cone.
    fn avoidance_bias(&self, me: &Vehicle, vehicles: &[Vehicle], track: Option<&dyn TrackQuery>) -> f32 {
        let forward = me.forward();

        if let Some(t) = track {
            for dir in feeler_directions(me.heading) {
                if let Some(hit) = t.probe_obstacle(&me.position, &dir, FEELER_LENGTH) {
                    let to = hit.position - me.position;
                    return planar_cross(&forward, &to).signum() * AVOID_OFFSET;
                }
            }
        }

        for other in vehicles.iter().filter(|v| v.id != me.id) {
            let to = other.position - me.position;
            let d = planar_distance(&other.position, &me.position);
            if d > AVOID_RANGE || d < 1e-3 {
                continue;
            }
            if angle_between(me.heading, bearing(&me.position, &other.position)).abs() < AVOID_CONE {
                return planar_cross(&forward, &to).signum() * AVOID_OFFSET * 0.6;
            }
        }
        0.0
    }

    fn ranks_behind_human(&self, me: &Vehicle, vehicles: &[Vehicle]) -> i32 {
        let best_human = vehicles
            .iter()
            .filter(|v| v.is_human && v.progress.race_position > 0)
            .map(|v| v.progress.race_position)
            .min();
        match best_human {
            Some(rank) if me.progress.race_position > 0 => me.progress.race_position as i32 - rank as i32,
            _ => 0,
        }
    }

    fn drift_choice(&self, me: &Vehicle, on_track: bool) -> Option<f32> {
        if self.racing_line.is_empty() || !on_track || self.mode != TargetMode::Roam {
            return None;
        }
        let turn = self.racing_line.turn_ahead(self.target_index, 2);
        let fast = me.speed > me.max_speed * DRIFT_ENTER_SPEED;
        let continuing = me.is_drifting() && me.drift.level >= 2 && turn.abs() > DRIFT_CONTINUE_ANGLE;
        if continuing {
            return Some(me.drift.direction);
        }
        (turn.abs() > DRIFT_ENTER_ANGLE && fast).then(|| turn.signum())
    }

    fn should_use_item(&self, kind: ItemKind, me: &Vehicle, vehicles: &[Vehicle], on_track: bool) -> bool {
        let rivals = move || vehicles.iter().filter(move |v| v.id != me.id && !v.progress.finished);
        let angle_to = |v: &Vehicle| angle_between(me.heading, bearing(&me.position, &v.position)).abs();
        let distance = |v: &Vehicle| planar_distance(&v.position, &me.position);

        match kind.category() {
            ItemCategory::Offense => rivals().any(|v| {
                distance(v) < OFFENSE_RANGE
                    && angle_to(v) < OFFENSE_CONE
                    && v.progress.total() >= me.progress.total()
            }),
            ItemCategory::Homing => rivals().any(|v| v.progress.total() > me.progress.total()),
            ItemCategory::Defense => {
                let leading = me.progress.race_position == 1;
                let threat = rivals().any(|v| {
                    distance(v) < THREAT_RANGE && angle_to(v) > std::f32::consts::FRAC_PI_2
                });
                leading || threat
            }
            ItemCategory::CatchUp => {
                let leader = rivals().map(|v| v.progress.total()).fold(me.progress.total(), f32::max);
                let far_behind = leader - me.progress.total() > FAR_BEHIND;
                let straight = on_track
                    && !self.racing_line.is_empty()
                    && self.racing_line.turn_ahead(self.target_index, 3).abs() < STRAIGHT_ANGLE;
                far_behind || (kind == ItemKind::Mushroom && straight)
            }
        }
    }

    fn inject_mistake(&mut self, command: &mut Command, dt: f32) {
        if let Some((kind, remaining)) = self.mistake {
            let remaining = remaining - dt;
            self.mistake = (remaining > 0.0).then_some((kind, remaining));
        } else {
            let p = (self.profile.mistake_rate * dt).clamp(0.0, 1.0) as f64;
            if self.rng.gen_bool(p) {
                let kind = if self.rng.gen_bool(0.5) {
                    Mistake::InvertSteer
                } else {
                    Mistake::ReleaseThrottle
                };
                self.mistake = Some((kind, MISTAKE_DURATION));
            }
        }

        match self.mistake {
            Some((Mistake::InvertSteer, _)) => {
                std::mem::swap(&mut command.left, &mut command.right);
            }
            Some((Mistake::ReleaseThrottle, _)) => command.forward = false,
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::vec3;
    use crate::track::testing::Corridor;
    use crate::track::{Course, CourseDef};
    use crate::vehicle::{HitEffect, STANDARD_KART};

    const DT: f32 = 1.0 / 60.0;

    fn kart(id: u32, human: bool, position: Vec3, heading: f32) -> Vehicle {
        Vehicle::new(VehicleId(id), format!("k{id}"), human, STANDARD_KART, position, heading)
    }

    fn controller(track: &dyn TrackQuery) -> DrivingController {
        let mut c = DrivingController::new(VehicleId(1), Difficulty::Hard, 42, Some(track));
        c.profile.mistake_rate = 0.0;
        c
    }

    #[test]
    fn hard_off_track_snaps_immediately() {
        let track = Corridor;
        let mut ai = controller(&track);
        let mut me = kart(1, false, vec3(15.5, 0.0, 20.0), 1.0);
        me.speed = 12.0;
        me.apply_hit(HitEffect::Freeze);

        let decision = ai.decide(Some(&track), std::slice::from_ref(&me), DT);
        let (position, heading) = decision.snap_to.expect("snap requested");
        assert_eq!(position, vec3(0.0, 0.0, 20.0));
        assert_eq!(heading, 0.0);
        assert_eq!(decision.command, Command::default());

        me.snap_to_track(position, heading);
        assert_eq!(me.speed, 0.0);
        assert!(!me.status.is_frozen());
    }

    #[test]
    fn mild_off_track_steers_back_without_snapping() {
        let track = Corridor;
        let mut ai = controller(&track);
        // x > 0 is the kart's left at heading 0, so the track is to the right
        let me = kart(1, false, vec3(8.0, 0.0, 20.0), 0.0);
        let mut turned_right = false;
        for _ in 0..10 {
            let d = ai.decide(Some(&track), std::slice::from_ref(&me), DT);
            assert!(d.snap_to.is_none());
            turned_right |= d.command.right;
            assert!(!d.command.left);
        }
        assert!(turned_right);
    }

    #[test]
    fn stuck_kart_reverses_then_drives_out() {
        let track = Corridor;
        let mut ai = controller(&track);
        let me = kart(1, false, vec3(0.0, 0.0, 20.0), 0.0);

        let mut saw_reverse = false;
        let mut saw_forward_after = false;
        for _ in 0..(60 * 4) {
            let d = ai.decide(Some(&track), std::slice::from_ref(&me), DT);
            if let RecoveryState::Recovering { elapsed, .. } = ai.recovery() {
                if elapsed < recovery::RECOVERY_REVERSE {
                    saw_reverse |= d.command.backward;
                } else if saw_reverse {
                    saw_forward_after |= d.command.forward;
                }
            }
        }
        assert!(saw_reverse);
        assert!(saw_forward_after);
    }

    #[test]
    fn chases_a_human_in_front() {
        let track = Corridor;
        let mut ai = controller(&track);
        let me = kart(1, false, vec3(0.0, 0.0, 0.0), 0.0);
        let human = kart(0, true, vec3(1.0, 0.0, 8.0), 0.0);
        ai.decide(Some(&track), &[human.clone(), me.clone()], DT);
        assert_eq!(ai.mode(), TargetMode::Chase);
        assert_eq!(ai.last_target(), Some(human.position));

        // behind us: ignored
        let behind = kart(0, true, vec3(0.0, 0.0, -8.0), 0.0);
        ai.decide(Some(&track), &[behind, me], DT);
        assert_eq!(ai.mode(), TargetMode::Roam);
    }

    #[test]
    fn outside_the_arena_heads_home() {
        let mut def = CourseDef::oval();
        def.arena_radius = Some(20.0);
        let small = Course::new(def);
        let mut ai = DrivingController::new(VehicleId(1), Difficulty::Normal, 7, Some(&small));
        // on the front straight, so no snap, but outside the arena circle
        let me = kart(1, false, vec3(50.0, 0.0, 0.0), 0.0);
        ai.decide(Some(&small), std::slice::from_ref(&me), DT);
        assert_eq!(ai.mode(), TargetMode::Return);
        assert_eq!(ai.last_target(), Some(small.arena_center()));
    }

    #[test]
    fn mistakes_are_skipped_off_track() {
        let track = Corridor;
        let mut ai = controller(&track);
        ai.profile.mistake_rate = 1.0e6;

        let off = kart(1, false, vec3(8.0, 0.0, 20.0), 0.0);
        ai.decide(Some(&track), std::slice::from_ref(&off), DT);
        assert!(ai.mistake.is_none());

        let on = kart(1, false, vec3(0.0, 0.0, 20.0), 0.0);
        ai.decide(Some(&track), std::slice::from_ref(&on), DT);
        assert!(ai.mistake.is_some());
    }

    #[test]
    fn fires_a_shell_at_a_rival_ahead() {
        let track = Corridor;
        let mut ai = controller(&track);
        ai.profile.item_use_probability = 1.0;
        let mut me = kart(1, false, vec3(0.0, 0.0, 0.0), 0.0);
        me.held_item = Some(ItemKind::Shell);
        let mut rival = kart(2, false, vec3(0.0, 0.0, 20.0), 0.0);
        rival.progress.fraction = 0.2;

        let used = (0..60).any(|_| ai.decide(Some(&track), &[me.clone(), rival.clone()], DT).command.use_item);
        assert!(used);
    }

    #[test]
    fn holds_a_shell_with_nobody_ahead() {
        let track = Corridor;
        let mut ai = controller(&track);
        ai.profile.item_use_probability = 1.0;
        let mut me = kart(1, false, vec3(0.0, 0.0, 0.0), 0.0);
        me.held_item = Some(ItemKind::Shell);
        me.progress.fraction = 0.5;
        let rival = kart(2, false, vec3(0.0, 0.0, -20.0), 0.0);

        let used = (0..60).any(|_| ai.decide(Some(&track), &[me.clone(), rival.clone()], DT).command.use_item);
        assert!(!used);
    }

    #[test]
    fn works_without_a_track() {
        let mut ai = DrivingController::new(VehicleId(1), Difficulty::Easy, 1, None);
        ai.profile.mistake_rate = 0.0;
        let me = kart(1, false, Vec3::zeros(), 0.0);
        let d = ai.decide(None, std::slice::from_ref(&me), DT);
        assert!(d.command.forward);
        assert!(d.snap_to.is_none());
        assert!(ai.regen_attempted);
    }

    #[test]
    fn unknown_vehicle_gets_a_neutral_command() {
        let mut ai = DrivingController::new(VehicleId(9), Difficulty::Normal, 1, None);
        assert_eq!(ai.decide(None, &[], DT), Decision::default());
    }
}
