// ==============================================================================
// debug.rs — DEBUG OVERLAY PRIMITIVES (SERVER -> CLIENT)
// ------------------------------------------------------------------------------
// Defines serializable debug primitives:
// - DebugRay: AI target lines and obstacle feelers
// - DebugKart: per-kart numeric state (drift, boost, recovery, mode, personality)
//
// Helpers:
// - push_target_ray(): line from a kart to the point its controller aims at
// - push_feelers(): the three obstacle feelers, with hit points
// - push_kart_debug(): pushes DebugKart snapshots into DebugOverlay
//
// This file is purely visualization scaffolding and should not contain
// simulation side effects.
// ==============================================================================

use serde::Serialize;

use crate::ai::{feeler_directions, Difficulty, DrivingController, RecoveryState, TargetMode, FEELER_LENGTH};
use crate::math::{planar_distance, Vec3};
use crate::track::TrackQuery;
use crate::vehicle::{Vehicle, VehicleId};

const TARGET_COLOR: [f32; 3] = [0.2, 0.8, 1.0];
const FEELER_CLEAR: [f32; 3] = [0.3, 1.0, 0.3];
const FEELER_HIT: [f32; 3] = [1.0, 0.2, 0.2];

#[derive(Clone, Debug, Default, Serialize)]
pub struct DebugOverlay {
    pub target_rays: Vec<DebugRay>,
    pub feelers: Vec<DebugRay>,
    pub karts: Vec<DebugKart>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DebugRay {
    pub origin: [f32; 3],
    pub direction: [f32; 3],
    pub length: f32,
    pub hit: Option<[f32; 3]>,
    pub color: [f32; 3],
}

#[derive(Clone, Debug, Serialize)]
pub struct DebugKart {
    pub id: VehicleId,
    pub mode: TargetMode,
    pub difficulty: Difficulty,
    pub aggression: f32,
    pub consistency: f32,
    pub recovering: bool,
    pub drift_level: u8,
    pub drift_time: f32,
    pub boost_time: f32,
    pub lateral_velocity: f32,
    pub engine_power: f32,
}

impl DebugOverlay {
    pub fn clear(&mut self) {
        self.target_rays.clear();
        self.feelers.clear();
        self.karts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.target_rays.is_empty() && self.feelers.is_empty() && self.karts.is_empty()
    }
}

fn arr(v: &Vec3) -> [f32; 3] {
    [v.x, v.y, v.z]
}

pub fn push_target_ray(overlay: &mut DebugOverlay, vehicle: &Vehicle, target: &Vec3) {
    let length = planar_distance(&vehicle.position, target);
    if length < 1e-3 {
        return;
    }
    let direction = (target - vehicle.position) / length;
    overlay.target_rays.push(DebugRay {
        origin: arr(&vehicle.position),
        direction: arr(&direction),
        length,
        hit: None,
        color: TARGET_COLOR,
    });
}

pub fn push_feelers(overlay: &mut DebugOverlay, vehicle: &Vehicle, track: &dyn TrackQuery) {
    for dir in feeler_directions(vehicle.heading) {
        let hit = track.probe_obstacle(&vehicle.position, &dir, FEELER_LENGTH);
        overlay.feelers.push(DebugRay {
            origin: arr(&vehicle.position),
            direction: arr(&dir),
            length: hit.map_or(FEELER_LENGTH, |h| h.distance),
            hit: hit.map(|h| arr(&(vehicle.position + dir * h.distance))),
            color: if hit.is_some() { FEELER_HIT } else { FEELER_CLEAR },
        });
    }
}

pub fn push_kart_debug(overlay: &mut DebugOverlay, vehicle: &Vehicle, controller: &DrivingController) {
    overlay.karts.push(DebugKart {
        id: vehicle.id,
        mode: controller.mode(),
        difficulty: controller.difficulty(),
        aggression: controller.personality().aggression,
        consistency: controller.personality().consistency,
        recovering: controller.recovery() != RecoveryState::Normal,
        drift_level: vehicle.drift.level,
        drift_time: vehicle.drift.time,
        boost_time: vehicle.boost.time,
        lateral_velocity: vehicle.lateral_velocity,
        engine_power: vehicle.engine_power,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Difficulty;
    use crate::math::vec3;
    use crate::track::{Course, CourseDef};
    use crate::vehicle::STANDARD_KART;

    #[test]
    fn feeler_hits_the_obstacle_in_front() {
        let course = Course::new(CourseDef::oval());
        // oval obstacle sits at (-46, -20); face it from 8 m away
        let v = Vehicle::new(VehicleId(0), "a", false, STANDARD_KART, vec3(-46.0, 0.0, -12.0), std::f32::consts::PI);
        let mut overlay = DebugOverlay::default();
        push_feelers(&mut overlay, &v, &course);
        assert_eq!(overlay.feelers.len(), 3);
        assert!(overlay.feelers[0].hit.is_some());
        assert!(overlay.feelers[0].length < FEELER_LENGTH);
    }

    #[test]
    fn kart_entry_and_clear() {
        let course = Course::new(CourseDef::oval());
        let v = Vehicle::new(VehicleId(3), "a", false, STANDARD_KART, vec3(50.0, 0.0, 0.0), 0.0);
        let ai = DrivingController::new(v.id, Difficulty::Normal, 1, Some(&course));
        let mut overlay = DebugOverlay::default();
        push_kart_debug(&mut overlay, &v, &ai);
        push_target_ray(&mut overlay, &v, &vec3(50.0, 0.0, 10.0));
        assert_eq!(overlay.karts[0].id, VehicleId(3));
        assert_eq!(overlay.karts[0].difficulty, Difficulty::Normal);
        assert!((0.5..=1.0).contains(&overlay.karts[0].consistency));
        assert_eq!(overlay.target_rays[0].length, 10.0);
        overlay.clear();
        assert!(overlay.is_empty());
    }
}
