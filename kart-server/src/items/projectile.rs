// src/items/projectile.rs

use serde::Serialize;

use crate::math::{angle_between, heading_vector, vec3, Vec3};
use crate::vehicle::{HitEffect, VehicleId};

use super::ItemKind;

/// Homing turn-rate cap.
pub const HOMING_TURN_RATE: f32 = 3.0; // rad/s

/// The owner cannot be hit by its own item for this long after spawn.
pub const OWNER_GRACE: f32 = 0.5; // s

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: u32,
    pub kind: ItemKind,
    pub owner: VehicleId,
    pub position: Vec3,
    pub direction: Vec3, // unit, on the XZ plane
    pub speed: f32,
    pub lifetime: f32,
    pub age: f32,
    pub target: Option<VehicleId>,
    pub bounces: u32,
    pub max_bounces: u32,
    pub radius: f32,
    pub effect: HitEffect,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hazard {
    pub id: u32,
    pub kind: ItemKind,
    pub owner: VehicleId,
    pub position: Vec3,
    pub radius: f32,
    pub lifetime: f32,
    pub age: f32,
    pub reusable: bool,
    pub effect: HitEffect,
    pub active: bool,
}

/// What presentation sees of a live item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    pub id: u32,
    pub kind: ItemKind,
    pub position: [f32; 3],
    pub radius: f32,
    pub hazard: bool,
}

impl Projectile {
    pub fn in_owner_grace(&self, vehicle: VehicleId) -> bool {
        vehicle == self.owner && self.age < OWNER_GRACE
    }

    pub fn heading(&self) -> f32 {
        self.direction.x.atan2(self.direction.z)
    }

    /// Turn toward `goal` by at most `HOMING_TURN_RATE * dt`; the direction
    /// stays unit length.
    pub fn steer_toward(&mut self, goal: &Vec3, dt: f32) {
        let to_goal = vec3(goal.x - self.position.x, 0.0, goal.z - self.position.z);
        if !(to_goal.norm() > 1e-4) {
            return;
        }
        let current = self.heading();
        let desired = to_goal.x.atan2(to_goal.z);
        let max_turn = HOMING_TURN_RATE * dt;
        let turn = angle_between(current, desired).clamp(-max_turn, max_turn);
        self.direction = heading_vector(current + turn);
    }

    /// Mirror the direction across `normal` (flat, unit).
    pub fn reflect(&mut self, normal: &Vec3) {
        let d = self.direction;
        let reflected = d - *normal * (2.0 * d.dot(normal));
        let flat = vec3(reflected.x, 0.0, reflected.z);
        let len = flat.norm();
        self.direction = if len > 1e-6 { flat / len } else { -d };
    }

    /// The ground hazard a spent bouncing projectile turns into.
    pub fn spent_hazard(&self, id: u32, position: Vec3) -> Hazard {
        Hazard {
            id,
            kind: self.kind,
            owner: self.owner,
            position,
            radius: self.radius.max(0.8),
            lifetime: self.lifetime.max(super::manager::SPENT_SHELL_LIFETIME),
            age: OWNER_GRACE,
            reusable: false,
            effect: self.effect,
            active: true,
        }
    }

    pub fn view(&self) -> ItemView {
        ItemView {
            id: self.id,
            kind: self.kind,
            position: [self.position.x, self.position.y, self.position.z],
            radius: self.radius,
            hazard: false,
        }
    }
}

impl Hazard {
    pub fn in_owner_grace(&self, vehicle: VehicleId) -> bool {
        vehicle == self.owner && self.age < OWNER_GRACE
    }

    pub fn view(&self) -> ItemView {
        ItemView {
            id: self.id,
            kind: self.kind,
            position: [self.position.x, self.position.y, self.position.z],
            radius: self.radius,
            hazard: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell() -> Projectile {
        Projectile {
            id: 1,
            kind: ItemKind::HomingShell,
            owner: VehicleId(0),
            position: Vec3::zeros(),
            direction: vec3(0.0, 0.0, 1.0),
            speed: 30.0,
            lifetime: 5.0,
            age: 0.0,
            target: None,
            bounces: 0,
            max_bounces: 0,
            radius: 0.8,
            effect: HitEffect::SpinOut,
            active: true,
        }
    }

    #[test]
    fn steering_is_rate_limited_and_unit() {
        let mut p = shell();
        // target directly to the right (-X)
        p.steer_toward(&vec3(-10.0, 0.0, 0.0), 0.1);
        assert!((p.direction.norm() - 1.0).abs() < 1e-5);
        let turned = p.heading().abs();
        assert!((turned - HOMING_TURN_RATE * 0.1).abs() < 1e-4, "turned {turned}");
    }

    #[test]
    fn reflect_flips_the_normal_component() {
        let mut p = shell();
        p.direction = vec3(1.0, 0.0, 1.0).normalize();
        p.reflect(&vec3(1.0, 0.0, 0.0));
        assert!(p.direction.x < 0.0);
        assert!(p.direction.z > 0.0);
        assert!((p.direction.norm() - 1.0).abs() < 1e-5);
    }
}
