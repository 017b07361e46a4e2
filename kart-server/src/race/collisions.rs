// src/race/collisions.rs
//
// Kart-vs-kart bumping: circles in the ground plane. Overlaps are split
// evenly along the contact normal. Closing speed is damped once, on the
// frame a contact begins; karts that stay pressed together are only pushed
// apart. A kart under invincibility spins out whoever it touches, through
// the normal hit gate.

use std::collections::HashSet;

use crate::math::{left_vector, planar_distance, vec3, Vec3};
use crate::vehicle::{HitEffect, Vehicle, VehicleId, VEHICLE_RADIUS};

const BUMP_SPEED_KEEP: f32 = 0.85; // share of speed kept when a closing contact begins

/// Remembers which pairs were touching last frame.
#[derive(Debug, Default)]
pub struct ContactTracker {
    touching: HashSet<(VehicleId, VehicleId)>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.touching.clear();
    }

    pub fn is_touching(&self, a: VehicleId, b: VehicleId) -> bool {
        self.touching.contains(&pair(a, b))
    }

    /// Resolve every overlapping pair once. Returns the number of contacts.
    pub fn resolve(&mut self, vehicles: &mut [Vehicle]) -> usize {
        let mut now = HashSet::new();
        for i in 0..vehicles.len() {
            for j in (i + 1)..vehicles.len() {
                let (head, tail) = vehicles.split_at_mut(j);
                let (a, b) = (&mut head[i], &mut tail[0]);
                let key = pair(a.id, b.id);
                if bump(a, b, !self.touching.contains(&key)) {
                    now.insert(key);
                }
            }
        }
        let contacts = now.len();
        self.touching = now;
        contacts
    }
}

fn pair(a: VehicleId, b: VehicleId) -> (VehicleId, VehicleId) {
    if a <= b { (a, b) } else { (b, a) }
}

fn bump(a: &mut Vehicle, b: &mut Vehicle, new_contact: bool) -> bool {
    if a.airborne || b.airborne {
        return false;
    }
    let distance = planar_distance(&a.position, &b.position);
    let overlap = 2.0 * VEHICLE_RADIUS - distance;
    if overlap <= 0.0 {
        return false;
    }

    // 1) contact normal from a to b
    let normal = if distance > 1e-4 {
        vec3(b.position.x - a.position.x, 0.0, b.position.z - a.position.z) / distance
    } else {
        left_vector(a.heading)
    };

    // 2) separate
    a.position -= normal * (overlap * 0.5);
    b.position += normal * (overlap * 0.5);

    // 3) damp closing speed on impact
    let closing = (velocity(a) - velocity(b)).dot(&normal);
    if new_contact && closing > 0.0 {
        a.speed *= BUMP_SPEED_KEEP;
        b.speed *= BUMP_SPEED_KEEP;
    }

    // 4) star contact
    match (a.status.is_invincible(), b.status.is_invincible()) {
        (true, false) => {
            b.apply_hit(HitEffect::SpinOut);
        }
        (false, true) => {
            a.apply_hit(HitEffect::SpinOut);
        }
        _ => {}
    }
    true
}

fn velocity(v: &Vehicle) -> Vec3 {
    v.forward() * v.speed
}
