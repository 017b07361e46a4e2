// src/items/manager.rs
//
// Owns every live projectile and ground hazard. One `update` per frame:
//   1) age + move projectiles (homing steer, wall bounce, spent → hazard)
//   2) age hazards
//   3) resolve contacts against every kart
//   4) drop whatever is dead, in the same pass

use crate::math::{planar_distance, vec3};
use crate::track::TrackQuery;
use crate::vehicle::status::STAR_DURATION;
use crate::vehicle::{HitEffect, HitOutcome, Vehicle, VehicleId, VEHICLE_RADIUS};

use super::projectile::{Hazard, ItemView, Projectile};
use super::{Deployment, InstantEffect, ItemKind, Motion};

pub const SPENT_SHELL_LIFETIME: f32 = 20.0; // s
const SPAWN_CLEARANCE: f32 = 0.6; // m between kart and item at spawn
const MUSHROOM_BOOST: (f32, f32) = (1.2, 1.4); // (s, multiplier)
const STAR_SPEED_MULTIPLIER: f32 = 1.2;

#[derive(Debug, Default)]
pub struct ItemManager {
    projectiles: Vec<Projectile>,
    hazards: Vec<Hazard>,
    next_id: u32,
}

fn take_id(next_id: &mut u32) -> u32 {
    let id = *next_id;
    *next_id = next_id.wrapping_add(1);
    id
}

impl ItemManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    pub fn views(&self) -> Vec<ItemView> {
        self.projectiles
            .iter()
            .map(Projectile::view)
            .chain(self.hazards.iter().map(Hazard::view))
            .collect()
    }

    /// Remove everything (race restart).
    pub fn clear(&mut self) {
        self.projectiles.clear();
        self.hazards.clear();
    }

    /// Deploy `kind` for `user`. Returns false when the user is unknown.
    pub fn use_item(&mut self, user: VehicleId, kind: ItemKind, vehicles: &mut [Vehicle]) -> bool {
        let Some(index) = vehicles.iter().position(|v| v.id == user) else {
            tracing::debug!(kart = %user, ?kind, "item use by unknown kart ignored");
            return false;
        };
        let spec = kind.spec();

        match spec.deployment {
            Deployment::Projectile { motion, speed, lifetime, radius, max_bounces } => {
                let target = match motion {
                    Motion::Homing => acquire_target(vehicles, index),
                    Motion::Straight => None,
                };
                let v = &vehicles[index];
                let direction = v.forward();
                let projectile = Projectile {
                    id: take_id(&mut self.next_id),
                    kind,
                    owner: user,
                    position: v.position + direction * (VEHICLE_RADIUS + radius + SPAWN_CLEARANCE),
                    direction,
                    speed: speed + v.speed.max(0.0),
                    lifetime,
                    age: 0.0,
                    target,
                    bounces: 0,
                    max_bounces,
                    radius,
                    effect: spec.effect,
                    active: true,
                };
                tracing::debug!(kart = %user, ?kind, target = ?target, "projectile fired");
                self.projectiles.push(projectile);
            }
            Deployment::Hazard { reusable, lifetime, radius } => {
                let v = &vehicles[index];
                let hazard = Hazard {
                    id: take_id(&mut self.next_id),
                    kind,
                    owner: user,
                    position: v.position - v.forward() * (VEHICLE_RADIUS + radius + SPAWN_CLEARANCE),
                    radius,
                    lifetime,
                    age: 0.0,
                    reusable,
                    effect: spec.effect,
                    active: true,
                };
                tracing::debug!(kart = %user, ?kind, "hazard dropped");
                self.hazards.push(hazard);
            }
            Deployment::Instant(effect) => {
                apply_instant(effect, index, vehicles, spec.effect);
                tracing::debug!(kart = %user, ?kind, "instant item");
            }
        }
        true
    }

    pub fn update(&mut self, vehicles: &mut [Vehicle], track: Option<&dyn TrackQuery>, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let Self { projectiles, hazards, next_id } = self;

        // 1) Projectiles: age, steer, move, bounce
        for p in projectiles.iter_mut() {
            p.age += dt;
            p.lifetime -= dt;
            if p.lifetime <= 0.0 {
                p.active = false;
                continue;
            }

            if let Some(target) = p.target {
                match vehicles.iter().find(|v| v.id == target) {
                    Some(v) => p.steer_toward(&v.position, dt),
                    None => {
                        tracing::debug!(item = p.id, "homing target gone, flying straight");
                        p.target = None;
                    }
                }
            }

            let previous = p.position;
            p.position += p.direction * (p.speed * dt);

            if p.target.is_some() || p.max_bounces == 0 {
                continue;
            }
            // no track surface: walls are never reached
            let Some(track) = track else {
                continue;
            };
            if track.is_on_track(p.position.x, p.position.z) {
                continue;
            }

            if p.bounces < p.max_bounces {
                let center = track.nearest_centerline_point(previous.x, previous.z);
                let outward = vec3(previous.x - center.x, 0.0, previous.z - center.z);
                let normal = if outward.norm() > 1e-4 { outward.normalize() } else { -p.direction };
                p.reflect(&normal);
                p.position = previous;
                p.bounces += 1;
            } else {
                let hazard = p.spent_hazard(take_id(next_id), previous);
                tracing::debug!(item = p.id, hazard = hazard.id, "spent shell left on the track");
                hazards.push(hazard);
                p.active = false;
            }
        }

        // 2) Hazards: age
        for h in hazards.iter_mut() {
            h.age += dt;
            h.lifetime -= dt;
            if h.lifetime <= 0.0 {
                h.active = false;
            }
        }

        // 3) Contacts
        // a projectile takes out the closest overlapping kart only
        for p in projectiles.iter_mut().filter(|p| p.active) {
            let nearest = vehicles
                .iter()
                .enumerate()
                .filter(|(_, v)| !p.in_owner_grace(v.id))
                .map(|(i, v)| (i, planar_distance(&p.position, &v.position)))
                .filter(|&(_, d)| d < p.radius + VEHICLE_RADIUS)
                .min_by(|a, b| a.1.total_cmp(&b.1));
            let Some((index, _)) = nearest else {
                continue;
            };
            let v = &mut vehicles[index];
            let outcome = v.apply_hit(p.effect);
            tracing::debug!(item = p.id, kind = ?p.kind, victim = %v.id, ?outcome, "projectile hit");
            p.active = false;
        }

        for h in hazards.iter_mut().filter(|h| h.active) {
            for v in vehicles.iter_mut() {
                if v.airborne || h.in_owner_grace(v.id) {
                    continue;
                }
                if planar_distance(&h.position, &v.position) >= h.radius + VEHICLE_RADIUS {
                    continue;
                }
                let outcome = v.apply_hit(h.effect);
                if outcome != HitOutcome::Ignored {
                    tracing::debug!(item = h.id, kind = ?h.kind, victim = %v.id, ?outcome, "hazard hit");
                }
                if !h.reusable && outcome != HitOutcome::Ignored {
                    h.active = false;
                    break;
                }
            }
        }

        // 4) Sweep
        projectiles.retain(|p| p.active && p.lifetime > 0.0);
        hazards.retain(|h| h.active && h.lifetime > 0.0);
    }
}

/// Nearest rival ahead in the race, else the nearest rival anywhere.
fn acquire_target(vehicles: &[Vehicle], user_index: usize) -> Option<VehicleId> {
    let user = &vehicles[user_index];
    let nearest = |ahead_only: bool| {
        vehicles
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != user_index)
            .map(|(_, v)| v)
            .filter(|v| !v.progress.finished)
            .filter(|v| !ahead_only || v.progress.total() > user.progress.total())
            .min_by(|a, b| {
                planar_distance(&a.position, &user.position)
                    .total_cmp(&planar_distance(&b.position, &user.position))
            })
            .map(|v| v.id)
    };
    nearest(true).or_else(|| nearest(false))
}

fn apply_instant(effect: InstantEffect, index: usize, vehicles: &mut [Vehicle], hit: HitEffect) {
    match effect {
        InstantEffect::SpeedBoost => vehicles[index].apply_boost(MUSHROOM_BOOST.0, MUSHROOM_BOOST.1),
        InstantEffect::Star => {
            let v = &mut vehicles[index];
            v.grant_invincibility(STAR_DURATION);
            v.apply_boost(STAR_DURATION, STAR_SPEED_MULTIPLIER);
        }
        InstantEffect::Shield => vehicles[index].grant_shield(),
        InstantEffect::Lightning | InstantEffect::Blizzard => {
            for (i, rival) in vehicles.iter_mut().enumerate() {
                if i == index || rival.progress.finished {
                    continue;
                }
                let outcome = rival.apply_hit(hit);
                tracing::debug!(victim = %rival.id, ?effect, ?outcome, "global item");
            }
        }
        InstantEffect::Swap => swap_with_rank_ahead(vehicles, index),
    }
}

fn swap_with_rank_ahead(vehicles: &mut [Vehicle], index: usize) {
    let rank = vehicles[index].progress.race_position;
    if rank <= 1 {
        return;
    }
    let Some(other) = vehicles
        .iter()
        .position(|v| v.progress.race_position == rank - 1 && !v.progress.finished)
    else {
        return;
    };
    if other == index {
        return;
    }

    let (a, b) = if index < other {
        let (left, right) = vehicles.split_at_mut(other);
        (&mut left[index], &mut right[0])
    } else {
        let (left, right) = vehicles.split_at_mut(index);
        (&mut right[0], &mut left[other])
    };

    std::mem::swap(&mut a.position, &mut b.position);
    std::mem::swap(&mut a.last_valid_position, &mut b.last_valid_position);
    std::mem::swap(&mut a.heading, &mut b.heading);
    std::mem::swap(&mut a.progress.fraction, &mut b.progress.fraction);
    std::mem::swap(&mut a.progress.last_checkpoint, &mut b.progress.last_checkpoint);
    std::mem::swap(&mut a.progress.left_grid, &mut b.progress.left_grid);
    tracing::debug!(kart = %a.id, with = %b.id, "positions swapped");
}
