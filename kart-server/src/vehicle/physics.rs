// src/vehicle/physics.rs
//
// Per-frame kart integration. Kinematic: no rigid bodies, the kart is a
// point with heading, forward speed, lateral slide and a vertical channel
// for ramps. Course effects arrive as `PhysicsModifiers` resolved by the race
// loop at the kart's position.

use crate::math::{
    bearing, heading_vector, is_finite_vec, left_vector, move_toward, planar_distance, smoothing,
    wrap_angle, Vec3,
};
use crate::track::PhysicsModifiers;

use super::drift::DRIFT_MIN_SPEED;
use super::{Command, HazardTouch, HitEffect, Vehicle};

pub const MAX_FRAME_DT: f32 = 0.05; // s

const ENGINE_RESPONSE: f32 = 6.0; // 1/s, eases engine power toward its target
const REVERSE_POWER: f32 = -0.5;
const BRAKE_SPEED_EPS: f32 = 0.5; // m/s, below this "backward" means reverse

// steering
const STEER_FULL_SPEED: f32 = 6.0; // m/s, full steering authority above this
const HIGH_SPEED_STEER_FLOOR: f32 = 0.65;
const DRIFT_AUTO_TURN: f32 = 0.6;
const DRIFT_PLAYER_TURN: f32 = 0.45;
const AIR_CONTROL: f32 = 0.35;

// lateral slide
const DRIFT_SLIDE_FACTOR: f32 = 0.25;
const DRIFT_SLIDE_RESPONSE: f32 = 5.0; // 1/s
const LATERAL_GRIP: f32 = 8.0; // 1/s
const ICE_SLIDE: f32 = 0.12;

// terrain
const OFF_ROAD_CAP_FACTOR: f32 = 0.5;
const OFF_ROAD_CAP_LINGER: f32 = 0.3; // s
const HAZARD_TOUCH_EXPIRY: f32 = 1.0; // s
const LAVA_PUSHBACK: f32 = 0.5;
const BOOST_PAD: (f32, f32) = (0.8, 1.3); // (duration s, multiplier)
const RAMP_MIN_SPEED: f32 = 5.0; // m/s
const RAMP_LAUNCH: f32 = 7.0; // m/s upward at full speed
const GRAVITY: f32 = 20.0; // m/s^2, arcade

// spin-out / frozen
const SPIN_RATE: f32 = 8.0; // rad/s
const SPIN_DECAY: f32 = 2.5; // 1/s
const FROZEN_DECEL: f32 = 20.0; // m/s^2

// safety
const MAX_FRAME_DISPLACEMENT: f32 = 3.0; // m
pub const WORLD_LIMIT: f32 = 2_000.0; // m from the origin

/// Advance one kart by `dt` seconds.
pub fn advance(vehicle: &mut Vehicle, command: &Command, dt: f32, modifiers: &PhysicsModifiers) {
    let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
    if dt <= 0.0 {
        return;
    }

    vehicle.command = *command;
    vehicle.surface_top_speed = if modifiers.top_speed.is_finite() {
        modifiers.top_speed.max(0.0)
    } else {
        1.0
    };

    // 1) Timers
    vehicle.tick_status(dt);
    vehicle.boost.tick(dt);
    if let Some(touch) = vehicle.last_hazard_touched.as_mut() {
        touch.expires_in -= dt;
        if touch.expires_in <= 0.0 {
            vehicle.last_hazard_touched = None;
        }
    }

    // 2) Course zones act before friction
    apply_surface_zones(vehicle, modifiers);

    // 3) Drive, or ride out a spin/freeze
    if vehicle.status.is_spun_out() {
        if vehicle.drift.active {
            vehicle.drift.end();
        }
        vehicle.heading = wrap_angle(vehicle.heading + SPIN_RATE * dt);
        vehicle.speed *= (-SPIN_DECAY * dt).exp();
        vehicle.lateral_velocity *= (-SPIN_DECAY * dt).exp();
        vehicle.engine_power = 0.0;
    } else if vehicle.status.is_frozen() {
        if vehicle.drift.active {
            vehicle.drift.end();
        }
        vehicle.speed = move_toward(vehicle.speed, 0.0, FROZEN_DECEL * dt);
        vehicle.lateral_velocity = move_toward(vehicle.lateral_velocity, 0.0, FROZEN_DECEL * dt);
        vehicle.engine_power = 0.0;
    } else {
        drive(vehicle, command, dt, modifiers);
    }

    // 4) Terrain losses
    apply_friction(vehicle, dt, modifiers);

    // 5) Integrate position, with the safety net
    integrate(vehicle, dt, modifiers);
    vehicle.clamp_speed();
}

fn touched_recently(vehicle: &Vehicle, zone: usize) -> bool {
    vehicle
        .last_hazard_touched
        .is_some_and(|touch| touch.zone == zone && touch.expires_in > 0.0)
}

fn apply_surface_zones(vehicle: &mut Vehicle, modifiers: &PhysicsModifiers) {
    let Some(zone) = modifiers.zone else {
        return;
    };
    if vehicle.airborne || touched_recently(vehicle, zone) {
        return;
    }

    if modifiers.on_lava {
        vehicle.last_hazard_touched = Some(HazardTouch {
            zone,
            expires_in: HAZARD_TOUCH_EXPIRY,
        });
        if vehicle.apply_hit(HitEffect::SpinOut).connected() {
            vehicle.speed = -vehicle.speed.abs() * LAVA_PUSHBACK;
            tracing::debug!(kart = %vehicle.id, zone, "lava");
        }
    } else if modifiers.boost_pad {
        vehicle.last_hazard_touched = Some(HazardTouch {
            zone,
            expires_in: HAZARD_TOUCH_EXPIRY,
        });
        vehicle.apply_boost(BOOST_PAD.0, BOOST_PAD.1);
    } else if modifiers.ramp && vehicle.speed > RAMP_MIN_SPEED {
        vehicle.last_hazard_touched = Some(HazardTouch {
            zone,
            expires_in: HAZARD_TOUCH_EXPIRY,
        });
        let ratio = (vehicle.speed / vehicle.stats.max_speed.max(1.0)).min(1.0);
        vehicle.vertical_velocity = RAMP_LAUNCH * ratio;
        vehicle.airborne = true;
    }
}

/// Acceleration falls off as the kart nears its cap.
fn acceleration_curve(speed_ratio: f32) -> f32 {
    let r = speed_ratio.clamp(0.0, 1.0);
    (1.0 - r * r).max(0.0)
}

fn drive(vehicle: &mut Vehicle, command: &Command, dt: f32, modifiers: &PhysicsModifiers) {
    //---------------------------------------------------------------------------------
    //-- ENGINE: eased power, curve toward the cap ------------------------------------
    //---------------------------------------------------------------------------------
    let target_power = match (command.forward, command.backward) {
        (true, false) => 1.0,
        (false, true) if vehicle.speed > BRAKE_SPEED_EPS => -1.0,
        (false, true) => REVERSE_POWER,
        _ => 0.0,
    };
    vehicle.engine_power += (target_power - vehicle.engine_power) * smoothing(ENGINE_RESPONSE, dt);
    let power = vehicle.engine_power;

    if power > 0.0 && vehicle.speed >= 0.0 {
        let cap = vehicle.effective_max_speed().max(1e-3);
        vehicle.speed += vehicle.stats.acceleration * power * acceleration_curve(vehicle.speed / cap) * dt;
    } else if power < 0.0 && vehicle.speed > 0.0 {
        let brake = vehicle.stats.brake_strength * modifiers.brake_efficiency.clamp(0.0, 1.0);
        vehicle.speed = (vehicle.speed + brake * power * dt).max(0.0);
    } else if power < 0.0 {
        let cap = (-vehicle.reverse_limit()).max(1e-3);
        vehicle.speed += vehicle.stats.acceleration * power * acceleration_curve(vehicle.speed.abs() / cap) * dt;
    } else if power > 0.0 {
        // forward throttle while still rolling backward
        let brake = vehicle.stats.brake_strength * modifiers.brake_efficiency.clamp(0.0, 1.0);
        vehicle.speed = (vehicle.speed + brake * power * dt).min(0.0);
    } else {
        vehicle.speed = move_toward(vehicle.speed, 0.0, vehicle.stats.deceleration * dt);
    }

    //---------------------------------------------------------------------------------
    //-- DRIFT: start on drift+turn, release on button up or low speed ----------------
    //---------------------------------------------------------------------------------
    let turn = command.steer_axis();
    if vehicle.drift.active {
        let too_slow = vehicle.speed.abs() < DRIFT_MIN_SPEED * 0.5;
        if !command.drift || too_slow {
            vehicle.end_drift();
        } else {
            vehicle.drift.tick(dt);
        }
    } else if command.drift && turn != 0.0 {
        vehicle.start_drift(turn);
    }

    //---------------------------------------------------------------------------------
    //-- STEERING: speed-sensitive, blended while drifting ----------------------------
    //---------------------------------------------------------------------------------
    let steer = if vehicle.drift.active {
        vehicle.drift.direction * DRIFT_AUTO_TURN + turn * DRIFT_PLAYER_TURN
    } else {
        turn
    };
    let speed = vehicle.speed.abs();
    let low_speed = (speed / STEER_FULL_SPEED).min(1.0);
    let high_speed = (1.0 - speed / (vehicle.stats.max_speed * 2.5).max(1.0)).clamp(HIGH_SPEED_STEER_FLOOR, 1.0);
    let grip = 0.5 + 0.5 * modifiers.turn_grip.clamp(0.0, 1.0);
    let air = if vehicle.airborne { AIR_CONTROL } else { 1.0 };
    let direction = if vehicle.speed < 0.0 { -1.0 } else { 1.0 };
    vehicle.heading = wrap_angle(
        vehicle.heading + steer * vehicle.stats.turn_rate * low_speed * high_speed * grip * air * direction * dt,
    );

    //---------------------------------------------------------------------------------
    //-- LATERAL: drift slides outward, otherwise grip bleeds slide away --------------
    //---------------------------------------------------------------------------------
    if vehicle.drift.active {
        let target = -vehicle.drift.direction * speed * DRIFT_SLIDE_FACTOR;
        vehicle.lateral_velocity += (target - vehicle.lateral_velocity) * smoothing(DRIFT_SLIDE_RESPONSE, dt);
    } else {
        if modifiers.on_ice && turn != 0.0 {
            vehicle.lateral_velocity -= turn * speed * ICE_SLIDE * (1.0 - modifiers.turn_grip) * dt;
        }
        vehicle.lateral_velocity *= (-LATERAL_GRIP * modifiers.turn_grip.max(0.05) * dt).exp();
    }
}

fn apply_friction(vehicle: &mut Vehicle, dt: f32, modifiers: &PhysicsModifiers) {
    if vehicle.airborne {
        return;
    }
    let rolling = vehicle.stats.friction * modifiers.friction.max(0.0);
    vehicle.speed *= (1.0 - rolling * dt).max(0.0);

    if modifiers.off_road {
        vehicle.speed *= (1.0 - vehicle.stats.grass_friction * dt).max(0.0);
        if vehicle.is_human {
            vehicle.off_road_cap_timer = OFF_ROAD_CAP_LINGER;
        }
    } else {
        vehicle.off_road_cap_timer = (vehicle.off_road_cap_timer - dt).max(0.0);
    }

    if vehicle.is_human && vehicle.off_road_cap_timer > 0.0 {
        let cap = vehicle.max_speed * OFF_ROAD_CAP_FACTOR;
        vehicle.speed = vehicle.speed.min(cap);
    }
}

fn integrate(vehicle: &mut Vehicle, dt: f32, modifiers: &PhysicsModifiers) {
    let forward = heading_vector(vehicle.heading);
    let left = left_vector(vehicle.heading);

    let mut delta = (forward * vehicle.speed + left * vehicle.lateral_velocity) * dt;
    delta.y = 0.0;
    let len = delta.norm();
    if len > MAX_FRAME_DISPLACEMENT {
        delta *= MAX_FRAME_DISPLACEMENT / len;
    }

    let mut next = vehicle.position + delta;
    let ground = if modifiers.ground_height.is_finite() { modifiers.ground_height } else { 0.0 };
    if vehicle.airborne {
        vehicle.vertical_velocity -= GRAVITY * dt;
        next.y += vehicle.vertical_velocity * dt;
        if next.y <= ground {
            next.y = ground;
            vehicle.vertical_velocity = 0.0;
            vehicle.airborne = false;
        }
    } else {
        next.y = ground;
    }

    let bad = !is_finite_vec(&next)
        || !vehicle.speed.is_finite()
        || !vehicle.lateral_velocity.is_finite()
        || !vehicle.heading.is_finite();

    if bad {
        tracing::warn!(kart = %vehicle.id, "non-finite kinematics, rolling back to last valid position");
        vehicle.position = vehicle.last_valid_position;
        vehicle.heading = wrap_angle(vehicle.heading);
        stop(vehicle);
        return;
    }

    if planar_distance(&next, &Vec3::zeros()) > WORLD_LIMIT {
        let back = if planar_distance(&vehicle.last_valid_position, &Vec3::zeros()) <= WORLD_LIMIT {
            vehicle.last_valid_position
        } else {
            Vec3::zeros()
        };
        tracing::warn!(kart = %vehicle.id, x = next.x, z = next.z, "left the world, snapping back");
        vehicle.position = back;
        vehicle.heading = bearing(&back, &Vec3::zeros());
        stop(vehicle);
        return;
    }

    vehicle.position = next;
    vehicle.last_valid_position = next;
}

fn stop(vehicle: &mut Vehicle) {
    vehicle.speed = 0.0;
    vehicle.lateral_velocity = 0.0;
    vehicle.vertical_velocity = 0.0;
    vehicle.engine_power = 0.0;
    vehicle.airborne = false;
}
