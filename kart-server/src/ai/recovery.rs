// src/ai/recovery.rs
//
// Stuck detection and the scripted way out:
//   Normal → Recovering (reverse + turn, then forward + turn) → Normal

use crate::math::{planar_distance, Vec3};
use crate::vehicle::Command;

pub const STUCK_WINDOW: f32 = 1.5; // s
pub const STUCK_MIN_DISPLACEMENT: f32 = 1.5; // m over one window
pub const OFF_TRACK_LIMIT: f32 = 3.0; // s
pub const HARD_OFF_TRACK_FACTOR: f32 = 3.0; // × half width ⇒ snap
pub const RECOVERY_REVERSE: f32 = 0.8; // s
pub const RECOVERY_DURATION: f32 = 1.6; // s

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecoveryState {
    Normal,
    Recovering { elapsed: f32, turn: f32 },
}

/// Rolling-window displacement check while the throttle is held.
#[derive(Debug, Clone, Copy)]
pub struct StuckDetector {
    anchor: Vec3,
    elapsed: f32,
}

impl StuckDetector {
    pub fn new(position: Vec3) -> Self {
        Self {
            anchor: position,
            elapsed: 0.0,
        }
    }

    pub fn reset(&mut self, position: Vec3) {
        *self = Self::new(position);
    }

    /// True once a full window passed with the throttle held and almost no
    /// movement. Releasing the throttle restarts the window.
    pub fn observe(&mut self, position: &Vec3, throttle: bool, dt: f32) -> bool {
        if !throttle {
            self.reset(*position);
            return false;
        }
        self.elapsed += dt;
        if self.elapsed < STUCK_WINDOW {
            return false;
        }
        let moved = planar_distance(&self.anchor, position);
        self.reset(*position);
        moved < STUCK_MIN_DISPLACEMENT
    }
}

/// Scripted command for `elapsed` seconds into a recovery. `turn` is the way
/// the nose should end up turning (+1 left); reversing steers the other way.
pub fn recovery_command(elapsed: f32, turn: f32) -> Command {
    let reversing = elapsed < RECOVERY_REVERSE;
    let steer = if reversing { -turn } else { turn };
    Command {
        forward: !reversing,
        backward: reversing,
        left: steer > 0.0,
        right: steer < 0.0,
        ..Command::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::vec3;

    #[test]
    fn stuck_only_after_a_full_window() {
        let mut d = StuckDetector::new(Vec3::zeros());
        let p = vec3(0.2, 0.0, 0.0);
        let mut fired_at = None;
        for frame in 0..200 {
            if d.observe(&p, true, 1.0 / 60.0) {
                fired_at = Some(frame);
                break;
            }
        }
        let frame = fired_at.expect("should detect");
        assert!(frame as f32 / 60.0 >= STUCK_WINDOW - 0.05);
    }

    #[test]
    fn moving_kart_is_not_stuck() {
        let mut d = StuckDetector::new(Vec3::zeros());
        for frame in 0..300 {
            let p = vec3(0.0, 0.0, frame as f32 * 0.3);
            assert!(!d.observe(&p, true, 1.0 / 60.0));
        }
    }

    #[test]
    fn script_reverses_then_drives() {
        let early = recovery_command(0.1, 1.0);
        assert!(early.backward && early.right);
        let late = recovery_command(RECOVERY_REVERSE + 0.1, 1.0);
        assert!(late.forward && late.left);
    }
}
