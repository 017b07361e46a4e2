// src/vehicle/drift.rs
//
// Drift charge and boost timers. A drift accumulates time, crosses level
// thresholds, and on release the reached level maps to a boost tier.

/// Minimum |speed| to start (and, halved, to keep) a drift.
pub const DRIFT_MIN_SPEED: f32 = 8.0; // m/s

/// Seconds of continuous drifting needed for levels 1, 2 and 3.
pub const DRIFT_LEVEL_TIMES: [f32; 3] = [0.6, 1.3, 2.2];

/// (duration s, top-speed multiplier) per drift level 1..=3.
pub const BOOST_TIERS: [(f32, f32); 3] = [(0.6, 1.15), (1.0, 1.25), (1.5, 1.35)];

/// Fraction of the gap to the new cap closed instantly when a boost lands.
pub const BOOST_SPEED_KICK: f32 = 0.35;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriftState {
    pub active: bool,
    pub direction: f32, // +1 left, -1 right
    pub time: f32,
    pub level: u8, // 0..=3, never decreases within one drift
}

impl DriftState {
    /// Returns false when a drift is already running.
    pub fn start(&mut self, direction: f32) -> bool {
        if self.active {
            return false;
        }
        *self = Self {
            active: true,
            direction: direction.signum(),
            time: 0.0,
            level: 0,
        };
        true
    }

    pub fn tick(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        self.time += dt;
        self.level = self.level.max(level_for_time(self.time));
    }

    /// Stop drifting; returns the level reached (0 when no drift was running).
    pub fn end(&mut self) -> u8 {
        let level = if self.active { self.level } else { 0 };
        *self = Self::default();
        level
    }
}

pub fn level_for_time(time: f32) -> u8 {
    DRIFT_LEVEL_TIMES.iter().filter(|&&t| time >= t).count() as u8
}

pub fn boost_tier(level: u8) -> Option<(f32, f32)> {
    match level {
        1..=3 => Some(BOOST_TIERS[level as usize - 1]),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostState {
    pub time: f32,       // s remaining
    pub multiplier: f32, // 1.0 when idle
}

impl Default for BoostState {
    fn default() -> Self {
        Self {
            time: 0.0,
            multiplier: 1.0,
        }
    }
}

impl BoostState {
    pub fn is_active(&self) -> bool {
        self.time > 0.0
    }

    pub fn combine(&mut self, duration: f32, multiplier: f32) {
        if !(duration > 0.0) || !multiplier.is_finite() {
            return;
        }
        self.time = self.time.max(duration);
        self.multiplier = self.multiplier.max(multiplier);
    }

    pub fn tick(&mut self, dt: f32) {
        if self.time <= 0.0 {
            return;
        }
        self.time -= dt;
        if self.time <= 0.0 {
            *self = Self::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_follow_thresholds() {
        assert_eq!(level_for_time(0.0), 0);
        assert_eq!(level_for_time(0.6), 1);
        assert_eq!(level_for_time(1.5), 2);
        assert_eq!(level_for_time(10.0), 3);
    }

    #[test]
    fn repeated_start_is_ignored() {
        let mut drift = DriftState::default();
        assert!(drift.start(1.0));
        drift.tick(0.7);
        assert!(!drift.start(-1.0));
        assert_eq!(drift.direction, 1.0);
        assert_eq!(drift.level, 1);
    }

    #[test]
    fn level_is_monotonic_within_a_drift() {
        let mut drift = DriftState::default();
        drift.start(-1.0);
        let mut last = 0;
        for _ in 0..200 {
            drift.tick(1.0 / 60.0);
            assert!(drift.level >= last);
            last = drift.level;
        }
        assert_eq!(drift.end(), 3);
        assert!(!drift.active);
        assert_eq!(drift.end(), 0);
    }

    #[test]
    fn boost_expires_back_to_neutral() {
        let mut boost = BoostState::default();
        boost.combine(0.5, 1.2);
        boost.tick(0.3);
        assert!(boost.is_active());
        boost.tick(0.3);
        assert_eq!(boost, BoostState::default());
    }

    #[test]
    fn level_zero_grants_nothing() {
        assert!(boost_tier(0).is_none());
        assert_eq!(boost_tier(3), Some(BOOST_TIERS[2]));
    }
}
