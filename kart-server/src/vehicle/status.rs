// src/vehicle/status.rs
//
// Timed status effects and the single gate every hit passes through.
//
// Speed penalties (freeze, burn, shrink) stash the pre-penalty max speed once
// and schedule a restore entry. When the last entry expires the stash is
// written back verbatim; while others remain the max speed is the stash times
// the remaining factors. Re-applying a penalty that is already running is
// rejected, so a hit can never compound its own factor.

use serde::Serialize;

use super::Vehicle;

pub const SPIN_OUT_DURATION: f32 = 1.5; // s
pub const HIT_GRACE_DURATION: f32 = 2.0; // s, post-hit invulnerability
pub const SHIELD_BREAK_GRACE: f32 = 0.5; // s
pub const SHIELD_DURATION: f32 = 10.0; // s
pub const STAR_DURATION: f32 = 6.0; // s

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HitEffect {
    SpinOut,
    Freeze,
    Burn,
    /// Spin-out plus shrink, applied as one gated hit.
    Lightning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    Applied,
    ShieldBroken,
    /// Star invincibility.
    Blocked,
    /// Post-hit grace, or the effect is already running.
    Ignored,
}

impl HitOutcome {
    /// True when the hit was absorbed by the target (applied or shield popped).
    pub fn connected(self) -> bool {
        matches!(self, Self::Applied | Self::ShieldBroken)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedPenalty {
    Freeze,
    Burn,
    Shrink,
}

impl SpeedPenalty {
    pub fn factor(self) -> f32 {
        match self {
            Self::Freeze => 0.3,
            Self::Burn => 0.7,
            Self::Shrink => 0.75,
        }
    }

    pub fn duration(self) -> f32 {
        match self {
            Self::Freeze => 2.0,
            Self::Burn => 3.0,
            Self::Shrink => 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingRestore {
    pub penalty: SpeedPenalty,
    pub remaining: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusEffects {
    pub spin_out: f32,
    pub shielded: f32,
    pub invincible: f32,
    pub hit_grace: f32,
    pub speed_stash: Option<f32>,
    pub pending: Vec<PendingRestore>,
}

impl StatusEffects {
    pub fn is_spun_out(&self) -> bool {
        self.spin_out > 0.0
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible > 0.0
    }

    pub fn is_shielded(&self) -> bool {
        self.shielded > 0.0
    }

    pub fn has_penalty(&self, penalty: SpeedPenalty) -> bool {
        self.pending.iter().any(|p| p.penalty == penalty)
    }

    pub fn is_frozen(&self) -> bool {
        self.has_penalty(SpeedPenalty::Freeze)
    }

    /// Still recovering from a hit; projectiles pass through.
    pub fn in_grace(&self) -> bool {
        self.hit_grace > 0.0
    }

    fn penalty_factor(&self) -> f32 {
        self.pending.iter().map(|p| p.penalty.factor()).product()
    }
}

fn tick_timer(timer: &mut f32, dt: f32) {
    *timer = (*timer - dt).max(0.0);
}

impl Vehicle {
    /// Route a hit through invincibility, grace, and shield before applying it.
    pub fn apply_hit(&mut self, effect: HitEffect) -> HitOutcome {
        if self.status.is_invincible() {
            return HitOutcome::Blocked;
        }
        if self.status.in_grace() {
            return HitOutcome::Ignored;
        }
        if self.status.is_shielded() {
            self.status.shielded = 0.0;
            self.status.hit_grace = SHIELD_BREAK_GRACE;
            tracing::debug!(kart = %self.id, ?effect, "shield absorbed hit");
            return HitOutcome::ShieldBroken;
        }

        let applied = match effect {
            HitEffect::SpinOut => self.spin_out(),
            HitEffect::Freeze => self.add_penalty(SpeedPenalty::Freeze),
            HitEffect::Burn => self.add_penalty(SpeedPenalty::Burn),
            HitEffect::Lightning => {
                let spun = self.spin_out();
                let shrunk = self.add_penalty(SpeedPenalty::Shrink);
                spun || shrunk
            }
        };
        if !applied {
            return HitOutcome::Ignored;
        }

        self.status.hit_grace = HIT_GRACE_DURATION;
        self.drift.end();
        self.clamp_speed();
        tracing::debug!(kart = %self.id, ?effect, "hit applied");
        HitOutcome::Applied
    }

    pub fn grant_shield(&mut self) {
        self.status.shielded = SHIELD_DURATION;
    }

    pub fn grant_invincibility(&mut self, duration: f32) {
        self.status.invincible = self.status.invincible.max(duration);
    }

    fn spin_out(&mut self) -> bool {
        if self.status.is_spun_out() {
            return false;
        }
        self.status.spin_out = SPIN_OUT_DURATION;
        self.boost = super::BoostState::default();
        true
    }

    fn add_penalty(&mut self, penalty: SpeedPenalty) -> bool {
        if self.status.has_penalty(penalty) {
            return false;
        }
        if self.status.speed_stash.is_none() {
            self.status.speed_stash = Some(self.max_speed);
        }
        self.status.pending.push(PendingRestore {
            penalty,
            remaining: penalty.duration(),
        });
        self.recompute_max_speed();
        true
    }

    fn recompute_max_speed(&mut self) {
        let Some(stash) = self.status.speed_stash else {
            return;
        };
        if self.status.pending.is_empty() {
            self.max_speed = stash;
            self.status.speed_stash = None;
        } else {
            self.max_speed = stash * self.status.penalty_factor();
        }
        self.clamp_speed();
    }

    /// Count down every timer and run due restores.
    pub fn tick_status(&mut self, dt: f32) {
        let s = &mut self.status;
        tick_timer(&mut s.spin_out, dt);
        tick_timer(&mut s.shielded, dt);
        tick_timer(&mut s.invincible, dt);
        tick_timer(&mut s.hit_grace, dt);

        if s.pending.is_empty() {
            return;
        }
        let before = s.pending.len();
        for entry in s.pending.iter_mut() {
            entry.remaining -= dt;
        }
        s.pending.retain(|entry| entry.remaining > 0.0);
        if s.pending.len() != before {
            self.recompute_max_speed();
            tracing::debug!(kart = %self.id, max_speed = self.max_speed, "speed penalty expired");
        }
    }

    /// Drop every effect and put the max speed back where it was.
    pub fn clear_status(&mut self) {
        if let Some(stash) = self.status.speed_stash {
            self.max_speed = stash;
        }
        self.status = StatusEffects::default();
    }
}
