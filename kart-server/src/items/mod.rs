// ==============================================================================
// items — ITEM KINDS, PROJECTILES, HAZARDS, ITEM BOXES
// ------------------------------------------------------------------------------
// A closed enum of item kinds and one table (`ItemKind::spec`) that says how
// each kind deploys, moves and what it does on contact. The manager never
// branches on names; it reads the table.
//
// Sub-modules:
// - projectile.rs : live projectile / ground hazard records + motion helpers
// - manager.rs    : use_item / update / clear
// - item_box.rs   : respawning boxes + rank-weighted draws
// ==============================================================================

pub mod item_box;
pub mod manager;
pub mod projectile;

use serde::{Deserialize, Serialize};

use crate::vehicle::HitEffect;

pub use item_box::{draw_item, ItemBox, ItemBoxes};
pub use manager::ItemManager;
pub use projectile::{Hazard, ItemView, Projectile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Shell,
    HomingShell,
    IceShell,
    Fireball,
    Banana,
    OilSlick,
    Shield,
    Mushroom,
    Star,
    Lightning,
    Swap,
    Blizzard,
}

/// How the AI reasons about a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemCategory {
    Offense,
    Homing,
    Defense,
    CatchUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Straight,
    Homing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstantEffect {
    SpeedBoost,
    Star,
    Lightning,
    Swap,
    Blizzard,
    Shield,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Deployment {
    /// Fired ahead of the user.
    Projectile {
        motion: Motion,
        speed: f32,    // m/s on top of the user's forward speed
        lifetime: f32, // s
        radius: f32,   // m
        max_bounces: u32,
    },
    /// Dropped behind the user, at rest.
    Hazard {
        reusable: bool,
        lifetime: f32,
        radius: f32,
    },
    /// Applied on use; nothing is spawned.
    Instant(InstantEffect),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemSpec {
    pub category: ItemCategory,
    pub deployment: Deployment,
    pub effect: HitEffect, // contact effect for projectiles and hazards
}

impl ItemKind {
    pub const ALL: [ItemKind; 12] = [
        ItemKind::Shell,
        ItemKind::HomingShell,
        ItemKind::IceShell,
        ItemKind::Fireball,
        ItemKind::Banana,
        ItemKind::OilSlick,
        ItemKind::Shield,
        ItemKind::Mushroom,
        ItemKind::Star,
        ItemKind::Lightning,
        ItemKind::Swap,
        ItemKind::Blizzard,
    ];

    pub fn spec(self) -> ItemSpec {
        use Deployment::*;
        match self {
            ItemKind::Shell => ItemSpec {
                category: ItemCategory::Offense,
                deployment: Projectile { motion: Motion::Straight, speed: 42.0, lifetime: 6.0, radius: 0.8, max_bounces: 3 },
                effect: HitEffect::SpinOut,
            },
            ItemKind::HomingShell => ItemSpec {
                category: ItemCategory::Homing,
                deployment: Projectile { motion: Motion::Homing, speed: 38.0, lifetime: 8.0, radius: 0.8, max_bounces: 0 },
                effect: HitEffect::SpinOut,
            },
            ItemKind::IceShell => ItemSpec {
                category: ItemCategory::Offense,
                deployment: Projectile { motion: Motion::Straight, speed: 40.0, lifetime: 5.0, radius: 0.9, max_bounces: 1 },
                effect: HitEffect::Freeze,
            },
            ItemKind::Fireball => ItemSpec {
                category: ItemCategory::Offense,
                deployment: Projectile { motion: Motion::Straight, speed: 46.0, lifetime: 4.0, radius: 1.0, max_bounces: 0 },
                effect: HitEffect::Burn,
            },
            ItemKind::Banana => ItemSpec {
                category: ItemCategory::Defense,
                deployment: Hazard { reusable: false, lifetime: 40.0, radius: 1.0 },
                effect: HitEffect::SpinOut,
            },
            ItemKind::OilSlick => ItemSpec {
                category: ItemCategory::Defense,
                deployment: Hazard { reusable: true, lifetime: 15.0, radius: 2.2 },
                effect: HitEffect::SpinOut,
            },
            ItemKind::Shield => instant(ItemCategory::Defense, InstantEffect::Shield),
            ItemKind::Mushroom => instant(ItemCategory::CatchUp, InstantEffect::SpeedBoost),
            ItemKind::Star => instant(ItemCategory::CatchUp, InstantEffect::Star),
            ItemKind::Lightning => ItemSpec {
                effect: HitEffect::Lightning,
                ..instant(ItemCategory::CatchUp, InstantEffect::Lightning)
            },
            ItemKind::Swap => instant(ItemCategory::CatchUp, InstantEffect::Swap),
            ItemKind::Blizzard => ItemSpec {
                effect: HitEffect::Freeze,
                ..instant(ItemCategory::CatchUp, InstantEffect::Blizzard)
            },
        }
    }

    pub fn category(self) -> ItemCategory {
        self.spec().category
    }
}

fn instant(category: ItemCategory, effect: InstantEffect) -> ItemSpec {
    ItemSpec {
        category,
        deployment: Deployment::Instant(effect),
        effect: HitEffect::SpinOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_straight_shells_bounce() {
        for kind in ItemKind::ALL {
            if let Deployment::Projectile { motion, max_bounces, .. } = kind.spec().deployment {
                if motion == Motion::Homing {
                    assert_eq!(max_bounces, 0, "{kind:?}");
                }
            }
        }
    }

    #[test]
    fn themed_shells_carry_their_effect() {
        assert_eq!(ItemKind::IceShell.spec().effect, HitEffect::Freeze);
        assert_eq!(ItemKind::Fireball.spec().effect, HitEffect::Burn);
        assert_eq!(ItemKind::Banana.category(), ItemCategory::Defense);
        assert_eq!(ItemKind::HomingShell.category(), ItemCategory::Homing);
    }
}
