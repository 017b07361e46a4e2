// src/items/item_box.rs
//
// Static item boxes. Driving through an active box with an empty slot
// deactivates it and draws an item weighted by race position; the box comes
// back after `ITEM_BOX_RESPAWN` seconds.

use rand::Rng;
use serde::Serialize;

use crate::math::{planar_distance, Vec3};
use crate::track::CourseTheme;
use crate::vehicle::{Vehicle, VehicleId, VEHICLE_RADIUS};

use super::ItemKind;

pub const ITEM_BOX_RADIUS: f32 = 1.5; // m
pub const ITEM_BOX_RESPAWN: f32 = 5.0; // s

/// (kind, weight when leading, weight when last). Linear in between.
const DRAW_TABLE: [(ItemKind, f32, f32); 10] = [
    (ItemKind::Banana, 30.0, 4.0),
    (ItemKind::OilSlick, 14.0, 4.0),
    (ItemKind::Shield, 16.0, 4.0),
    (ItemKind::Shell, 25.0, 14.0),
    (ItemKind::HomingShell, 10.0, 18.0),
    (ItemKind::Mushroom, 5.0, 24.0),
    (ItemKind::Star, 0.0, 10.0),
    (ItemKind::Lightning, 0.0, 6.0),
    (ItemKind::Swap, 0.0, 9.0),
    (ItemKind::Blizzard, 0.0, 7.0),
];

#[derive(Debug, Clone, Serialize)]
pub struct ItemBox {
    #[serde(skip)]
    pub position: Vec3,
    pub active: bool,
    pub respawn_in: f32,
}

#[derive(Debug, Clone, Default)]
pub struct ItemBoxes {
    boxes: Vec<ItemBox>,
}

impl ItemBoxes {
    pub fn new(positions: &[Vec3]) -> Self {
        Self {
            boxes: positions
                .iter()
                .map(|&position| ItemBox {
                    position,
                    active: true,
                    respawn_in: 0.0,
                })
                .collect(),
        }
    }

    pub fn boxes(&self) -> &[ItemBox] {
        &self.boxes
    }

    /// Respawn timers, then pickups. Returns what was handed out.
    pub fn update<R: Rng>(
        &mut self,
        vehicles: &mut [Vehicle],
        theme: CourseTheme,
        rng: &mut R,
        dt: f32,
    ) -> Vec<(VehicleId, ItemKind)> {
        let field = vehicles.len();
        let mut drawn = Vec::new();

        for item_box in self.boxes.iter_mut() {
            if !item_box.active {
                item_box.respawn_in -= dt;
                if item_box.respawn_in <= 0.0 {
                    item_box.active = true;
                    item_box.respawn_in = 0.0;
                }
                continue;
            }

            let picker = vehicles.iter_mut().find(|v| {
                v.held_item.is_none()
                    && !v.progress.finished
                    && planar_distance(&v.position, &item_box.position) < ITEM_BOX_RADIUS + VEHICLE_RADIUS
            });
            let Some(vehicle) = picker else {
                continue;
            };

            let kind = draw_item(vehicle.progress.race_position, field, theme, rng);
            vehicle.held_item = Some(kind);
            item_box.active = false;
            item_box.respawn_in = ITEM_BOX_RESPAWN;
            tracing::debug!(kart = %vehicle.id, ?kind, "item box");
            drawn.push((vehicle.id, kind));
        }
        drawn
    }
}

/// Rank-weighted draw. Rank is 1-based; 0 (not ranked yet) counts as leading.
pub fn draw_item<R: Rng>(rank: usize, field: usize, theme: CourseTheme, rng: &mut R) -> ItemKind {
    let t = if field > 1 {
        (rank.saturating_sub(1) as f32 / (field - 1) as f32).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let weight = |front: f32, back: f32| front + (back - front) * t;
    let total: f32 = DRAW_TABLE.iter().map(|&(_, f, b)| weight(f, b)).sum();

    let mut roll = rng.gen_range(0.0..total);
    let mut picked = ItemKind::Shell;
    for &(kind, front, back) in DRAW_TABLE.iter() {
        let w = weight(front, back);
        if roll < w {
            picked = kind;
            break;
        }
        roll -= w;
    }
    themed(picked, theme)
}

/// Courses with a theme swap the plain shell for their own variant.
pub fn themed(kind: ItemKind, theme: CourseTheme) -> ItemKind {
    match (kind, theme) {
        (ItemKind::Shell, CourseTheme::Ice) => ItemKind::IceShell,
        (ItemKind::Shell, CourseTheme::Lava) => ItemKind::Fireball,
        _ => kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::ItemCategory;
    use crate::math::vec3;
    use crate::vehicle::STANDARD_KART;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tally(rank: usize, field: usize) -> (usize, usize) {
        let mut rng = StdRng::seed_from_u64(11);
        let mut defense = 0;
        let mut catch_up = 0;
        for _ in 0..2000 {
            match draw_item(rank, field, CourseTheme::Standard, &mut rng).category() {
                ItemCategory::Defense => defense += 1,
                ItemCategory::CatchUp => catch_up += 1,
                _ => {}
            }
        }
        (defense, catch_up)
    }

    #[test]
    fn leaders_get_defense_and_the_back_gets_catch_up() {
        let (lead_defense, lead_catch_up) = tally(1, 8);
        let (last_defense, last_catch_up) = tally(8, 8);
        assert!(lead_defense > last_defense);
        assert!(last_catch_up > lead_catch_up);
    }

    #[test]
    fn leader_never_draws_star_or_lightning() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            let kind = draw_item(1, 8, CourseTheme::Standard, &mut rng);
            assert!(!matches!(kind, ItemKind::Star | ItemKind::Lightning | ItemKind::Swap | ItemKind::Blizzard));
        }
    }

    #[test]
    fn theme_substitutes_the_shell() {
        assert_eq!(themed(ItemKind::Shell, CourseTheme::Ice), ItemKind::IceShell);
        assert_eq!(themed(ItemKind::Shell, CourseTheme::Lava), ItemKind::Fireball);
        assert_eq!(themed(ItemKind::Banana, CourseTheme::Lava), ItemKind::Banana);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..500 {
            assert_ne!(draw_item(4, 8, CourseTheme::Ice, &mut rng), ItemKind::Shell);
        }
    }

    #[test]
    fn pickup_deactivates_and_respawns() {
        let mut boxes = ItemBoxes::new(&[vec3(0.0, 0.0, 10.0)]);
        let mut karts = vec![
            Vehicle::new(VehicleId(0), "a", false, STANDARD_KART, vec3(0.0, 0.0, 10.5), 0.0),
            Vehicle::new(VehicleId(1), "b", false, STANDARD_KART, vec3(0.5, 0.0, 10.0), 0.0),
        ];
        let mut rng = StdRng::seed_from_u64(1);

        let drawn = boxes.update(&mut karts, CourseTheme::Standard, &mut rng, 0.016);
        assert_eq!(drawn.len(), 1);
        assert!(karts[0].held_item.is_some());
        assert!(karts[1].held_item.is_none(), "one box, one item");
        assert!(!boxes.boxes()[0].active);

        boxes.update(&mut karts, CourseTheme::Standard, &mut rng, ITEM_BOX_RESPAWN + 0.1);
        assert!(boxes.boxes()[0].active);
        let drawn = boxes.update(&mut karts, CourseTheme::Standard, &mut rng, 0.016);
        assert_eq!(drawn, vec![(VehicleId(1), karts[1].held_item.unwrap())]);
    }
}
