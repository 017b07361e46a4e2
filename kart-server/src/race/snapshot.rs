// src/race/snapshot.rs
//
// What the outside world reads each frame. Plain serde structs; the server
// sends them as JSON, tests read them directly.

use serde::Serialize;

use crate::debug::DebugOverlay;
use crate::items::{ItemBox, ItemKind, ItemView};
use crate::vehicle::{Vehicle, VehicleId, WeightClass};

#[derive(Debug, Clone, Serialize)]
pub struct StatusFlags {
    pub spun_out: bool,
    pub frozen: bool,
    pub burned: bool,
    pub shrunk: bool,
    pub shielded: bool,
    pub invincible: bool,
    pub grace: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleSnapshot {
    pub id: VehicleId,
    pub name: String,
    pub human: bool,
    pub weight: WeightClass,
    pub position: [f32; 3],
    pub heading: f32,
    pub speed: f32,
    pub airborne: bool,
    pub drifting: bool,
    pub drift_level: u8,
    pub boosting: bool,
    pub held_item: Option<ItemKind>,
    pub status: StatusFlags,
    pub lap: u32,
    pub checkpoint: usize,
    pub race_position: usize,
    pub finished: bool,
    pub finish_time: Option<f32>,
    pub wrong_way: bool,
}

impl VehicleSnapshot {
    pub fn of(v: &Vehicle) -> Self {
        use crate::vehicle::SpeedPenalty;

        Self {
            id: v.id,
            name: v.name.clone(),
            human: v.is_human,
            weight: v.weight,
            position: [v.position.x, v.position.y, v.position.z],
            heading: v.heading,
            speed: v.speed,
            airborne: v.airborne,
            drifting: v.is_drifting(),
            drift_level: v.drift.level,
            boosting: v.boost.is_active(),
            held_item: v.held_item,
            status: StatusFlags {
                spun_out: v.status.is_spun_out(),
                frozen: v.status.is_frozen(),
                burned: v.status.has_penalty(SpeedPenalty::Burn),
                shrunk: v.status.has_penalty(SpeedPenalty::Shrink),
                shielded: v.status.is_shielded(),
                invincible: v.status.is_invincible(),
                grace: v.status.in_grace(),
            },
            lap: v.progress.lap,
            checkpoint: v.progress.last_checkpoint,
            race_position: v.progress.race_position,
            finished: v.progress.finished,
            finish_time: v.progress.finish_time,
            wrong_way: v.progress.wrong_way,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RaceSnapshot {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub tick: u64,
    pub time: f32,
    pub laps: u32,
    pub over: bool,
    pub vehicles: Vec<VehicleSnapshot>,
    pub items: Vec<ItemView>,
    pub item_boxes: Vec<ItemBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugOverlay>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::vehicle::STANDARD_KART;

    #[test]
    fn vehicle_snapshot_carries_lap_checkpoint_and_rank() {
        let mut v = Vehicle::new(VehicleId(4), "snap", false, STANDARD_KART, Vec3::zeros(), 0.0);
        v.progress.lap = 1;
        v.progress.last_checkpoint = 5;
        v.progress.race_position = 2;

        let snap = VehicleSnapshot::of(&v);
        assert_eq!(snap.checkpoint, 5);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["checkpoint"], 5);
        assert_eq!(json["lap"], 1);
        assert_eq!(json["race_position"], 2);
    }
}
