// src/race/progress.rs
//
// Lap bookkeeping and ranking. Checkpoints are equal slices of the lap
// fraction and must be confirmed in order; a lap only counts when the kart
// crosses the line having confirmed most of them.

use crate::math::angle_between;
use crate::track::TrackQuery;
use crate::vehicle::Vehicle;

const LINE_BEFORE: f32 = 0.75; // fraction just before the line
const LINE_AFTER: f32 = 0.25; // fraction just after it
const REQUIRED_CHECKPOINTS: f32 = 0.75; // share of checkpoints needed for a lap
const WRONG_WAY_ENTER: f32 = 2.0; // rad off the course direction
const WRONG_WAY_EXIT: f32 = 1.2; // rad
const WRONG_WAY_MIN_SPEED: f32 = 2.0; // m/s

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LapEvent {
    LapCompleted { lap: u32 },
    Finished { time: f32 },
    ShortcutRejected,
}

/// Refresh one kart's progress from its position. `race_time` stamps a finish.
pub fn update_progress(
    vehicle: &mut Vehicle,
    track: &dyn TrackQuery,
    checkpoints: usize,
    laps: u32,
    race_time: f32,
) -> Option<LapEvent> {
    let previous = vehicle.progress.fraction;
    let fraction = track.progress_fraction(vehicle.position.x, vehicle.position.z);
    update_wrong_way(vehicle, track);

    let id = vehicle.id;
    let progress = &mut vehicle.progress;
    progress.fraction = fraction;
    if progress.finished {
        return None;
    }

    // 1) grid phase ends the first time the kart is seen past the line
    if !progress.left_grid {
        if fraction <= 0.5 {
            progress.left_grid = true;
            progress.last_checkpoint = 0;
        }
        return None;
    }

    // 2) checkpoints, strictly in order
    let count = checkpoints.max(1);
    let slice = ((fraction * count as f32) as usize).min(count - 1);

    // 3) crossing the line forward
    if previous > LINE_BEFORE && fraction < LINE_AFTER {
        let required = (count as f32 * REQUIRED_CHECKPOINTS).floor() as usize;
        let earned = progress.last_checkpoint >= required;
        progress.last_checkpoint = 0;

        if !earned {
            tracing::debug!(kart = %id, "lap rejected, checkpoints missed");
            return Some(LapEvent::ShortcutRejected);
        }

        progress.lap += 1;
        if progress.lap >= laps {
            progress.finished = true;
            progress.finish_time = Some(race_time);
            tracing::info!(kart = %id, time = race_time, "finished");
            return Some(LapEvent::Finished { time: race_time });
        }
        tracing::info!(kart = %id, lap = progress.lap, "lap completed");
        return Some(LapEvent::LapCompleted { lap: progress.lap });
    }

    if slice == progress.last_checkpoint + 1 {
        progress.last_checkpoint = slice;
    }
    None
}

/// Facing well against the course while moving sets the flag; lining back
/// up clears it.
fn update_wrong_way(vehicle: &mut Vehicle, track: &dyn TrackQuery) {
    let course = track.course_direction(vehicle.position.x, vehicle.position.z);
    // reversing down the course is still going the right way
    let travel = if vehicle.speed < 0.0 { vehicle.heading + std::f32::consts::PI } else { vehicle.heading };
    let off = angle_between(course, travel).abs();

    let progress = &mut vehicle.progress;
    if vehicle.speed.abs() < WRONG_WAY_MIN_SPEED {
        return;
    }
    if !progress.wrong_way && off > WRONG_WAY_ENTER {
        progress.wrong_way = true;
        tracing::debug!(kart = %vehicle.id, "wrong way");
    } else if progress.wrong_way && off < WRONG_WAY_EXIT {
        progress.wrong_way = false;
    }
}

/// Finished karts by finish time, then everyone else by total progress.
/// Writes the 1-based `race_position` of every kart.
pub fn rank(vehicles: &mut [Vehicle]) {
    let mut order: Vec<usize> = (0..vehicles.len()).collect();
    order.sort_by(|&a, &b| {
        let (pa, pb) = (&vehicles[a].progress, &vehicles[b].progress);
        match (pa.finish_time, pb.finish_time) {
            (Some(ta), Some(tb)) => ta.total_cmp(&tb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => pb.total().total_cmp(&pa.total()),
        }
        .then(vehicles[a].id.cmp(&vehicles[b].id))
    });
    for (place, index) in order.into_iter().enumerate() {
        vehicles[index].progress.race_position = place + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::vec3;
    use crate::track::testing::Corridor;
    use crate::vehicle::{VehicleId, STANDARD_KART};

    fn kart(id: u32, z: f32) -> Vehicle {
        Vehicle::new(VehicleId(id), format!("k{id}"), false, STANDARD_KART, vec3(0.0, 0.0, z), 0.0)
    }

    /// Drive along the corridor in 1 m steps, collecting events.
    fn drive(v: &mut Vehicle, from: f32, to: f32, laps: u32) -> Vec<LapEvent> {
        let mut events = Vec::new();
        let mut z = from;
        while z <= to {
            v.position.z = z;
            if let Some(e) = update_progress(v, &Corridor, 8, laps, z) {
                events.push(e);
            }
            z += 1.0;
        }
        events
    }

    #[test]
    fn grid_crossing_is_not_a_lap() {
        let mut v = kart(0, -5.0);
        v.progress.fraction = 0.95;
        let events = drive(&mut v, -5.0, 50.0, 3);
        assert!(events.is_empty());
        assert!(v.progress.left_grid);
        assert_eq!(v.progress.lap, 0);
    }

    #[test]
    fn full_laps_count_and_finish() {
        let mut v = kart(0, 1.0);
        let events = drive(&mut v, 1.0, 201.0, 2);
        assert_eq!(events, vec![LapEvent::LapCompleted { lap: 1 }, LapEvent::Finished { time: 200.0 }]);
        assert!(v.progress.finished);
        assert_eq!(v.progress.finish_time, Some(200.0));
    }

    #[test]
    fn shortcut_is_rejected() {
        let mut v = kart(0, 1.0);
        drive(&mut v, 1.0, 30.0, 3);
        // teleport to just before the line, then cross it
        v.position.z = 95.0;
        update_progress(&mut v, &Corridor, 8, 3, 0.0);
        v.position.z = 101.0;
        let event = update_progress(&mut v, &Corridor, 8, 3, 0.0);
        assert_eq!(event, Some(LapEvent::ShortcutRejected));
        assert_eq!(v.progress.lap, 0);
    }

    #[test]
    fn wrong_way_needs_speed_and_clears_when_realigned() {
        let mut v = kart(0, 10.0);
        v.heading = std::f32::consts::PI;
        v.speed = 10.0;
        update_progress(&mut v, &Corridor, 8, 3, 0.0);
        assert!(v.progress.wrong_way);

        v.heading = 0.1;
        update_progress(&mut v, &Corridor, 8, 3, 0.0);
        assert!(!v.progress.wrong_way);

        v.heading = std::f32::consts::PI;
        v.speed = 0.5;
        update_progress(&mut v, &Corridor, 8, 3, 0.0);
        assert!(!v.progress.wrong_way);
    }

    #[test]
    fn finishers_rank_ahead_of_leaders_on_track() {
        let mut karts = vec![kart(0, 0.0), kart(1, 0.0), kart(2, 0.0)];
        karts[0].progress.lap = 1;
        karts[0].progress.fraction = 0.4;
        karts[0].progress.left_grid = true;
        karts[1].progress.finished = true;
        karts[1].progress.finish_time = Some(80.0);
        karts[2].progress.fraction = 0.9;
        karts[2].progress.left_grid = true;
        rank(&mut karts);
        assert_eq!(karts[1].progress.race_position, 1);
        assert_eq!(karts[0].progress.race_position, 2);
        assert_eq!(karts[2].progress.race_position, 3);
    }
}
