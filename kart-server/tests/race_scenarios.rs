// End-to-end scenarios through the public API: physics bounds, drift and
// boost rules, item hits and status effects, AI recovery, lap counting.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use kart_server::ai::{rubber_band, Difficulty, DrivingController};
use kart_server::items::{ItemKind, ItemManager};
use kart_server::math::{vec3, Vec3};
use kart_server::race::{update_progress, LapEvent, Race, RaceConfig};
use kart_server::track::{Course, CourseDef, PhysicsModifiers, TrackQuery};
use kart_server::vehicle::status::{SPIN_OUT_DURATION, STAR_DURATION};
use kart_server::vehicle::{
    advance, Command, HitEffect, HitOutcome, Vehicle, VehicleId, STANDARD_KART,
};

const DT: f32 = 1.0 / 60.0;

fn oval() -> Course {
    Course::new(CourseDef::oval())
}

fn kart(id: u32, position: Vec3, heading: f32) -> Vehicle {
    Vehicle::new(VehicleId(id), format!("kart{id}"), false, STANDARD_KART, position, heading)
}

fn random_command(rng: &mut StdRng) -> Command {
    Command {
        forward: rng.gen_bool(0.7),
        backward: rng.gen_bool(0.2),
        left: rng.gen_bool(0.3),
        right: rng.gen_bool(0.3),
        drift: rng.gen_bool(0.3),
        use_item: false,
    }
}

#[test]
fn speed_stays_between_reverse_limit_and_effective_max() {
    let course = oval();
    let mut rng = StdRng::seed_from_u64(42);
    let mut v = kart(0, vec3(50.0, 0.0, -40.0), 0.0);
    v.is_human = true;

    for frame in 0..4000 {
        let command = random_command(&mut rng);
        match frame % 700 {
            100 => v.apply_boost(1.5, 1.35),
            300 => {
                v.apply_hit(HitEffect::Burn);
            }
            500 => {
                v.apply_hit(HitEffect::Freeze);
            }
            _ => {}
        }
        let modifiers = course.physics_modifiers(v.position.x, v.position.z);
        advance(&mut v, &command, DT, &modifiers);

        assert!(v.speed.is_finite());
        assert!(v.speed >= v.reverse_limit() - 1e-4, "frame {frame}: {} below reverse limit", v.speed);
        assert!(v.speed <= v.effective_max_speed() + 1e-4, "frame {frame}: {} over the cap", v.speed);
    }
}

#[test]
fn drift_level_never_drops_while_drifting_and_pays_out_on_release() {
    let flat = PhysicsModifiers::default();
    let mut v = kart(0, Vec3::zeros(), 0.0);
    v.speed = 22.0;

    let hold = Command { forward: true, left: true, drift: true, ..Command::default() };
    let mut last_level = 0;
    for _ in 0..150 {
        advance(&mut v, &hold, DT, &flat);
        assert!(v.is_drifting());
        assert!(v.drift.level >= last_level);
        last_level = v.drift.level;
    }
    assert_eq!(last_level, 3);

    advance(&mut v, &Command { forward: true, ..Command::default() }, DT, &flat);
    assert!(!v.is_drifting());
    assert_eq!(v.drift.level, 0);
    assert!(v.boost.is_active());
    assert_eq!(v.boost.multiplier, 1.35);
}

#[test]
fn boosts_combine_by_max_never_by_sum() {
    let mut v = kart(0, Vec3::zeros(), 0.0);
    v.apply_boost(0.6, 1.15);
    v.apply_boost(1.5, 1.25);
    v.apply_boost(1.0, 1.35);
    assert_eq!(v.boost.time, 1.5);
    assert_eq!(v.boost.multiplier, 1.35);
}

#[test]
fn shield_absorbs_exactly_one_hit() {
    let mut items = ItemManager::new();
    let mut karts = vec![kart(0, vec3(50.0, 0.0, -20.0), 0.0), kart(1, vec3(50.0, 0.0, 0.0), 0.0)];
    karts[1].grant_shield();
    let max_speed = karts[1].max_speed;

    assert!(items.use_item(VehicleId(0), ItemKind::Shell, &mut karts));
    for _ in 0..60 {
        items.update(&mut karts, None, DT);
    }
    assert!(items.projectiles().is_empty(), "shell spent on the shield");
    assert!(!karts[1].status.is_shielded());
    assert!(!karts[1].status.is_spun_out());
    assert_eq!(karts[1].max_speed, max_speed);

    // the shield does not come back: once the short break grace runs out,
    // the next hit lands
    karts[1].tick_status(1.0);
    assert_eq!(karts[1].apply_hit(HitEffect::SpinOut), HitOutcome::Applied);
}

#[test]
fn homing_shell_direction_stays_unit_length() {
    let course = oval();
    let mut items = ItemManager::new();
    let mut karts = vec![kart(0, vec3(50.0, 0.0, -20.0), 0.0), kart(1, vec3(44.0, 0.0, 10.0), 0.0)];
    karts[1].progress.fraction = 0.3;
    karts[1].progress.left_grid = true;
    karts[0].progress.fraction = 0.1;
    karts[0].progress.left_grid = true;

    items.use_item(VehicleId(0), ItemKind::HomingShell, &mut karts);
    assert_eq!(items.projectiles()[0].target, Some(VehicleId(1)));

    for _ in 0..40 {
        items.update(&mut karts, Some(&course), DT);
        for p in items.projectiles() {
            assert!((p.direction.norm() - 1.0).abs() < 1e-4);
        }
        // keep the target moving sideways so the shell has to turn
        karts[1].position.x -= 0.1;
    }
}

#[test]
fn bouncing_shell_becomes_a_hazard_after_its_last_bounce() {
    let course = oval();
    let mut items = ItemManager::new();
    // on the front straight, facing straight at the outer wall
    let mut karts = vec![kart(0, vec3(50.0, 0.0, 0.0), std::f32::consts::FRAC_PI_2)];

    items.use_item(VehicleId(0), ItemKind::Shell, &mut karts);
    karts[0].position = vec3(50.0, 0.0, -30.0); // out of the shell's path

    let mut bounces_seen = 0;
    for _ in 0..180 {
        items.update(&mut karts, Some(&course), DT);
        if let Some(p) = items.projectiles().first() {
            bounces_seen = bounces_seen.max(p.bounces);
        }
    }
    assert_eq!(bounces_seen, 3);
    assert!(items.projectiles().is_empty());
    assert_eq!(items.hazards().len(), 1);
    let hazard = &items.hazards()[0];
    assert_eq!(hazard.kind, ItemKind::Shell);
    assert!(course.is_on_track(hazard.position.x, hazard.position.z));
}

#[test]
fn freeze_restores_the_exact_original_max_speed() {
    let mut v = kart(0, Vec3::zeros(), 0.0);
    let original = v.max_speed;

    assert_eq!(v.apply_hit(HitEffect::Freeze), HitOutcome::Applied);
    assert!(v.max_speed < original);
    assert!(v.status.is_frozen());

    for _ in 0..200 {
        v.tick_status(DT);
    }
    assert!(!v.status.is_frozen());
    assert_eq!(v.max_speed, original);
    assert!(v.status.speed_stash.is_none());
}

#[test]
fn second_shell_during_spin_out_has_no_effect() {
    let mut items = ItemManager::new();
    let mut karts = vec![kart(0, vec3(50.0, 0.0, -20.0), 0.0), kart(1, vec3(50.0, 0.0, 0.0), 0.0)];

    items.use_item(VehicleId(0), ItemKind::Shell, &mut karts);
    let mut frames = 0;
    while !karts[1].status.is_spun_out() {
        items.update(&mut karts, None, DT);
        karts[1].tick_status(DT);
        frames += 1;
        assert!(frames < 120, "first shell never arrived");
    }

    // half a second later a second shell arrives
    for _ in 0..30 {
        karts[1].tick_status(DT);
    }
    let spin_left = karts[1].status.spin_out;
    assert!(spin_left < SPIN_OUT_DURATION);

    items.use_item(VehicleId(0), ItemKind::Shell, &mut karts);
    let mut frames = 0;
    while !items.projectiles().is_empty() {
        items.update(&mut karts, None, DT);
        frames += 1;
        assert!(frames < 120, "second shell never arrived");
    }
    // destroyed on contact, spin timer not restarted
    assert_eq!(karts[1].status.spin_out, spin_left);
    assert_eq!(karts[1].max_speed, STANDARD_KART.max_speed);
}

#[test]
fn ai_far_off_the_track_is_snapped_back() {
    let course = oval();
    // 30 m outside the front straight: beyond three half widths
    let mut me = kart(0, vec3(80.0, 0.0, 0.0), 1.0);
    me.speed = 12.0;
    me.apply_hit(HitEffect::Burn);

    let mut ai = DrivingController::new(me.id, Difficulty::Normal, 7, Some(&course));
    let decision = ai.decide(Some(&course), std::slice::from_ref(&me), DT);
    let (position, heading) = decision.snap_to.expect("snap requested");

    me.snap_to_track(position, heading);
    assert!(course.is_on_track(me.position.x, me.position.z));
    assert_eq!(me.speed, 0.0);
    assert_eq!(me.max_speed, STANDARD_KART.max_speed);
    assert!(!me.status.has_penalty(kart_server::vehicle::SpeedPenalty::Burn));
}

#[test]
fn rubber_band_is_clamped_on_normal() {
    let normal = Difficulty::Normal.profile();
    assert_eq!(rubber_band(&normal, 20), normal.rubber_band_bonus_clamp);
    assert_eq!(rubber_band(&normal, -20), -normal.rubber_band_penalty_clamp);
    assert!(rubber_band(&normal, 3) > 0.0);
}

#[test]
fn crossing_the_line_without_checkpoints_is_not_a_lap() {
    let course = oval();
    let length = course.length();
    let mut v = kart(0, Vec3::zeros(), 0.0);

    let place = |v: &mut Vehicle, distance: f32| {
        let (point, heading) = course.point_at_distance(distance);
        v.position = point;
        v.heading = heading;
    };

    // a proper lap first
    let mut events = Vec::new();
    let mut d = 1.0;
    while d < length + 5.0 {
        place(&mut v, d);
        events.extend(update_progress(&mut v, &course, course.checkpoint_count(), 3, 0.0));
        d += 1.0;
    }
    assert_eq!(events, vec![LapEvent::LapCompleted { lap: 1 }]);

    // then jump from early in lap two to just before the line
    place(&mut v, length * 0.95);
    update_progress(&mut v, &course, course.checkpoint_count(), 3, 0.0);
    place(&mut v, 2.0);
    let event = update_progress(&mut v, &course, course.checkpoint_count(), 3, 0.0);
    assert_eq!(event, Some(LapEvent::ShortcutRejected));
    assert_eq!(v.progress.lap, 1);
}

#[test]
fn star_blocks_hits_for_its_duration() {
    let mut items = ItemManager::new();
    let mut karts = vec![kart(0, Vec3::zeros(), 0.0), kart(1, vec3(0.0, 0.0, 30.0), 0.0)];
    items.use_item(VehicleId(1), ItemKind::Star, &mut karts);
    assert!(karts[1].status.is_invincible());
    assert_eq!(karts[1].apply_hit(HitEffect::SpinOut), HitOutcome::Blocked);
    karts[1].tick_status(STAR_DURATION + 0.1);
    assert!(!karts[1].status.is_invincible());
}

#[test]
fn full_race_with_ai_only_runs_clean() {
    let config = RaceConfig { ai_count: 4, human_seats: 0, laps: 1, ..RaceConfig::default() };
    let mut race = Race::new(oval(), config);
    for _ in 0..(60 * 20) {
        race.step(DT);
        for v in race.vehicles() {
            assert!(v.position.iter().all(|c| c.is_finite()));
            assert!(v.speed.is_finite());
            assert!(v.speed <= v.effective_max_speed() + 1e-4, "{} over its cap", v.id);
        }
    }
    let snapshot = race.snapshot();
    let mut ranks: Vec<usize> = snapshot.vehicles.iter().map(|v| v.race_position).collect();
    ranks.sort_unstable();
    assert_eq!(ranks, vec![1, 2, 3, 4]);
    assert!(serde_json::to_string(&snapshot).is_ok());
}
