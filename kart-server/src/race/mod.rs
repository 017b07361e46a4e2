// ==============================================================================
// race — ONE RACE ON ONE COURSE, STEPPED FRAME BY FRAME
// ------------------------------------------------------------------------------
// `Race` owns the course, every kart, every AI controller, the item manager
// and the item boxes, and hands references to each stage in a fixed order:
//
//   1) human input        (latest command per seat, neutral when unclaimed)
//   2) AI decide          (snap requests applied immediately)
//   3) vehicle advance    (course modifiers resolved at each kart)
//   4) kart-vs-kart bumps
//   5) item boxes → item use (on press) → item update
//   6) lap bookkeeping → ranking
//
// Nothing in here blocks or allocates per kart beyond small scratch vectors;
// the server loop calls `step` at a fixed rate and reads `snapshot`.
// ==============================================================================

pub mod collisions;
pub mod grid;
pub mod progress;
pub mod snapshot;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

use crate::ai::{Difficulty, DrivingController};
use crate::debug::{push_feelers, push_kart_debug, push_target_ray, DebugOverlay};
use crate::items::{ItemBoxes, ItemManager};
use crate::track::{Course, TrackQuery};
use crate::vehicle::physics::MAX_FRAME_DT;
use crate::vehicle::{advance, Command, Vehicle, VehicleId, WeightClass, STANDARD_KART};

pub use collisions::ContactTracker;
pub use grid::{GridAllocator, GridSlot, Lane};
pub use progress::{rank, update_progress, LapEvent};
pub use snapshot::{RaceSnapshot, StatusFlags, VehicleSnapshot};

const AI_NAMES: [&str; 11] = [
    "Blaze", "Nova", "Pepper", "Rook", "Juniper", "Moss", "Vega", "Tango", "Quill", "Ember", "Sprocket",
];

#[derive(Debug, Clone, PartialEq)]
pub struct RaceConfig {
    pub laps: u32,
    pub ai_count: usize,
    pub human_seats: usize,
    pub difficulty: Difficulty,
    pub seed: u64,
    pub debug: bool,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            laps: 3,
            ai_count: 5,
            human_seats: 1,
            difficulty: Difficulty::Normal,
            seed: 0x5eed,
            debug: false,
        }
    }
}

pub struct Race {
    course: Course,
    config: RaceConfig,
    vehicles: Vec<Vehicle>,
    slots: Vec<GridSlot>,
    controllers: Vec<DrivingController>,
    contacts: ContactTracker,
    human_commands: HashMap<VehicleId, Command>,
    item_pressed: HashMap<VehicleId, bool>,
    items: ItemManager,
    boxes: ItemBoxes,
    rng: StdRng,
    tick: u64,
    time: f32,
    debug: Option<DebugOverlay>,
}

impl Race {
    pub fn new(course: Course, config: RaceConfig) -> Self {
        let mut grid = GridAllocator::new();
        let mut vehicles = Vec::with_capacity(config.ai_count + config.human_seats);
        let mut slots = Vec::with_capacity(vehicles.capacity());
        let ai_stats = STANDARD_KART.scaled(config.difficulty.profile().speed_multiplier);

        // AI karts fill the front of the grid, humans start behind them.
        for i in 0..config.ai_count + config.human_seats {
            let slot = grid.allocate(&course);
            let human = i >= config.ai_count;
            let (name, stats) = if human {
                (format!("Player {}", i - config.ai_count + 1), STANDARD_KART)
            } else {
                (AI_NAMES[i % AI_NAMES.len()].to_string(), ai_stats)
            };
            let weight = match i % 3 {
                0 => WeightClass::Medium,
                1 => WeightClass::Light,
                _ => WeightClass::Heavy,
            };
            let vehicle = Vehicle::new(VehicleId(i as u32), name, human, stats, slot.position, slot.heading)
                .with_weight(weight);
            tracing::debug!(kart = %vehicle.id, slot = slot.index, lane = slot.lane.as_str(), "grid slot assigned");
            vehicles.push(vehicle);
            slots.push(slot);
        }

        let mut race = Self {
            boxes: ItemBoxes::new(&course.item_box_positions()),
            rng: StdRng::seed_from_u64(config.seed),
            course,
            config,
            vehicles,
            slots,
            controllers: Vec::new(),
            contacts: ContactTracker::new(),
            human_commands: HashMap::new(),
            item_pressed: HashMap::new(),
            items: ItemManager::new(),
            tick: 0,
            time: 0.0,
            debug: None,
        };
        race.line_up();

        tracing::info!(
            course = race.course.name(),
            laps = race.config.laps,
            karts = race.vehicles.len(),
            difficulty = race.config.difficulty.as_str(),
            "race created"
        );
        race
    }

    /// Put every kart back on its grid slot and rebuild the AI.
    fn line_up(&mut self) {
        for (vehicle, slot) in self.vehicles.iter_mut().zip(self.slots.iter()) {
            let fresh = Vehicle::new(
                vehicle.id,
                vehicle.name.clone(),
                vehicle.is_human,
                vehicle.stats,
                slot.position,
                slot.heading,
            )
            .with_weight(vehicle.weight);
            *vehicle = fresh;
            vehicle.progress.fraction = self.course.progress_fraction(slot.position.x, slot.position.z);
        }
        rank(&mut self.vehicles);

        let course: &dyn TrackQuery = &self.course;
        self.controllers = self
            .vehicles
            .iter()
            .filter(|v| !v.is_human)
            .map(|v| {
                let seed = self.config.seed.wrapping_add(u64::from(v.id.0) + 1);
                DrivingController::new(v.id, self.config.difficulty, seed, Some(course))
            })
            .collect();

        self.contacts.clear();
        self.human_commands.clear();
        self.item_pressed.clear();
        self.debug = self.config.debug.then(DebugOverlay::default);
    }

    /// Back to the grid: same karts, no items on the course, clock at zero.
    pub fn restart(&mut self) {
        self.line_up();
        self.items.clear();
        self.boxes = ItemBoxes::new(&self.course.item_box_positions());
        self.time = 0.0;
        tracing::info!(course = self.course.name(), "race restarted");
    }

    pub fn course(&self) -> &Course {
        &self.course
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    /// Direct access for scripted setups (tests, tools).
    pub fn vehicle_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.iter_mut().find(|v| v.id == id)
    }

    pub fn items(&self) -> &ItemManager {
        &self.items
    }

    pub fn item_boxes(&self) -> &ItemBoxes {
        &self.boxes
    }

    pub fn controllers(&self) -> &[DrivingController] {
        &self.controllers
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn human_ids(&self) -> Vec<VehicleId> {
        self.vehicles.iter().filter(|v| v.is_human).map(|v| v.id).collect()
    }

    /// Latest input for a human seat. Returns false for unknown or AI karts.
    pub fn set_human_command(&mut self, id: VehicleId, command: Command) -> bool {
        if !self.vehicles.iter().any(|v| v.id == id && v.is_human) {
            return false;
        }
        self.human_commands.insert(id, command);
        true
    }

    /// Seat released: the kart coasts on neutral input.
    pub fn release_seat(&mut self, id: VehicleId) {
        self.human_commands.remove(&id);
    }

    /// Over once every human has finished; with no humans, once everyone has.
    pub fn is_over(&self) -> bool {
        let mut humans = self.vehicles.iter().filter(|v| v.is_human).peekable();
        if humans.peek().is_some() {
            return humans.all(|v| v.progress.finished);
        }
        !self.vehicles.is_empty() && self.vehicles.iter().all(|v| v.progress.finished)
    }

    pub fn step(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
        if dt <= 0.0 {
            return;
        }
        self.tick += 1;
        self.time += dt;

        //----------------------------------
        // 1) Human input
        //----------------------------------
        let mut commands: Vec<Command> = self
            .vehicles
            .iter()
            .map(|v| {
                if v.is_human {
                    self.human_commands.get(&v.id).copied().unwrap_or_default()
                } else {
                    Command::default()
                }
            })
            .collect();

        //----------------------------------
        // 2) AI decisions
        //----------------------------------
        for controller in self.controllers.iter_mut() {
            let Some(index) = self.vehicles.iter().position(|v| v.id == controller.vehicle()) else {
                continue;
            };
            let decision = controller.decide(Some(&self.course), &self.vehicles, dt);
            if let Some((position, heading)) = decision.snap_to {
                self.vehicles[index].snap_to_track(position, heading);
            }
            commands[index] = decision.command;
        }

        //----------------------------------
        // 3) Vehicle physics
        //----------------------------------
        for (vehicle, command) in self.vehicles.iter_mut().zip(commands.iter()) {
            let modifiers = self.course.physics_modifiers(vehicle.position.x, vehicle.position.z);
            advance(vehicle, command, dt, &modifiers);
        }

        //----------------------------------
        // 4) Bumping
        //----------------------------------
        self.contacts.resolve(&mut self.vehicles);

        //----------------------------------
        // 5) Items
        //----------------------------------
        self.boxes.update(&mut self.vehicles, self.course.theme(), &mut self.rng, dt);
        self.use_items(&commands);
        self.items.update(&mut self.vehicles, Some(&self.course), dt);

        //----------------------------------
        // 6) Progress + ranking
        //----------------------------------
        let checkpoints = self.course.checkpoint_count();
        for vehicle in self.vehicles.iter_mut() {
            update_progress(vehicle, &self.course, checkpoints, self.config.laps, self.time);
        }
        rank(&mut self.vehicles);

        if self.debug.is_some() {
            self.rebuild_debug();
        }
    }

    /// Fire held items on the press edge of `use_item`, never while spun out.
    fn use_items(&mut self, commands: &[Command]) {
        for (index, command) in commands.iter().enumerate() {
            let id = self.vehicles[index].id;
            let was_pressed = self.item_pressed.insert(id, command.use_item).unwrap_or(false);
            if !command.use_item || was_pressed {
                continue;
            }
            let vehicle = &mut self.vehicles[index];
            if vehicle.status.is_spun_out() || vehicle.progress.finished {
                continue;
            }
            let Some(kind) = vehicle.held_item.take() else {
                continue;
            };
            if !self.items.use_item(id, kind, &mut self.vehicles) {
                self.vehicles[index].held_item = Some(kind);
            }
        }
    }

    fn rebuild_debug(&mut self) {
        let Some(overlay) = self.debug.as_mut() else {
            return;
        };
        overlay.clear();
        for controller in &self.controllers {
            let Some(vehicle) = self.vehicles.iter().find(|v| v.id == controller.vehicle()) else {
                continue;
            };
            if let Some(target) = controller.last_target() {
                push_target_ray(overlay, vehicle, &target);
            }
            push_feelers(overlay, vehicle, &self.course);
            push_kart_debug(overlay, vehicle, controller);
        }
    }

    pub fn snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            kind: "snapshot",
            tick: self.tick,
            time: self.time,
            laps: self.config.laps,
            over: self.is_over(),
            vehicles: self.vehicles.iter().map(VehicleSnapshot::of).collect(),
            items: self.items.views(),
            item_boxes: self.boxes.boxes().to_vec(),
            debug: self.debug.clone(),
        }
    }
}
