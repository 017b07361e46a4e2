// src/config.rs
//
// Command line for the race host. Everything has a default so a bare
// `kart-server` starts a three-lap race on the built-in oval.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::ai::Difficulty;
use crate::error::ServerError;
use crate::race::RaceConfig;
use crate::track::{Course, CourseDef};

#[derive(Debug, Clone, Parser)]
#[command(name = "kart-server")]
#[command(about = "Host an arcade kart race and stream snapshots over websockets")]
pub struct ServerConfig {
    /// Websocket listen address
    #[arg(long, default_value = "0.0.0.0:9001")]
    pub listen: SocketAddr,

    /// Simulation steps per second
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(10..=240))]
    pub tick_rate: u32,

    #[arg(long, default_value_t = 3)]
    pub laps: u32,

    /// Computer-driven karts
    #[arg(long, default_value_t = 5)]
    pub ai_count: usize,

    /// Seats websocket clients can claim
    #[arg(long, default_value_t = 1)]
    pub humans: usize,

    #[arg(long, value_enum, default_value_t = Difficulty::Normal)]
    pub difficulty: Difficulty,

    /// Seed for AI personalities, mistakes and item draws
    #[arg(long, default_value_t = 0x5eed)]
    pub seed: u64,

    /// Course JSON; the built-in oval when omitted
    #[arg(long, value_name = "FILE")]
    pub course: Option<PathBuf>,

    /// Ship the AI debug overlay inside snapshots
    #[arg(long)]
    pub debug_overlay: bool,
}

impl ServerConfig {
    pub fn race_config(&self) -> RaceConfig {
        RaceConfig {
            laps: self.laps.max(1),
            ai_count: self.ai_count,
            human_seats: self.humans,
            difficulty: self.difficulty,
            seed: self.seed,
            debug: self.debug_overlay,
        }
    }

    pub fn load_course(&self) -> Result<Course, ServerError> {
        let def = match &self.course {
            Some(path) => CourseDef::load(path)?,
            None => CourseDef::oval(),
        };
        Ok(Course::new(def))
    }

    pub fn frame_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}
