// ==============================================================================
// kart_server — ARCADE KART RACE SIMULATION + WEBSOCKET RACE HOST
// ------------------------------------------------------------------------------
// Simulation (engine-agnostic, single-threaded, infallible):
// - track   : course geometry and the query surface everything else reads
// - vehicle : kart state, drift/boost, status effects, per-frame physics
// - ai      : autonomous driving controller
// - items   : item kinds, projectiles, hazards, item boxes
// - race    : frame ordering, bumping, laps, ranking, snapshots
// - debug   : optional AI visualization overlay
//
// Hosting:
// - config / state / net : clap CLI, shared session, websocket plumbing
// ==============================================================================

pub mod ai;
pub mod config;
pub mod debug;
pub mod error;
pub mod items;
pub mod math;
pub mod net;
pub mod race;
pub mod state;
pub mod track;
pub mod vehicle;
