use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing_subscriber::EnvFilter;

use kart_server::config::ServerConfig;
use kart_server::net::{bind, start_websocket_server};
use kart_server::race::Race;
use kart_server::state::SessionState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();
    let course = config.load_course().context("loading course")?;
    tracing::info!(course = course.name(), tick_rate = config.tick_rate, "starting kart server");

    let state = Arc::new(Mutex::new(SessionState::new(Race::new(course, config.race_config()))));

    // Start WebSocket server
    let listener = bind(config.listen).await?;
    tokio::spawn(start_websocket_server(listener, Arc::clone(&state)));

    // Fixed timestep
    let dt = config.frame_dt();
    let mut ticker = interval(Duration::from_secs_f32(dt));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut announced_over = false;

    loop {
        ticker.tick().await;

        let mut session = state.lock().await;
        session.race.step(dt);

        let over = session.race.is_over();
        if over && !announced_over {
            tracing::info!(time = session.race.time(), "race over");
        }
        announced_over = over;

        if let Err(e) = session.broadcast_snapshot() {
            tracing::warn!(error = %e, "snapshot not sent");
        }
    }
}
