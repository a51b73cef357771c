use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{Instant, interval};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use arcade_drive::config::ServerConfig;
use arcade_drive::net::start_websocket_server;
use arcade_drive::physics::PhysicsWorld;
use arcade_drive::settings::VehicleSettings;
use arcade_drive::state::SharedGameState;

/// Longest frame fed to the simulation; a stalled loop catches up slowly
/// instead of running hundreds of fixed steps at once.
const MAX_FRAME_DT: f32 = 0.25;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arcade_drive=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let settings = match &config.settings_path {
        Some(path) => VehicleSettings::load(path)?,
        None => VehicleSettings::default(),
    };
    info!(
        bind = %config.bind,
        visual_hz = config.visual_hz,
        fixed_hz = config.fixed_hz,
        "starting arcade-drive server"
    );

    let state = Arc::new(Mutex::new(SharedGameState::new(settings)));
    let physics = Arc::new(Mutex::new(PhysicsWorld::new()));

    // Start WebSocket server
    let server = tokio::spawn(start_websocket_server(
        config.bind,
        Arc::clone(&state),
        Arc::clone(&physics),
    ));

    let fixed_dt = config.fixed_dt();
    let mut ticker = interval(config.visual_period());
    let mut last = Instant::now();
    let mut accumulator = 0.0_f32;

    loop {
        ticker.tick().await;

        if server.is_finished() {
            error!("websocket server stopped");
            return match server.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.into()),
                Err(e) => Err(e.into()),
            };
        }

        let now = Instant::now();
        let frame_dt = now.duration_since(last).as_secs_f32().min(MAX_FRAME_DT);
        last = now;

        let mut phys = physics.lock().await;
        let mut game = state.lock().await;

        // Visual rate: steering, brake, grip, wheel poses
        game.visual_step(&mut phys, frame_dt);

        // Fixed rate: motor, launch assist, boost, counter-drift, then integrate
        accumulator += frame_dt;
        while accumulator >= fixed_dt {
            game.fixed_step(&mut phys, fixed_dt);
            phys.step(fixed_dt);
            accumulator -= fixed_dt;
        }

        // Advance tick + broadcast snapshot
        game.tick += 1;
        if let Err(e) = game.broadcast_snapshot(&phys) {
            warn!(error = %e, "snapshot serialisation failed");
        }
    }
}
