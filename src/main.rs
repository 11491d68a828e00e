//! Next To Go - A live countdown to the next races starting
//! 
//! This is the main entry point for the next-to-go application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use next_to_go::{
    config::Config,
    state::AppState,
    api::create_router,
    racing::RaceWatchCoordinator,
    services::RacingApiClient,
    tasks::{refresh_scheduler_task, timer_tick_task, RefreshScheduler},
    timers::TimerRegistry,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("next_to_go={},tower_http=info", config.log_level()))
        .init();

    info!("Starting next-to-go server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, api={}, refresh={}s, races={}",
          config.host, config.port, config.base_url, config.refresh_period().as_secs(), config.race_count);

    // One timer registry for the whole process, shared by everything below
    let timers = Arc::new(TimerRegistry::new());
    let watcher = Arc::new(RaceWatchCoordinator::new(Arc::clone(&timers)));
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        Arc::clone(&timers),
        watcher,
    ));

    // Start the timer tick background task
    let tick_state = Arc::clone(&state);
    let tick_task = tokio::spawn(async move {
        timer_tick_task(tick_state).await;
    });

    // Start the refresh scheduler background task
    let client = Arc::new(RacingApiClient::new(config.base_url.clone()));
    let scheduler = RefreshScheduler::new(Arc::clone(&state), client)
        .with_period(config.refresh_period())
        .with_race_count(config.race_count);
    let refresh_task = tokio::spawn(refresh_scheduler_task(scheduler));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /races          - Next races to go with countdowns");
    info!("  GET  /races/stream   - Server-sent race list updates");
    info!("  GET  /filters        - Available category filters");
    info!("  POST /filter/:filter - Change category (all, greyhound, horse, harness)");
    info!("  POST /refresh        - Refresh races now");
    info!("  GET  /status         - Timer and feed status");
    info!("  GET  /health         - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    refresh_task.abort();
    tick_task.abort();
    state.shutdown();

    info!("Server shutdown complete");
    Ok(())
}
