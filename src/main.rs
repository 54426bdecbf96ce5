use checkin_tracker::{
    AppState, BackendConfig, Config, Gateway, Leaderboard, MemoryGateway, PostgrestGateway,
    load_data, router,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;

    let gateway: Arc<dyn Gateway> = match &config.backend {
        BackendConfig::Postgrest { url, anon_key } => {
            info!("using hosted backend at {url}");
            Arc::new(PostgrestGateway::new(url, anon_key.clone()))
        }
        BackendConfig::Memory { data_path } => {
            info!("using in-process backend at {}", data_path.display());
            let data = load_data(data_path).await;
            Arc::new(MemoryGateway::persisted(data_path.clone(), data))
        }
    };

    let leaderboard = Arc::new(Leaderboard::new(config.leaderboard_limit));
    leaderboard.refresh(gateway.as_ref()).await;
    let _refresh_task = Arc::clone(&leaderboard)
        .spawn_refresh_loop(Arc::clone(&gateway), config.leaderboard_refresh);

    let state = AppState::new(gateway, leaderboard, config.leaderboard_refresh);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
