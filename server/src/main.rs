// PlanFlow server
// Exposes the plan-and-execute engine, single-turn chat and tool listing
// over HTTP. Configuration is read once at startup.

mod error;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use planflow_lib::utils::config;

use crate::state::AppState;

#[tokio::main]
async fn main() {
    config::load_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        log::error!("[server] {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let app_config = config::load_config()?;
    let api_key = config::api_key()?;
    let state = Arc::new(AppState::from_config(&app_config, api_key)?);

    let listener = tokio::net::TcpListener::bind(&app_config.server.bind).await?;
    log::info!(
        "[server] Listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("[server] Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("[server] Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("[server] Shutdown requested");
}
