use anyhow::Context;
use log::{error, info};

mod audio;
mod cmds;
mod config;
mod extract;
mod routes;
mod state;
mod text;
mod tts;
mod util;

#[cfg(test)]
mod testing;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    if let Err(err) = util::logging::init() {
        eprintln!("Failed to initialise logger: {err}");
    }
    info!("Starting Reader web backend");

    if let Err(err) = run().await {
        error!("Reader web backend stopped: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    let state = AppState::initialise(&config)?;
    let app = routes::create_router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("unable to bind {}", config.bind))?;
    info!("Listening on http://{}", config.bind);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for shutdown signal: {err}");
    }
}
