//! FundMeNot backend binary entrypoint wiring REST, AI generation, and MongoDB layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod ai;
mod config;
mod dao;
mod dto;
mod error;
mod routes;
mod services;
mod state;

use ai::gemini::{GeminiConfig, GeminiGateway};
use config::AppConfig;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let gemini_config = GeminiConfig::from_env().context("reading Gemini configuration")?;
    let gateway = GeminiGateway::new(gemini_config).context("building Gemini client")?;
    let app_state = AppState::new(AppConfig::load(), Arc::new(gateway));

    #[cfg(feature = "mongo-store")]
    spawn_storage_supervisor(app_state.clone());

    tokio::spawn(services::session_reaper::run(app_state.clone()));

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Keep a MongoDB-backed leaderboard store connected in the background.
#[cfg(feature = "mongo-store")]
fn spawn_storage_supervisor(state: state::SharedState) {
    use dao::leaderboard_store::LeaderboardStore;
    use dao::leaderboard_store::mongodb::{MongoConfig, MongoLeaderboardStore};
    use dao::storage::StorageError;

    tokio::spawn(services::storage_supervisor::run(state, move || async {
        let config = MongoConfig::from_env().await.map_err(StorageError::from)?;
        let store = MongoLeaderboardStore::connect(config)
            .await
            .map_err(StorageError::from)?;
        Ok(Arc::new(store) as Arc<dyn LeaderboardStore>)
    }));
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: state::SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
