use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use olive_relay::config::RelayConfig;
use olive_relay::dispatch::BlandDispatcher;
use olive_relay::router::build_app_router;
use olive_relay::sheets::GoogleSheetsSink;
use olive_relay::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "olive_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = RelayConfig::from_env().expect("Invalid relay configuration");
    tracing::info!(host = %config.host, port = %config.port, "Loaded relay configuration");

    // --- Upstreams ---
    let client = reqwest::Client::new();
    let sink = GoogleSheetsSink::new(&config.sheets, client.clone())
        .expect("Invalid spreadsheet configuration");
    tracing::info!(append_url = %sink.append_url(), "Spreadsheet sink ready");
    let dispatcher = BlandDispatcher::new(&config.call, client);

    let state = AppState {
        sink: Arc::new(sink),
        dispatcher: Arc::new(dispatcher),
        settings: Arc::new(config.call.settings.clone()),
    };

    let app = build_app_router(state, config.request_timeout_secs);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting relay");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Relay stopped");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
