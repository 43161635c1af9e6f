//! Mock generator server.
//!
//! Run from repo root: `cargo run -p mock-generator-server`
//! Settings come from the environment or a `.env` file (PORT, API_URL, DELAY, SCHEMAS_PATH, DB_PATH, ...).

use mock_generator::{app, AppState, Settings};
use std::net::SocketAddr;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mock_generator=info,tower_http=info")),
        )
        .init();
    std::panic::set_hook(Box::new(|info| {
        tracing::error!(%info, "panic");
    }));

    let settings = Settings::from_env()?;
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let api_base = settings.api_base.clone();
    let mock_base = settings.mock_base.clone();
    let state = AppState::open(settings).await?;

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            tracing::error!("port {} is already in use; set PORT to another value", addr.port());
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };
    let port = listener.local_addr()?.port();
    tracing::info!("Mock generator listening on http://127.0.0.1:{}", port);
    tracing::info!("schema API at {}/schemas, mock resources under {}/", api_base, mock_base);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown requested");
}
