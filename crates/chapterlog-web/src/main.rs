use std::net::SocketAddr;

use chapterlog_web::{AppState, ServerConfig, app};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "chapterlog_web=debug,chapterlog_core=info,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    tracing::debug!(
        db = %config.db_path,
        catalog = %config.catalog.base_url,
        "Loaded configuration"
    );

    let port = config.port;
    let state = AppState::open(config).await?;
    let _sweeper = state.spawn_session_sweeper();

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting chapterlog on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
