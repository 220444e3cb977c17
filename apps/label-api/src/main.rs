//! Label API server

use anyhow::Result;
use label_api::{build_router, ServerConfig};
use std::net::SocketAddr;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("label_api=info".parse()?)
                .add_directive("label_layout=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let config = ServerConfig::from_env()?;
    info!(
        strategy = %config.strategy,
        max_upload_bytes = config.max_upload_bytes,
        "Loaded label API configuration"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = build_router(config);

    info!("Starting label API on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
