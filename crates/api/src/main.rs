use anyhow::Context;
use tracing::info;

use letmebuy_api::{app, config::ApiConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    letmebuy_observability::init();

    let config = ApiConfig::from_env()?;
    let repositories = app::services::connect(&config)
        .await
        .context("failed to initialise storage")?;
    let app = app::build_app(config.jwt_secret.as_bytes(), repositories);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!(addr = %listener.local_addr()?, profile = %config.profile, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
