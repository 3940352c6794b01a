use std::sync::Arc;

use anyhow::Context;
use wayfarer_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wayfarer_observability::init();

    let config = AppConfig::from_env()?;
    let services = wayfarer_api::app::services::build_services(&config).await?;
    let app = wayfarer_api::app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        persistent = config.use_persistent_stores,
        strategy = ?config.numbering.strategy,
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
