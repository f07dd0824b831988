use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    boltline_observability::init();

    // Fails when SESSION_SECRET is absent: the process refuses to serve
    // authenticated routes without a signing secret.
    let config = boltline_api::config::AppConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();

    let app = boltline_api::app::build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
