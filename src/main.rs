#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bookmark_web::telemetry::init();
    let cfg = bookmark_web::config::Config::load()?;

    let (app, port) = bookmark_web::build_app(cfg).await?;

    use tracing::info;
    let addr = std::net::SocketAddr::from(([0,0,0,0], port));
    info!(%addr, "server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async { tokio::signal::ctrl_c().await.ok(); })
        .await?;
    Ok(())
}
