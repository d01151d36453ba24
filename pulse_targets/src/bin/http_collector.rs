use pulse_targets::{common, http, CollectorState};
use std::net::SocketAddr;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    common::init_tracing();

    let app = http::router(CollectorState::new());

    let addr = common::listen_addr("PULSE_HTTP_COLLECTOR_ADDR", "0.0.0.0:4318");
    info!("Starting HTTP collector on {}", addr);
    info!("Endpoints:");
    info!("  POST /v1/metrics  - Receive a snapshot");
    info!("  GET  /latest      - Last received snapshot");
    info!("  GET  /health      - Health check");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
