use pulse_targets::{common, stream, CollectorState};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    common::init_tracing();

    let addr = common::listen_addr("PULSE_STREAM_COLLECTOR_ADDR", "0.0.0.0:4317");
    let listener = TcpListener::bind(&addr).await?;

    info!("Stream collector listening on {}", addr);
    info!("Point 'pulse run --exporter grpc' at this address");

    stream::serve(listener, CollectorState::new()).await
}
