use crate::common::CollectorState;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use pulse_core::Snapshot;
use pulse_export::{frame_codec, ExportAck};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;
use tracing::{error, info, warn};

/// Accepts framed snapshot streams until the listener fails.
pub async fn serve(listener: TcpListener, state: CollectorState) -> anyhow::Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New exporter connection from {}", addr);
                let state = state.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, state).await {
                        error!("Error handling connection from {}: {}", addr, e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, state: CollectorState) -> anyhow::Result<()> {
    let peer_addr = stream.peer_addr()?;
    let source = peer_addr.to_string();
    let mut framed = Framed::new(stream, frame_codec());
    let mut frames = 0u64;

    while let Some(frame) = framed.next().await {
        let frame = frame?;
        frames += 1;

        let snapshot: Snapshot = match serde_json::from_slice(&frame) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Dropping connection from {}: undecodable frame: {}", peer_addr, e);
                break;
            }
        };

        let summary = state.accept(snapshot, &source).await;
        let ack = ExportAck {
            accepted_points: summary.points,
        };
        framed.send(Bytes::from(serde_json::to_vec(&ack)?)).await?;
    }

    info!("Connection from {} closed after {} frames", peer_addr, frames);
    Ok(())
}
