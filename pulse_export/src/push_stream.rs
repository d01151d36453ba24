//! Push export over a persistent TCP stream.
//!
//! Each snapshot travels as one length-delimited JSON frame; the receiver
//! answers every frame with an [`ExportAck`] frame. The connection is kept
//! open between flushes and dropped on any failure, so the next flush
//! reconnects.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use pulse_core::{ExportError, Exporter, Snapshot};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, info};

pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

pub fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .max_frame_length(MAX_FRAME_LENGTH)
        .new_codec()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportAck {
    pub accepted_points: usize,
}

type Connection = Framed<TcpStream, LengthDelimitedCodec>;

pub struct StreamPushExporter {
    endpoint: String,
    timeout: Duration,
    connection: Mutex<Option<Connection>>,
}

impl StreamPushExporter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
            connection: Mutex::new(None),
        }
    }

    async fn send(
        &self,
        connection: &mut Option<Connection>,
        payload: Bytes,
    ) -> Result<ExportAck, ExportError> {
        if connection.is_none() {
            let stream = TcpStream::connect(&self.endpoint)
                .await
                .map_err(|e| ExportError::Unreachable(format!("{}: {}", self.endpoint, e)))?;
            stream.set_nodelay(true)?;
            info!("Connected to collector at {}", self.endpoint);
            *connection = Some(Framed::new(stream, frame_codec()));
        }

        let Some(framed) = connection.as_mut() else {
            return Err(ExportError::Unreachable(self.endpoint.clone()));
        };

        framed.send(payload).await?;

        let frame = framed.next().await.ok_or_else(|| {
            ExportError::Unreachable(format!(
                "{} closed the stream before acknowledging",
                self.endpoint
            ))
        })??;

        Ok(serde_json::from_slice(&frame)?)
    }
}

#[async_trait]
impl Exporter for StreamPushExporter {
    async fn export(&self, snapshot: &Snapshot) -> Result<(), ExportError> {
        let payload = Bytes::from(serde_json::to_vec(snapshot)?);
        let mut connection = self.connection.lock().await;

        let send = self.send(&mut connection, payload);
        let result = match tokio::time::timeout(self.timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(ExportError::Timeout(self.timeout)),
        };

        match result {
            Ok(ack) => {
                debug!(
                    "Collector at {} accepted {} points",
                    self.endpoint, ack.accepted_points
                );
                Ok(())
            }
            Err(e) => {
                *connection = None;
                Err(e)
            }
        }
    }

    fn name(&self) -> &'static str {
        "grpc"
    }

    async fn shutdown(&self) -> Result<(), ExportError> {
        if let Some(mut framed) = self.connection.lock().await.take() {
            SinkExt::<Bytes>::close(&mut framed).await?;
        }
        Ok(())
    }
}
