use crate::prometheus::{render_prometheus, CONTENT_TYPE};
use async_trait::async_trait;
use axum::{extract::State, http::header, response::IntoResponse, routing::get, Router};
use pulse_core::{CancellationToken, ExportError, Exporter, Registry, Snapshot};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

#[derive(Clone)]
struct PullState {
    registry: Arc<Registry>,
}

/// Serves live metrics on `GET /metrics` for an external scraper.
///
/// Scrapes read the registry directly, so delivery cadence is decoupled from
/// the flush interval; `export` only remembers the last flushed snapshot.
pub struct PullExporter {
    local_addr: SocketAddr,
    latest: RwLock<Option<Snapshot>>,
    token: CancellationToken,
}

impl PullExporter {
    /// Binds the listener and starts serving until `token` is cancelled or
    /// the exporter is shut down.
    pub async fn bind(
        addr: SocketAddr,
        registry: Arc<Registry>,
        token: CancellationToken,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let token = token.child_token();

        let app = router(registry);
        let shutdown = token.clone();
        tokio::spawn(async move {
            let server = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await });
            if let Err(e) = server.await {
                error!("Pull endpoint failed: {}", e);
            }
        });

        info!("Serving metrics on http://{}/metrics", local_addr);

        Ok(Self {
            local_addr,
            latest: RwLock::new(None),
            token,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn latest(&self) -> Option<Snapshot> {
        self.latest.read().await.clone()
    }
}

fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .with_state(PullState { registry })
}

async fn metrics(State(state): State<PullState>) -> impl IntoResponse {
    let snapshot = state.registry.collect();
    debug!("Scrape served {} points", snapshot.point_count());
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], render_prometheus(&snapshot))
}

async fn health() -> &'static str {
    "ok"
}

#[async_trait]
impl Exporter for PullExporter {
    async fn export(&self, snapshot: &Snapshot) -> Result<(), ExportError> {
        *self.latest.write().await = Some(snapshot.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "pull"
    }

    async fn shutdown(&self) -> Result<(), ExportError> {
        self.token.cancel();
        Ok(())
    }
}
