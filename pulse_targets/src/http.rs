use crate::common::{CollectorState, HealthStatus, SnapshotSummary};
use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use pulse_core::Snapshot;
use pulse_export::METRICS_PATH;
use std::net::SocketAddr;

pub fn router(state: CollectorState) -> Router {
    Router::new()
        .route(METRICS_PATH, post(receive_metrics))
        .route("/health", get(health_check))
        .route("/latest", get(latest_snapshot))
        .with_state(state)
}

async fn receive_metrics(
    State(state): State<CollectorState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Json(snapshot): Json<Snapshot>,
) -> Json<SnapshotSummary> {
    Json(state.accept(snapshot, &peer.to_string()).await)
}

async fn health_check(State(state): State<CollectorState>) -> Json<HealthStatus> {
    Json(state.health())
}

async fn latest_snapshot(State(state): State<CollectorState>) -> impl IntoResponse {
    match state.latest().await {
        Some(snapshot) => Ok(Json(snapshot)),
        None => Err((StatusCode::NOT_FOUND, "no snapshot received yet")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{Exporter, InstrumentDescriptor, LabelSet, Registry};
    use pulse_export::HttpPushExporter;
    use std::time::Duration;
    use tokio::net::TcpListener;

    async fn spawn() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(CollectorState::new());
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap()
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_latest_is_missing_until_first_push() {
        let base = spawn().await;
        let response = reqwest::get(format!("{}/latest", base)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_push_then_read_back() {
        let base = spawn().await;

        let registry = Registry::default();
        registry
            .register(InstrumentDescriptor::counter("requests_total").build())
            .unwrap()
            .add(3.0, &LabelSet::from([("method", "GET"), ("status", "200")]))
            .unwrap();
        let snapshot = registry.collect();

        let exporter = HttpPushExporter::new(&base, Duration::from_secs(5)).unwrap();
        exporter.export(&snapshot).await.unwrap();

        let latest: Snapshot = reqwest::get(format!("{}/latest", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(latest, snapshot);

        let health: HealthStatus = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.snapshots_received, 1);
    }
}
