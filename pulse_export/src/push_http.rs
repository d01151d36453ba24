use async_trait::async_trait;
use pulse_core::{ExportError, Exporter, Snapshot};
use std::time::Duration;
use tracing::debug;

pub const METRICS_PATH: &str = "/v1/metrics";

/// POSTs each snapshot as JSON to `{endpoint}/v1/metrics`.
pub struct HttpPushExporter {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpPushExporter {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ExportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ExportError::Unreachable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            client,
            url: metrics_url(endpoint),
            timeout,
        })
    }

    fn classify(&self, error: reqwest::Error) -> ExportError {
        if error.is_timeout() {
            ExportError::Timeout(self.timeout)
        } else {
            ExportError::Unreachable(format!("{}: {}", self.url, error))
        }
    }
}

fn metrics_url(endpoint: &str) -> String {
    let base = endpoint.trim_end_matches('/');
    if base.ends_with(METRICS_PATH) {
        base.to_string()
    } else {
        format!("{}{}", base, METRICS_PATH)
    }
}

#[async_trait]
impl Exporter for HttpPushExporter {
    async fn export(&self, snapshot: &Snapshot) -> Result<(), ExportError> {
        let response = self
            .client
            .post(&self.url)
            .json(snapshot)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExportError::Rejected(format!(
                "{} returned {}: {}",
                self.url, status, body
            )));
        }

        debug!("Pushed {} points to {}", snapshot.point_count(), self.url);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
