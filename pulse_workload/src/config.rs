use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub workload: WorkloadConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_service_version")]
    pub version: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            version: default_service_version(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadConfig {
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    /// Pause between two synthetic events.
    #[serde(with = "humantime_serde", default = "default_event_interval")]
    pub interval: Duration,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            interval: default_event_interval(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub exporter: ExporterKind,
    #[serde(with = "humantime_serde", default = "default_flush_interval")]
    pub flush_interval: Duration,
    #[serde(with = "humantime_serde", default = "default_export_timeout")]
    pub timeout: Duration,
    #[serde(default)]
    pub console_format: ConsoleFormat,
    #[serde(default = "default_grpc_endpoint")]
    pub grpc_endpoint: String,
    #[serde(default = "default_http_endpoint")]
    pub http_endpoint: String,
    #[serde(default = "default_pull_port")]
    pub pull_port: u16,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            exporter: ExporterKind::default(),
            flush_interval: default_flush_interval(),
            timeout: default_export_timeout(),
            console_format: ConsoleFormat::default(),
            grpc_endpoint: default_grpc_endpoint(),
            http_endpoint: default_http_endpoint(),
            pull_port: default_pull_port(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExporterKind {
    #[default]
    Console,
    Grpc,
    Http,
    Pull,
}

impl ExporterKind {
    pub const ALL: [ExporterKind; 4] = [
        ExporterKind::Console,
        ExporterKind::Grpc,
        ExporterKind::Http,
        ExporterKind::Pull,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExporterKind::Console => "console",
            ExporterKind::Grpc => "grpc",
            ExporterKind::Http => "http",
            ExporterKind::Pull => "pull",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExporterKind::Console => "print each snapshot to stdout",
            ExporterKind::Grpc => "push length-delimited frames over a persistent TCP stream",
            ExporterKind::Http => "push JSON snapshots with HTTP POST",
            ExporterKind::Pull => "serve live metrics for scrapers on /metrics",
        }
    }
}

impl fmt::Display for ExporterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExporterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" | "stdout" => Ok(ExporterKind::Console),
            "grpc" | "otlp-grpc" => Ok(ExporterKind::Grpc),
            "http" | "otlp-http" => Ok(ExporterKind::Http),
            "pull" | "prometheus" => Ok(ExporterKind::Pull),
            other => Err(format!("Unknown exporter '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ConsoleFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ConsoleFormat::Text),
            "json" => Ok(ConsoleFormat::Json),
            other => Err(format!("Unknown console format '{}'", other)),
        }
    }
}

impl DemoConfig {
    pub fn builder() -> DemoConfigBuilder {
        DemoConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.service.name.is_empty() {
            return Err("Service name cannot be empty".to_string());
        }

        if self.workload.iterations == 0 {
            return Err("Workload must run at least one iteration".to_string());
        }

        if self.export.flush_interval.is_zero() {
            return Err("Flush interval must be > 0".to_string());
        }

        if self.export.timeout.is_zero() {
            return Err("Export timeout must be > 0".to_string());
        }

        match self.export.exporter {
            ExporterKind::Grpc if self.export.grpc_endpoint.is_empty() => {
                Err("gRPC exporter needs an endpoint".to_string())
            }
            ExporterKind::Http if !self.export.http_endpoint.starts_with("http") => Err(format!(
                "HTTP endpoint '{}' must start with http:// or https://",
                self.export.http_endpoint
            )),
            ExporterKind::Pull if self.export.pull_port == 0 => {
                Err("Pull exporter needs a non-zero port".to_string())
            }
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct DemoConfigBuilder {
    config: DemoConfig,
}

impl DemoConfigBuilder {
    pub fn service(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.config.service = ServiceConfig {
            name: name.into(),
            version: version.into(),
        };
        self
    }

    pub fn iterations(mut self, iterations: u64) -> Self {
        self.config.workload.iterations = iterations;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.workload.interval = interval;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.workload.seed = Some(seed);
        self
    }

    pub fn exporter(mut self, exporter: ExporterKind) -> Self {
        self.config.export.exporter = exporter;
        self
    }

    pub fn flush_interval(mut self, flush_interval: Duration) -> Self {
        self.config.export.flush_interval = flush_interval;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.export.timeout = timeout;
        self
    }

    pub fn console_format(mut self, format: ConsoleFormat) -> Self {
        self.config.export.console_format = format;
        self
    }

    pub fn grpc_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.export.grpc_endpoint = endpoint.into();
        self
    }

    pub fn http_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.export.http_endpoint = endpoint.into();
        self
    }

    pub fn pull_port(mut self, port: u16) -> Self {
        self.config.export.pull_port = port;
        self
    }

    pub fn build(self) -> DemoConfig {
        self.config
    }
}

fn default_service_name() -> String {
    "otel-demo".to_string()
}

fn default_service_version() -> String {
    "1.0.0".to_string()
}

fn default_iterations() -> u64 {
    100
}

fn default_event_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_flush_interval() -> Duration {
    Duration::from_secs(3)
}

fn default_export_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_grpc_endpoint() -> String {
    "127.0.0.1:4317".to_string()
}

fn default_http_endpoint() -> String {
    "http://127.0.0.1:4318".to_string()
}

fn default_pull_port() -> u16 {
    2112
}

pub(crate) mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_demo() {
        let config = DemoConfig::default();

        assert_eq!(config.service.name, "otel-demo");
        assert_eq!(config.workload.iterations, 100);
        assert_eq!(config.workload.interval, Duration::from_secs(2));
        assert_eq!(config.export.exporter, ExporterKind::Console);
        assert_eq!(config.export.flush_interval, Duration::from_secs(3));
        assert_eq!(config.export.grpc_endpoint, "127.0.0.1:4317");
        assert_eq!(config.export.pull_port, 2112);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = DemoConfig::builder()
            .iterations(5)
            .interval(Duration::from_millis(10))
            .exporter(ExporterKind::Pull)
            .pull_port(9464)
            .seed(7)
            .build();

        assert_eq!(config.workload.iterations, 5);
        assert_eq!(config.workload.seed, Some(7));
        assert_eq!(config.export.exporter, ExporterKind::Pull);
        assert_eq!(config.export.pull_port, 9464);
    }

    #[test]
    fn test_validation() {
        assert!(DemoConfig::builder().iterations(0).build().validate().is_err());
        assert!(DemoConfig::builder()
            .flush_interval(Duration::ZERO)
            .build()
            .validate()
            .is_err());
        assert!(DemoConfig::builder()
            .exporter(ExporterKind::Http)
            .http_endpoint("127.0.0.1:4318")
            .build()
            .validate()
            .is_err());
        assert!(DemoConfig::builder()
            .exporter(ExporterKind::Pull)
            .pull_port(0)
            .build()
            .validate()
            .is_err());
    }

    #[test]
    fn test_exporter_kind_parsing() {
        for kind in ExporterKind::ALL {
            assert_eq!(kind.as_str().parse::<ExporterKind>(), Ok(kind));
        }
        assert_eq!("otlp-grpc".parse::<ExporterKind>(), Ok(ExporterKind::Grpc));
        assert!("carrier-pigeon".parse::<ExporterKind>().is_err());
        assert_eq!("JSON".parse::<ConsoleFormat>(), Ok(ConsoleFormat::Json));
        assert!("yaml".parse::<ConsoleFormat>().is_err());
    }
}
