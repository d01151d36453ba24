//! Exporters that deliver registry snapshots to their destinations, and the
//! wiring that pairs one exporter with a periodic flusher.

pub mod console;
pub mod memory;
pub mod pipeline;
pub mod prometheus;
pub mod pull;
pub mod push_http;
pub mod push_stream;

pub use console::{format_text, ConsoleExporter};
pub use memory::InMemoryExporter;
pub use pipeline::{build_exporter, start_pipeline};
pub use prometheus::render_prometheus;
pub use pull::PullExporter;
pub use push_http::{HttpPushExporter, METRICS_PATH};
pub use push_stream::{frame_codec, ExportAck, StreamPushExporter};
