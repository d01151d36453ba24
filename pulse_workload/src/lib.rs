pub mod config;
pub mod parser;
pub mod runner;
pub mod sampler;

pub use config::{
    ConsoleFormat, DemoConfig, ExportConfig, ExporterKind, ServiceConfig, WorkloadConfig,
};
pub use parser::{parse_config_from_file, parse_config_from_str};
pub use runner::{DemoInstruments, IterationReport, WorkloadResult, WorkloadRunner};
pub use sampler::{Sample, Sampler};
