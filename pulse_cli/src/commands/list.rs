use crate::ui;
use colored::Colorize;
use pulse_workload::{ExportConfig, ExporterKind};

pub fn execute() {
    ui::print_header("Available Exporters");

    let defaults = ExportConfig::default();
    println!("\nTotal exporters: {}\n", ExporterKind::ALL.len());

    for kind in ExporterKind::ALL {
        let target = match kind {
            ExporterKind::Console => "stdout".to_string(),
            ExporterKind::Grpc => defaults.grpc_endpoint.clone(),
            ExporterKind::Http => defaults.http_endpoint.clone(),
            ExporterKind::Pull => format!("0.0.0.0:{}", defaults.pull_port),
        };
        println!(
            "  {} {:<8} {} ({})",
            "•".green(),
            kind.as_str().bold(),
            kind.description(),
            target.dimmed()
        );
    }

    println!(
        "\n{}",
        "Use 'pulse run --exporter <name>' to select one".yellow()
    );
}
