use crate::ui;
use anyhow::Result;
use pulse_workload::parse_config_from_file;
use std::path::PathBuf;

pub async fn execute(config_file: PathBuf) -> Result<()> {
    ui::print_header("Validating Config");
    println!("File: {}", config_file.display());

    match parse_config_from_file(&config_file).await {
        Ok(config) => {
            ui::print_success("Config is valid!");
            println!();
            ui::print_field(
                "Service",
                format!("{} {}", config.service.name, config.service.version),
            );
            ui::print_field("Iterations", config.workload.iterations);
            ui::print_field(
                "Interval",
                humantime::format_duration(config.workload.interval),
            );
            ui::print_field("Exporter", config.export.exporter);
            ui::print_field(
                "Flush interval",
                humantime::format_duration(config.export.flush_interval),
            );
            ui::print_field(
                "Export timeout",
                humantime::format_duration(config.export.timeout),
            );

            if config.workload.interval.is_zero() {
                ui::print_warning("Zero interval: events are recorded back to back");
            }

            Ok(())
        }
        Err(e) => {
            ui::print_error("Config is invalid!");
            println!("\nError: {:#}", e);
            Err(e)
        }
    }
}
