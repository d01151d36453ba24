use crate::config::DemoConfig;
use anyhow::{Context, Result};
use std::path::Path;

pub async fn parse_config_from_file(path: impl AsRef<Path>) -> Result<DemoConfig> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let extension = path.extension().and_then(|s| s.to_str());

    match extension {
        Some("yaml") | Some("yml") => parse_yaml(&contents),
        Some("toml") => parse_toml(&contents),
        Some("json") => parse_json(&contents),
        _ => Err(anyhow::anyhow!(
            "Unsupported file format. Use .yaml, .yml, .toml, or .json"
        )),
    }
}

pub fn parse_config_from_str(content: &str, format: &str) -> Result<DemoConfig> {
    match format.to_lowercase().as_str() {
        "yaml" | "yml" => parse_yaml(content),
        "toml" => parse_toml(content),
        "json" => parse_json(content),
        _ => Err(anyhow::anyhow!("Unsupported format: {}", format)),
    }
}

fn parse_yaml(content: &str) -> Result<DemoConfig> {
    let config: DemoConfig = serde_yaml::from_str(content)?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    Ok(config)
}

fn parse_toml(content: &str) -> Result<DemoConfig> {
    let config: DemoConfig = toml::from_str(content)?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    Ok(config)
}

fn parse_json(content: &str) -> Result<DemoConfig> {
    let config: DemoConfig = serde_json::from_str(content)?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    Ok(config)
}
