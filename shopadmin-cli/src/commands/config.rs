use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use shared::config::ConsoleConfig;

/// Writes a default configuration file in `format` (`yaml` or `json`) and
/// returns its path.
pub fn generate_config(format: &str, output: Option<PathBuf>) -> Result<PathBuf> {
    let config = ConsoleConfig::with_defaults();
    let (default_name, serialized) = match format {
        "yaml" => ("shopadmin.yaml", serde_yml::to_string(&config)?),
        "json" => ("shopadmin.json", serde_json::to_string_pretty(&config)?),
        other => bail!("unsupported format '{other}'. Use 'yaml' or 'json'."),
    };

    let path = output.unwrap_or_else(|| PathBuf::from(default_name));
    fs::write(&path, serialized)
        .with_context(|| format!("failed to write configuration to {}", path.display()))?;
    Ok(path)
}
