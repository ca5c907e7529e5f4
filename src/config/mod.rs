mod types;

pub use types::*;

use crate::context::ContextStore;
use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./imfconv.toml",
        "./config.toml",
        "~/.config/imfconv/config.toml",
        "/etc/imfconv/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    for (name, command) in &config.tools {
        if command.trim().is_empty() {
            anyhow::bail!("Tool '{}' has an empty command", name);
        }
    }

    let working_dir = config.conversion.working_dir_path();
    if !working_dir.exists() {
        tracing::warn!("Working directory does not exist: {:?}", working_dir);
    }

    Ok(())
}

/// Seed a context store from the configuration.
///
/// Tool and tmp tables load verbatim; the dynamic context starts with
/// `workingDir` and `logsDir` so descriptions can place outputs without
/// knowing the deployment layout.
pub fn build_context_store(config: &Config) -> ContextStore {
    let mut store = ContextStore::new();
    for (name, command) in &config.tools {
        store.tool_mut().add(name.as_str(), command.as_str());
    }
    for (name, value) in &config.tmp {
        store.tmp_mut().add(name.as_str(), value.as_str());
    }
    store.dynamic_mut().add(
        "workingDir",
        config.conversion.working_dir_path().display().to_string(),
        false,
    );
    store.dynamic_mut().add(
        "logsDir",
        config.conversion.logs_dir_path().display().to_string(),
        false,
    );
    store
}
