pub mod model;
pub mod resolve;

use std::path::{Path, PathBuf};

use model::AppConfig;

pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;
    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file {}: {}", path.display(), e))?;
    Ok(config)
}

/// Load the config found by [`resolve::resolve_config`], or defaults when
/// there is none. Returns the file the config came from.
pub fn load_resolved(cli_file: Option<&Path>) -> anyhow::Result<(Option<PathBuf>, AppConfig)> {
    match resolve::resolve_config(cli_file)? {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let config = load_config(&path)?;
            Ok((Some(path), config))
        }
        None => Ok((None, AppConfig::default())),
    }
}
