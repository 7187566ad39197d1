//! Host configuration loading.
//!
//! Pure data loading: read the TOML file and map it onto
//! [`BootstrapConfig`]. Missing keys take the struct's defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use cc_core::BootstrapConfig;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/cyclecloud-bootstrap.toml";

/// Load configuration from a TOML file.
pub fn load_config(config_path: &Path) -> anyhow::Result<BootstrapConfig> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
}

/// An explicit `--config` path must exist. Without one, the default path is
/// used when present and built-in defaults otherwise.
pub fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<(BootstrapConfig, Option<PathBuf>)> {
    match explicit {
        Some(path) => Ok((load_config(path)?, Some(path.to_path_buf()))),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Ok((load_config(default)?, Some(default.to_path_buf())))
            } else {
                Ok((BootstrapConfig::default(), None))
            }
        }
    }
}
