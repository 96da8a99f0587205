//! Server config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use sysguard_core::error::{Result, SysGuardError};

pub use schema::{AssetsSection, ListenSection, PluginConfig, PushSection, ServerConfig};

/// Default config file, looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "sysguard.yaml";

pub fn load_from_file(path: impl AsRef<Path>) -> Result<ServerConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)
        .map_err(|e| SysGuardError::Config(format!("read {} failed: {e}", path.display())))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServerConfig> {
    let cfg: ServerConfig = serde_yaml::from_str(s)
        .map_err(|e| SysGuardError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load an explicit path, or fall back to built-in defaults when the default
/// file is absent. An explicit path that cannot be read is an error.
pub fn resolve(explicit: Option<&str>) -> Result<ServerConfig> {
    if let Some(path) = explicit {
        return load_from_file(path);
    }
    match fs::read_to_string(DEFAULT_CONFIG_PATH) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let cfg = ServerConfig::default();
            cfg.validate()?;
            Ok(cfg)
        }
        Err(e) => Err(SysGuardError::Config(format!(
            "read {DEFAULT_CONFIG_PATH} failed: {e}"
        ))),
    }
}
