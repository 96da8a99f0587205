use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use sysguard_core::error::{Result, SysGuardError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ListenSection,

    #[serde(default)]
    pub assets: AssetsSection,

    #[serde(default)]
    pub plugin: PluginConfig,

    #[serde(default)]
    pub push: PushSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ListenSection::default(),
            assets: AssetsSection::default(),
            plugin: PluginConfig::default(),
            push: PushSection::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(SysGuardError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.assets.validate()?;
        self.plugin.validate()?;
        self.push.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListenSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Maximum pending connections handed to `listen(2)`.
    #[serde(default = "default_backlog")]
    pub backlog: u32,

    /// Size of the single request read; longer heads are dropped.
    #[serde(default = "default_request_buffer_bytes")]
    pub request_buffer_bytes: usize,
}

impl Default for ListenSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            backlog: default_backlog(),
            request_buffer_bytes: default_request_buffer_bytes(),
        }
    }
}

impl ListenSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !(1..=4096).contains(&self.backlog) {
            return Err(SysGuardError::Config(
                "server.backlog must be between 1 and 4096".into(),
            ));
        }
        if !(1024..=65536).contains(&self.request_buffer_bytes) {
            return Err(SysGuardError::Config(
                "server.request_buffer_bytes must be between 1024 and 65536".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            SysGuardError::Config(format!("server.listen must be a valid SocketAddr: {e}"))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".into()
}
fn default_backlog() -> u32 {
    50
}
fn default_request_buffer_bytes() -> usize {
    sysguard_core::protocol::http::DEFAULT_REQUEST_BUFFER
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetsSection {
    #[serde(default = "default_web_root")]
    pub web_root: PathBuf,

    #[serde(default = "default_index")]
    pub index: String,

    /// Serve the index document instead of 404 for missing files.
    #[serde(default)]
    pub fallback_to_index: bool,
}

impl Default for AssetsSection {
    fn default() -> Self {
        Self {
            web_root: default_web_root(),
            index: default_index(),
            fallback_to_index: false,
        }
    }
}

impl AssetsSection {
    pub fn validate(&self) -> Result<()> {
        if self.web_root.as_os_str().is_empty() {
            return Err(SysGuardError::Config("assets.web_root must not be empty".into()));
        }
        if self.index.is_empty() || self.index.contains('/') {
            return Err(SysGuardError::Config(
                "assets.index must be a plain file name".into(),
            ));
        }
        Ok(())
    }
}

fn default_web_root() -> PathBuf {
    PathBuf::from("../web")
}
fn default_index() -> String {
    "index.html".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginConfig {
    #[serde(default = "default_plugin_path")]
    pub path: PathBuf,

    #[serde(default = "default_fetch_symbol")]
    pub fetch_symbol: String,

    #[serde(default = "default_release_symbol")]
    pub release_symbol: String,

    /// Guard every plugin call with a mutex (for non-reentrant plugins).
    #[serde(default)]
    pub serialize_calls: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            path: default_plugin_path(),
            fetch_symbol: default_fetch_symbol(),
            release_symbol: default_release_symbol(),
            serialize_calls: false,
        }
    }
}

impl PluginConfig {
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(SysGuardError::Config("plugin.path must not be empty".into()));
        }
        if self.fetch_symbol.is_empty() || self.release_symbol.is_empty() {
            return Err(SysGuardError::Config(
                "plugin symbol names must not be empty".into(),
            ));
        }
        if self.fetch_symbol == self.release_symbol {
            return Err(SysGuardError::Config(
                "plugin.fetch_symbol and plugin.release_symbol must differ".into(),
            ));
        }
        Ok(())
    }
}

fn default_plugin_path() -> PathBuf {
    PathBuf::from("plugins/libsysguard_metrics.so")
}
fn default_fetch_symbol() -> String {
    "get_metrics_json".into()
}
fn default_release_symbol() -> String {
    "free_string".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PushSection {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// How long shutdown waits for push loops before aborting them.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for PushSection {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_sessions: default_max_sessions(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl PushSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=60000).contains(&self.interval_ms) {
            return Err(SysGuardError::Config(
                "push.interval_ms must be between 100 and 60000".into(),
            ));
        }
        if self.max_sessions == 0 {
            return Err(SysGuardError::Config("push.max_sessions must be at least 1".into()));
        }
        if self.shutdown_grace_ms > 60000 {
            return Err(SysGuardError::Config(
                "push.shutdown_grace_ms must not exceed 60000".into(),
            ));
        }
        Ok(())
    }
}

fn default_interval_ms() -> u64 {
    1000
}
fn default_max_sessions() -> usize {
    256
}
fn default_shutdown_grace_ms() -> u64 {
    2000
}
