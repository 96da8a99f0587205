//! SysGuard native monitoring server.
//!
//! - Dashboard assets from the web root, `/health` JSON snapshot
//! - Live metrics pushed over WebSocket once per interval
//! - Metrics come from a native plugin loaded at startup

use std::process::ExitCode;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use sysguard_core::error::Result;
use sysguard_server::{config, shutdown, AppState, NativePlugin, Server};

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, class = e.class().as_str(), "sysguard-server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let explicit = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SYSGUARD_CONFIG").ok());
    let cfg = config::resolve(explicit.as_deref())?;

    // No metrics, no server.
    let plugin = Arc::new(NativePlugin::load(&cfg.plugin)?);
    let server = Server::bind(&cfg.server)?;

    let token = CancellationToken::new();
    shutdown::spawn_signal_watcher(token.clone());

    info!(
        addr = %server.local_addr(),
        web_root = %cfg.assets.web_root.display(),
        plugin = %plugin.path().display(),
        "sysguard-server starting"
    );

    let state = AppState::new(cfg, plugin.clone());
    server.run(state, token).await;

    match Arc::try_unwrap(plugin) {
        Ok(plugin) => plugin.unload()?,
        Err(_) => warn!("plugin handle still shared; leaving it loaded until exit"),
    }
    info!("sysguard-server stopped");
    Ok(())
}
