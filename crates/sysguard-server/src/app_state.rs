//! Shared application state for the SysGuard server.
//!
//! Built once at startup and shared by value (`Arc` inside). Read-only after
//! construction: config, web root, metrics source and counters.

use std::sync::Arc;
use std::time::Instant;

use sysguard_core::error::Result;

use crate::assets::WebRoot;
use crate::config::ServerConfig;
use crate::obs::metrics::ServerMetrics;
use crate::plugin::MetricsSource;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServerConfig,
    web_root: WebRoot,
    source: Arc<dyn MetricsSource>,
    metrics: ServerMetrics,
}

impl AppState {
    pub fn new(cfg: ServerConfig, source: Arc<dyn MetricsSource>) -> Self {
        let web_root = WebRoot::open(&cfg.assets.web_root);
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                web_root,
                source,
                metrics: ServerMetrics::default(),
            }),
        }
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn web_root(&self) -> &WebRoot {
        &self.inner.web_root
    }

    pub fn source(&self) -> &dyn MetricsSource {
        self.inner.source.as_ref()
    }

    pub fn metrics(&self) -> &ServerMetrics {
        &self.inner.metrics
    }

    /// Fetch one metrics document, recording latency and failures under `path`
    /// (`"http"` or `"ws"`).
    pub async fn fetch_metrics(&self, path: &'static str) -> Result<String> {
        let started = Instant::now();
        let res = self.inner.source.fetch().await;
        self.inner.metrics.plugin_fetch_duration.observe(started.elapsed());
        if res.is_err() {
            self.inner.metrics.plugin_fetch_errors.inc(&[("path", path)]);
        }
        res
    }
}
