//! Listener and accept loop.
//!
//! One accept loop; plain HTTP is answered inline (a slow client delays the
//! next accept), upgrades go to the push pool. The loop races `accept()`
//! against the shutdown token, so cancellation is observed immediately.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sysguard_core::error::{Result, SysGuardError};

use crate::app_state::AppState;
use crate::config::ListenSection;
use crate::router;
use crate::transport::pool::{DrainReport, PushPool};

/// Pause after a failed `accept()` so persistent errors (e.g. EMFILE) do not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(10);

pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Bind with `SO_REUSEADDR` and the configured backlog.
    /// Must be called from inside a tokio runtime.
    pub fn bind(cfg: &ListenSection) -> Result<Self> {
        let addr = cfg.listen_addr()?;
        let bind_err = |e: std::io::Error| SysGuardError::Bind(format!("{addr}: {e}"));

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(bind_err)?;
        socket.set_reuseaddr(true).map_err(bind_err)?;
        socket.bind(addr).map_err(bind_err)?;
        let listener = socket.listen(cfg.backlog).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `shutdown` is cancelled, then close the listener and drain
    /// the push pool. `state` is dropped before returning.
    pub async fn run(self, state: AppState, shutdown: CancellationToken) -> DrainReport {
        let mut pool = PushPool::new(state.cfg().push.max_sessions);
        info!(addr = %self.local_addr, "accepting connections");

        loop {
            let accepted = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                res = self.listener.accept() => res,
            };

            match accepted {
                Ok((stream, peer)) => {
                    pool.reap();
                    router::dispatch(stream, peer, &state, &mut pool, &shutdown).await;
                }
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            }
        }

        drop(self.listener);
        info!(active = pool.active(), "listener closed; draining push sessions");

        let grace = Duration::from_millis(state.cfg().push.shutdown_grace_ms);
        let report = pool.drain(grace).await;
        info!(joined = report.joined, aborted = report.aborted, "push sessions stopped");
        debug!(counters = %state.metrics().render(), "final counters");
        report
    }
}
