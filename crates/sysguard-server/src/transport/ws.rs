//! WebSocket push session.
//!
//! Responsibilities:
//! - Poll the metrics source once per interval
//! - Frame each document as one unfragmented text frame and send it
//! - Close on fetch failure, write failure, or shutdown
//!
//! Client frames are never read. Shutdown is only observed between frames, so
//! a frame already being written is always completed or fails on its own.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::app_state::AppState;
use crate::transport::codec::write_text_frame;

/// Why a push loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Shutdown,
    FetchFailed,
    WriteFailed,
}

impl CloseReason {
    pub fn as_str(self) -> &'static str {
        match self {
            CloseReason::Shutdown => "shutdown",
            CloseReason::FetchFailed => "fetch_failed",
            CloseReason::WriteFailed => "write_failed",
        }
    }
}

/// Poll, frame, send, sleep; repeat until something stops it.
pub async fn push_loop<W>(out: &mut W, state: &AppState, shutdown: &CancellationToken) -> CloseReason
where
    W: AsyncWrite + Unpin,
{
    let interval = Duration::from_millis(state.cfg().push.interval_ms);

    loop {
        if shutdown.is_cancelled() {
            return CloseReason::Shutdown;
        }

        let doc = match state.fetch_metrics("ws").await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, "metrics unavailable; closing session");
                return CloseReason::FetchFailed;
            }
        };

        match write_text_frame(out, doc.as_bytes()).await {
            Ok(n) => {
                state.metrics().ws_frames_sent.inc(&[]);
                debug!(bytes = n, "frame sent");
            }
            Err(e) => {
                debug!(error = %e, "peer gone");
                return CloseReason::WriteFailed;
            }
        }

        tokio::select! {
            _ = shutdown.cancelled() => return CloseReason::Shutdown,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

/// Run one upgraded connection to completion. Owns and closes `stream`.
pub async fn run_session(
    mut stream: TcpStream,
    peer: SocketAddr,
    state: AppState,
    shutdown: CancellationToken,
) {
    let span = info_span!("ws_session", %peer);
    async move {
        state.metrics().ws_sessions_active.inc();
        info!("push session open");

        let reason = push_loop(&mut stream, &state, &shutdown).await;
        let _ = stream.shutdown().await;

        state.metrics().ws_sessions_active.dec();
        info!(reason = reason.as_str(), "push session closed");
    }
    .instrument(span)
    .await
}
