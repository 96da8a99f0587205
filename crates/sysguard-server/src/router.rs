//! Per-connection routing (raw HTTP -> responder or WS upgrade).
//!
//! Plain HTTP exchanges complete inline and close. Upgrades answer `101` and
//! hand the connection to the push pool. Both the read and the inline response
//! give way to the shutdown token, so an idle client cannot pin the accept loop.

use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use sysguard_core::error::Result;
use sysguard_core::protocol::http::{self, classify, ParsedRequest, Route, StatusCode};

use crate::app_state::AppState;
use crate::transport::handshake::{negotiate, Handshake};
use crate::transport::pool::PushPool;
use crate::transport::{codec, ws};
use crate::{assets, ops};

/// Read one request from `stream` and answer it. Owns and closes `stream`.
pub async fn dispatch(
    mut stream: TcpStream,
    peer: SocketAddr,
    state: &AppState,
    pool: &mut PushPool,
    shutdown: &CancellationToken,
) {
    let capacity = state.cfg().server.request_buffer_bytes;
    let read = tokio::select! {
        biased;
        _ = shutdown.cancelled() => {
            debug!(%peer, "shutdown while waiting for request");
            return;
        }
        res = codec::read_request(&mut stream, capacity) => res,
    };
    let req = match read {
        Ok(req) => req,
        Err(e) => {
            debug!(%peer, error = %e, class = e.class().as_str(), "request dropped");
            return;
        }
    };

    let route = classify(&req);
    state.metrics().http_requests.inc(&[("route", route.label())]);
    debug!(%peer, route = route.label(), target = %req.target, "request");

    if let Route::Upgrade = route {
        upgrade(stream, peer, &req, state, pool, shutdown).await;
        return;
    }

    // A client that stops reading must not hold the loop past shutdown.
    let res = tokio::select! {
        biased;
        _ = shutdown.cancelled() => {
            debug!(%peer, "shutdown while responding");
            return;
        }
        res = respond(&mut stream, route, state) => res,
    };

    match res {
        Ok(status) => debug!(%peer, status = status.as_u16(), "response sent"),
        Err(e) => debug!(%peer, error = %e, class = e.class().as_str(), "response aborted"),
    }
    let _ = stream.shutdown().await;
}

async fn respond(stream: &mut TcpStream, route: Route, state: &AppState) -> Result<StatusCode> {
    match route {
        Route::Health => ops::health(stream, state).await,
        Route::Index => {
            let assets = &state.cfg().assets;
            assets::serve(stream, state.web_root(), assets, &assets.index).await
        }
        Route::Asset(rel) => assets::serve(stream, state.web_root(), &state.cfg().assets, &rel).await,
        Route::BadRequest | Route::Upgrade => {
            write_canned(stream, &http::bad_request(), StatusCode::BadRequest).await
        }
    }
}

async fn write_canned(stream: &mut TcpStream, bytes: &[u8], status: StatusCode) -> Result<StatusCode> {
    stream.write_all(bytes).await?;
    stream.flush().await?;
    Ok(status)
}

async fn upgrade(
    mut stream: TcpStream,
    peer: SocketAddr,
    req: &ParsedRequest,
    state: &AppState,
    pool: &mut PushPool,
    shutdown: &CancellationToken,
) {
    match negotiate(req, pool.has_capacity()) {
        Handshake::Reject { reason, response } => {
            state.metrics().ws_rejected.inc(&[("reason", reason)]);
            debug!(%peer, reason, active = pool.active(), "upgrade refused");
            if let Err(e) = stream.write_all(&response).await {
                debug!(%peer, reason, error = %e, "refusal response failed");
            }
            let _ = stream.shutdown().await;
        }
        Handshake::Accept(head) => {
            if let Err(e) = stream.write_all(head.as_bytes()).await {
                debug!(%peer, error = %e, "upgrade response failed");
                return;
            }
            pool.spawn(ws::run_session(stream, peer, state.clone(), shutdown.clone()));
        }
    }
}
