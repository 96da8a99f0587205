//! Operational HTTP endpoint.
//!
//! - `/health` : one JSON metrics snapshot from the metrics source

use serde_json::json;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

use sysguard_core::error::Result;
use sysguard_core::protocol::http::{ResponseHead, StatusCode};

use crate::app_state::AppState;

fn fetch_error_json() -> String {
    json!({ "error": "Failed to get metrics" }).to_string()
}

/// Answer `GET /health`: 200 with the plugin's JSON, or 500 with an error document.
pub async fn health<W>(out: &mut W, state: &AppState) -> Result<StatusCode>
where
    W: AsyncWrite + Unpin,
{
    let (head, body) = match state.fetch_metrics("http").await {
        Ok(body) => (
            ResponseHead::new(StatusCode::Ok)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*"),
            body,
        ),
        Err(e) => {
            warn!(error = %e, source = %state.source().describe(), "health: metrics unavailable");
            (
                ResponseHead::new(StatusCode::InternalServerError)
                    .header("Content-Type", "application/json"),
                fetch_error_json(),
            )
        }
    };

    let status = head.status();
    let head = head
        .content_length(body.len() as u64)
        .header("Connection", "close")
        .encode();
    out.write_all(head.as_bytes()).await?;
    out.write_all(body.as_bytes()).await?;
    out.flush().await?;
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_is_stable() {
        assert_eq!(fetch_error_json(), r#"{"error":"Failed to get metrics"}"#);
    }
}
