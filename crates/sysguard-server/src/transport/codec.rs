//! Connection codec.
//!
//! - Inbound: exactly one read of at most `capacity` bytes, parsed once.
//! - Outbound: WebSocket text frames written as one contiguous buffer so a
//!   frame is either fully handed to the socket or the connection is dropped.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use sysguard_core::error::Result;
use sysguard_core::protocol::http::{parse_request, ParsedRequest};
use sysguard_core::protocol::ws::encode_text_frame;

/// Read and parse one request head.
pub async fn read_request<R>(conn: &mut R, capacity: usize) -> Result<ParsedRequest>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; capacity];
    let n = conn.read(&mut buf).await?;
    parse_request(&buf[..n], capacity)
}

/// Write `payload` as a single unmasked text frame. Returns bytes written.
pub async fn write_text_frame<W>(out: &mut W, payload: &[u8]) -> Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_text_frame(payload);
    out.write_all(&frame).await?;
    out.flush().await?;
    Ok(frame.len())
}
