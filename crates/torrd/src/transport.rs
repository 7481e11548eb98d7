//! TCP transport: one connection per exchange, length-prefixed JSON frames.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use zerocopy::AsBytes;

use torr_core::wire::{self, FrameError, FrameHeader, FRAME_HEADER_LEN, MAX_FRAME_BYTES};
use torr_core::Message;
use torr_services::{Transport, TransportError};

// ── Framing ──────────────────────────────────────────────────────────────────

/// Read one frame.
///
/// `Ok(None)` is "no message": a zero-length frame, or a close before the
/// frame was complete.
pub async fn read_frame<R>(reader: &mut R, max_frame_bytes: usize) -> Result<Option<Message>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; FRAME_HEADER_LEN];
    match reader.read_exact(&mut prefix).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let header = FrameHeader::parse(&prefix);
    if header.is_empty() {
        return Ok(None);
    }
    let length = header.length() as usize;
    if length > max_frame_bytes {
        return Err(FrameError::TooLarge(length).into());
    }

    let mut body = vec![0u8; length];
    match reader.read_exact(&mut body).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    Ok(Some(wire::decode_body(&body)?))
}

/// Write one frame, or the zero-length "no message" frame for `None`.
pub async fn write_frame<W>(writer: &mut W, message: Option<&Message>) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    match message {
        Some(message) => writer.write_all(&wire::encode_frame(message)?).await?,
        None => writer.write_all(FrameHeader::empty().as_bytes()).await?,
    }
    writer.flush().await?;
    Ok(())
}

// ── TcpTransport ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TcpTransport {
    timeout: Duration,
    max_frame_bytes: usize,
}

impl TcpTransport {
    pub fn new(timeout: Duration, max_frame_bytes: usize) -> Self {
        Self {
            timeout,
            max_frame_bytes,
        }
    }

    async fn exchange_inner(&self, message: &Message, addr: &str) -> Result<Message, TransportError> {
        let mut stream =
            TcpStream::connect(addr)
                .await
                .map_err(|source| TransportError::Connect {
                    addr: addr.to_string(),
                    source,
                })?;
        write_frame(&mut stream, Some(message)).await?;
        let reply = read_frame(&mut stream, self.max_frame_bytes).await?;
        // Close errors after a complete reply do not affect the exchange.
        let _ = stream.shutdown().await;
        reply.ok_or(TransportError::NoMessage)
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), MAX_FRAME_BYTES)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn exchange(
        &self,
        message: Message,
        host: &str,
        port: u16,
    ) -> Result<Message, TransportError> {
        let addr = format!("{host}:{port}");
        let kind = message.message_type();
        let result = match tokio::time::timeout(self.timeout, self.exchange_inner(&message, &addr)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::TimedOut(addr.clone())),
        };
        if let Err(e) = &result {
            tracing::debug!(addr = %addr, ?kind, error = %e, "exchange failed");
        }
        result
    }
}
