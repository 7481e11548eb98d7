//! Outbound transport seam.
//!
//! One exchange = connect, write one framed request, read one framed
//! response, close. The TCP implementation lives in torrd; coordinators only
//! see this trait.

use async_trait::async_trait;
use torr_core::wire::FrameError;
use torr_core::{Message, Status};

pub const PEER_UNREACHABLE: &str = "Cannot establish connection with node.";
pub const BAD_PEER_REPLY: &str = "The response is not parsable or has the wrong type.";

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("exchange with {0} timed out")]
    TimedOut(String),

    /// Zero-length frame or the peer closed before a full frame arrived.
    #[error("peer returned no message")]
    NoMessage,

    #[error(transparent)]
    Frame(#[from] FrameError),
}

impl TransportError {
    /// The peer answered, but with bytes that are not a message.
    pub fn is_unparsable(&self) -> bool {
        matches!(self, TransportError::Frame(FrameError::Decode(_)))
    }

    /// Status and message recorded against a peer whose exchange failed.
    /// A peer that answered badly is a message error; anything else is
    /// treated as unreachable.
    pub fn peer_status(&self) -> (Status, &'static str) {
        if self.is_unparsable() || matches!(self, TransportError::NoMessage) {
            (Status::MalformedRequest, BAD_PEER_REPLY)
        } else {
            (Status::NetworkError, PEER_UNREACHABLE)
        }
    }
}

/// Sends one request to `host:port` and returns the single response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn exchange(
        &self,
        message: Message,
        host: &str,
        port: u16,
    ) -> Result<Message, TransportError>;
}
