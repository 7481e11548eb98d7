//! One-shot exchanges with a node.

use anyhow::{Context, Result};
use torr_core::{Message, Status};
use torr_services::Transport;
use torrd::TcpTransport;

/// Address of the node a command talks to.
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub async fn send(&self, request: Message) -> Result<Message> {
        TcpTransport::default()
            .exchange(request, &self.host, self.port)
            .await
            .with_context(|| {
                format!(
                    "failed to reach node at {}:{}, is torrd running?",
                    self.host, self.port
                )
            })
    }
}

/// Turn a non-success status into an error carrying the node's message.
pub fn check(status: Status, message: &str) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        anyhow::bail!("{status:?}: {message}")
    }
}

pub fn parse_hash(text: &str) -> Result<Vec<u8>> {
    hex::decode(text).with_context(|| format!("not a hex hash: {text}"))
}

pub fn unexpected(reply: &Message) -> anyhow::Error {
    anyhow::anyhow!("unexpected reply type {:?}", reply.message_type())
}
