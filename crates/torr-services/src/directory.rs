//! Hub directory: registration and subnet membership.
//!
//! The hub itself is an external service. `HubClient` speaks its protocol
//! over any `Transport`.

use std::sync::Arc;

use async_trait::async_trait;
use torr_core::message::{RegistrationRequest, SubnetRequest};
use torr_core::{Message, MessageType, NodeId, Status};

use crate::transport::{Transport, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("hub unreachable: {0}")]
    Unreachable(#[from] TransportError),

    #[error("hub replied with {0:?}")]
    UnexpectedReply(MessageType),

    #[error("hub refused request ({status:?}): {message}")]
    Refused { status: Status, message: String },
}

#[async_trait]
pub trait Directory: Send + Sync {
    /// Announce a node to the hub.
    async fn register(&self, node: &NodeId) -> Result<(), DirectoryError>;

    /// Every node currently in `subnet_id`.
    async fn subnet_members(&self, subnet_id: u32) -> Result<Vec<NodeId>, DirectoryError>;
}

/// Directory backed by a hub at a fixed address.
pub struct HubClient {
    host: String,
    port: u16,
    transport: Arc<dyn Transport>,
}

impl HubClient {
    pub fn new(host: impl Into<String>, port: u16, transport: Arc<dyn Transport>) -> Self {
        Self {
            host: host.into(),
            port,
            transport,
        }
    }
}

#[async_trait]
impl Directory for HubClient {
    async fn register(&self, node: &NodeId) -> Result<(), DirectoryError> {
        let request = Message::RegistrationRequest(RegistrationRequest {
            owner: node.owner.clone(),
            index: node.index,
            port: node.port,
        });
        match self.transport.exchange(request, &self.host, self.port).await? {
            Message::RegistrationResponse(resp) if resp.status.is_success() => Ok(()),
            Message::RegistrationResponse(resp) => Err(DirectoryError::Refused {
                status: resp.status,
                message: resp.error_message,
            }),
            other => Err(DirectoryError::UnexpectedReply(other.message_type())),
        }
    }

    async fn subnet_members(&self, subnet_id: u32) -> Result<Vec<NodeId>, DirectoryError> {
        let request = Message::SubnetRequest(SubnetRequest { subnet_id });
        match self.transport.exchange(request, &self.host, self.port).await? {
            Message::SubnetResponse(resp) if resp.status.is_success() => Ok(resp.nodes),
            Message::SubnetResponse(resp) => Err(DirectoryError::Refused {
                status: resp.status,
                message: resp.error_message,
            }),
            other => Err(DirectoryError::UnexpectedReply(other.message_type())),
        }
    }
}
