//! Per-node shared state handed to every handler.

use std::sync::Arc;

use torr_core::NodeId;

use crate::directory::Directory;
use crate::shuffle::PeerShuffler;
use crate::store::ContentStore;
use crate::transport::Transport;

#[derive(Clone)]
pub struct NodeContext {
    /// This node's identity as the hub knows it.
    pub local: NodeId,
    pub store: ContentStore,
    pub directory: Arc<dyn Directory>,
    pub transport: Arc<dyn Transport>,
    pub shuffler: PeerShuffler,
}

impl NodeContext {
    pub fn new(
        local: NodeId,
        directory: Arc<dyn Directory>,
        transport: Arc<dyn Transport>,
        shuffler: PeerShuffler,
    ) -> Self {
        Self {
            local,
            store: ContentStore::new(),
            directory,
            transport,
            shuffler,
        }
    }

    pub fn is_local(&self, node: &NodeId) -> bool {
        self.local.same_node(node)
    }
}
