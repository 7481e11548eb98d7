//! Routes incoming requests to the handler registered for their type.

use std::collections::HashMap;
use std::sync::Arc;

use torr_core::{Message, MessageType};
use torr_services::{
    ChunkHandler, DownloadHandler, LocalSearchHandler, NodeContext, ReplicationCoordinator,
    RequestHandler, SearchCoordinator, UploadHandler,
};

/// Maps request types to handlers. Request types are disjoint, so at most
/// one handler ever answers a given message.
pub struct Router {
    handlers: HashMap<MessageType, Arc<dyn RequestHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Every request a node answers, backed by `ctx`.
    pub fn for_node(ctx: &NodeContext) -> Self {
        let mut router = Self::new();
        router.register(Arc::new(ChunkHandler::new(ctx.store.clone())));
        router.register(Arc::new(DownloadHandler::new(ctx.store.clone())));
        router.register(Arc::new(UploadHandler::new(ctx.store.clone())));
        router.register(Arc::new(LocalSearchHandler::new(ctx.store.clone())));
        router.register(Arc::new(SearchCoordinator::new(ctx.clone())));
        router.register(Arc::new(ReplicationCoordinator::new(ctx.clone())));
        router
    }

    /// Register a handler under its declared request type, replacing any
    /// previous handler for that type.
    pub fn register(&mut self, handler: Arc<dyn RequestHandler>) {
        let kind = handler.request_type();
        if self.handlers.insert(kind, handler).is_some() {
            tracing::warn!(?kind, "handler replaced");
        }
    }

    /// Answer `request`, or `None` if no handler takes its type.
    pub async fn route(&self, request: Message) -> Option<Message> {
        let kind = request.message_type();
        match self.handlers.get(&kind) {
            Some(handler) => Some(handler.handle(request).await),
            None => {
                tracing::debug!(?kind, "no handler for request type");
                None
            }
        }
    }

    pub fn handles(&self, kind: MessageType) -> bool {
        self.handlers.contains_key(&kind)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
