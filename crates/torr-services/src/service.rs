//! Handler trait for request-driven services.
//!
//! Every request type a node answers has exactly one handler. The daemon's
//! router owns the type -> handler map; handlers own the semantics.

use async_trait::async_trait;
use torr_core::{Message, MessageType};

#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// The request type this handler answers.
    fn request_type(&self) -> MessageType;

    /// Answer one request.
    ///
    /// Never fails: every problem is reported as a response status. A
    /// request of another type gets this handler's response type with
    /// `MalformedRequest`.
    async fn handle(&self, request: Message) -> Message;
}

/// Message for a request that reached the wrong handler.
pub(crate) fn unexpected(expected: MessageType, got: &Message) -> String {
    format!(
        "expected {:?}, received {:?}",
        expected,
        got.message_type()
    )
}
