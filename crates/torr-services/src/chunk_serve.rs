//! Single-chunk serving: returns one chunk's raw bytes by hash and index.

use async_trait::async_trait;
use torr_core::message::{ChunkRequest, ChunkResponse};
use torr_core::{Message, MessageType, Status};

use crate::service::{unexpected, RequestHandler};
use crate::store::ContentStore;
use crate::validate::{self, Rejection, CHUNK_NOT_FOUND, FILE_NOT_FOUND};

/// Checks run in a fixed order: hash shape, index shape, file, chunk.
pub fn serve_chunk(store: &ContentStore, request: &ChunkRequest) -> ChunkResponse {
    match find_chunk(store, request) {
        Ok(data) => ChunkResponse {
            data,
            ..Default::default()
        },
        Err(rejection) => {
            tracing::debug!(
                hash = hex::encode(&request.file_hash),
                index = request.chunk_index,
                reason = rejection.message,
                "chunk request rejected"
            );
            ChunkResponse::failure(rejection.status, rejection.message)
        }
    }
}

fn find_chunk(store: &ContentStore, request: &ChunkRequest) -> Result<Vec<u8>, Rejection> {
    let hash = validate::file_hash(&request.file_hash)?;
    let index = validate::chunk_index(request.chunk_index)?;
    let file = store
        .lookup(&hash)
        .ok_or(Rejection::not_found(FILE_NOT_FOUND))?;
    // Beyond u32 no chunk can carry the index.
    let chunk = u32::try_from(index)
        .ok()
        .and_then(|index| file.chunk(index))
        .ok_or(Rejection::not_found(CHUNK_NOT_FOUND))?;
    Ok(chunk.data.to_vec())
}

pub struct ChunkHandler {
    store: ContentStore,
}

impl ChunkHandler {
    pub fn new(store: ContentStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestHandler for ChunkHandler {
    fn request_type(&self) -> MessageType {
        MessageType::ChunkRequest
    }

    async fn handle(&self, request: Message) -> Message {
        let response = match &request {
            Message::ChunkRequest(req) => serve_chunk(&self.store, req),
            other => ChunkResponse::failure(
                Status::MalformedRequest,
                unexpected(self.request_type(), other),
            ),
        };
        Message::ChunkResponse(response)
    }
}
