//! Distributed replication: pull every chunk of a file from subnet peers.
//!
//! ── Algorithm ──
//!
//! 1. A file already held locally succeeds at once, attributed to this node.
//! 2. Validate the target descriptor, including that its chunk list is
//!    exactly `0..n` for its size, then ask the hub for the subnet.
//! 3. Draw one shuffled peer order per chunk, then spawn one task per chunk.
//!    Each task walks its order, skipping this node, until a peer serves
//!    the chunk. Every attempt is recorded.
//! 4. Join all tasks. Commit only if every chunk arrived and the payloads,
//!    concatenated in index order, have the descriptor's size and digest.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use futures::future::join_all;
use torr_core::message::{
    ChunkInfo, ChunkRequest, FileInfo, NodeReplicationStatus, ReplicateRequest,
    ReplicateResponse,
};
use torr_core::{digest, Digest, Message, MessageType, NodeId, Status};

use crate::context::NodeContext;
use crate::search::SUBNET_UNAVAILABLE;
use crate::service::{unexpected, RequestHandler};
use crate::transport::{Transport, BAD_PEER_REPLY};
use crate::validate;

pub const REPLICATION_INCOMPLETE: &str = "Could not replicate the given file.";

pub struct ReplicationCoordinator {
    ctx: NodeContext,
}

impl ReplicationCoordinator {
    pub fn new(ctx: NodeContext) -> Self {
        Self { ctx }
    }

    pub async fn replicate(&self, request: &ReplicateRequest) -> ReplicateResponse {
        let target = &request.file_info;

        if let Some(hash) = torr_core::digest::parse_digest(&target.hash) {
            if let Some(stored) = self.ctx.store.lookup(&hash) {
                tracing::debug!(hash = hex::encode(hash), "file already present");
                return ReplicateResponse {
                    node_status_list: self.attributed_locally(stored.info()),
                    ..Default::default()
                };
            }
        }

        let hash = match validate::filename(&target.filename)
            .and_then(|()| validate::file_hash(&target.hash))
            .and_then(|hash| validate::chunk_list(target).map(|()| hash))
        {
            Ok(hash) => hash,
            Err(rejection) => {
                return ReplicateResponse::failure(rejection.status, rejection.message)
            }
        };

        let members = match self.ctx.directory.subnet_members(request.subnet_id).await {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!(subnet = request.subnet_id, error = %e, "subnet lookup failed");
                return ReplicateResponse::failure(
                    Status::CoordinationFailure,
                    SUBNET_UNAVAILABLE,
                );
            }
        };
        let peers: Vec<NodeId> = members
            .into_iter()
            .filter(|n| !self.ctx.is_local(n))
            .collect();

        tracing::info!(
            hash = hex::encode(hash),
            filename = %target.filename,
            chunks = target.chunks.len(),
            peers = peers.len(),
            "replication started"
        );

        let fetched: Arc<DashMap<u32, Bytes>> = Arc::new(DashMap::new());

        // Orders are drawn here, one chunk at a time, so a seeded shuffler
        // yields the same orders regardless of task scheduling.
        let tasks: Vec<_> = target
            .chunks
            .iter()
            .map(|chunk| {
                let order = self.ctx.shuffler.shuffled(&peers);
                let transport = Arc::clone(&self.ctx.transport);
                let fetched = Arc::clone(&fetched);
                let chunk = chunk.clone();
                tokio::spawn(async move {
                    fetch_chunk(transport.as_ref(), hash, &chunk, order, &fetched).await
                })
            })
            .collect();

        let mut attempts = Vec::new();
        for (joined, chunk) in join_all(tasks).await.into_iter().zip(&target.chunks) {
            match joined {
                Ok(chunk_attempts) => attempts.extend(chunk_attempts),
                Err(e) => {
                    tracing::error!(chunk = chunk.index, error = %e, "chunk task failed")
                }
            }
        }

        let complete = target.chunks.iter().all(|c| fetched.contains_key(&c.index));
        if !complete {
            tracing::warn!(
                hash = hex::encode(hash),
                fetched = fetched.len(),
                wanted = target.chunks.len(),
                "replication incomplete"
            );
            return incomplete(attempts);
        }

        let data = assemble(&target.chunks, &fetched);
        if data.len() as u64 != target.size || digest(&data) != hash {
            tracing::warn!(
                hash = hex::encode(hash),
                bytes = data.len(),
                wanted = target.size,
                "replicated bytes do not match descriptor"
            );
            return incomplete(attempts);
        }
        self.ctx.store.ingest_replica(hash, target.clone(), &data);
        ReplicateResponse {
            node_status_list: attempts,
            ..Default::default()
        }
    }

    fn attributed_locally(&self, target: &FileInfo) -> Vec<NodeReplicationStatus> {
        target
            .chunks
            .iter()
            .map(|chunk| NodeReplicationStatus {
                node: self.ctx.local.clone(),
                chunk_index: chunk.index,
                status: Status::Success,
                error_message: String::new(),
            })
            .collect()
    }
}

fn incomplete(attempts: Vec<NodeReplicationStatus>) -> ReplicateResponse {
    let mut resp = ReplicateResponse::failure(Status::UnableToComplete, REPLICATION_INCOMPLETE);
    resp.node_status_list = attempts;
    resp
}

/// Try peers in `order` until one serves the chunk. Returns every attempt.
async fn fetch_chunk(
    transport: &dyn Transport,
    hash: Digest,
    chunk: &ChunkInfo,
    order: Vec<NodeId>,
    fetched: &DashMap<u32, Bytes>,
) -> Vec<NodeReplicationStatus> {
    let mut attempts = Vec::new();
    for peer in order {
        let request = Message::ChunkRequest(ChunkRequest {
            file_hash: hash.to_vec(),
            chunk_index: i64::from(chunk.index),
        });
        let (status, error_message, data) =
            match transport.exchange(request, &peer.host, peer.port).await {
                Ok(Message::ChunkResponse(resp)) => (resp.status, resp.error_message, resp.data),
                Ok(other) => {
                    tracing::debug!(node = %peer, reply = ?other.message_type(), "wrong reply type");
                    (Status::MalformedRequest, BAD_PEER_REPLY.to_string(), Vec::new())
                }
                Err(e) => {
                    tracing::debug!(node = %peer, chunk = chunk.index, error = %e, "chunk fetch failed");
                    let (status, message) = e.peer_status();
                    (status, message.to_string(), Vec::new())
                }
            };

        let served = status.is_success();
        attempts.push(NodeReplicationStatus {
            node: peer,
            chunk_index: chunk.index,
            status,
            error_message,
        });
        if served {
            fetched.insert(chunk.index, Bytes::from(data));
            break;
        }
    }
    attempts
}

/// Chunks are already validated as `0..n` in order.
fn assemble(chunks: &[ChunkInfo], fetched: &DashMap<u32, Bytes>) -> Vec<u8> {
    let mut data = Vec::new();
    for chunk in chunks {
        if let Some(payload) = fetched.get(&chunk.index) {
            data.extend_from_slice(payload.value());
        }
    }
    data
}

#[async_trait]
impl RequestHandler for ReplicationCoordinator {
    fn request_type(&self) -> MessageType {
        MessageType::ReplicateRequest
    }

    async fn handle(&self, request: Message) -> Message {
        let response = match &request {
            Message::ReplicateRequest(req) => self.replicate(req).await,
            other => ReplicateResponse::failure(
                Status::MalformedRequest,
                unexpected(self.request_type(), other),
            ),
        };
        Message::ReplicateResponse(response)
    }
}
