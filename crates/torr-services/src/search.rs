//! Distributed search: fans a local search out to every subnet member.
//!
//! One task per member. The coordinating node answers for itself in-process;
//! every other member is asked over the transport. All tasks are joined
//! before the response is built, and results are sorted by
//! `(owner, index, port)` so completion order never shows through.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use torr_core::message::{
    LocalSearchRequest, NodeSearchResult, SearchRequest, SearchResponse,
};
use torr_core::{Message, MessageType, NodeId, Status};

use crate::context::NodeContext;
use crate::local_search::local_search;
use crate::service::{unexpected, RequestHandler};
use crate::store::ContentStore;
use crate::transport::{Transport, BAD_PEER_REPLY};
use crate::validate;

pub const SUBNET_UNAVAILABLE: &str = "Error on subnet request.";
pub const TASK_FAILED: &str = "Search task did not complete.";

pub struct SearchCoordinator {
    ctx: NodeContext,
}

impl SearchCoordinator {
    pub fn new(ctx: NodeContext) -> Self {
        Self { ctx }
    }

    pub async fn search(&self, request: &SearchRequest) -> SearchResponse {
        if let Err(rejection) = validate::pattern(&request.regex) {
            return SearchResponse::failure(rejection.status, rejection.message);
        }

        let members = match self.ctx.directory.subnet_members(request.subnet_id).await {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!(subnet = request.subnet_id, error = %e, "subnet lookup failed");
                return SearchResponse::failure(Status::CoordinationFailure, SUBNET_UNAVAILABLE);
            }
        };

        tracing::debug!(
            regex = %request.regex,
            subnet = request.subnet_id,
            members = members.len(),
            "search fan-out"
        );

        let tasks: Vec<_> = members
            .iter()
            .cloned()
            .map(|member| {
                let local = self.ctx.is_local(&member);
                let store = self.ctx.store.clone();
                let transport = Arc::clone(&self.ctx.transport);
                let regex = request.regex.clone();
                tokio::spawn(async move {
                    if local {
                        query_local(&store, member, &regex)
                    } else {
                        query_remote(transport.as_ref(), member, regex).await
                    }
                })
            })
            .collect();

        let mut results: Vec<NodeSearchResult> = join_all(tasks)
            .await
            .into_iter()
            .zip(members)
            .map(|(joined, member)| {
                joined.unwrap_or_else(|e| {
                    tracing::error!(node = %member, error = %e, "search task failed");
                    node_failure(member, Status::UnableToComplete, TASK_FAILED)
                })
            })
            .collect();
        results.sort_by(|a, b| a.node.sort_key().cmp(&b.node.sort_key()));

        SearchResponse {
            results,
            ..Default::default()
        }
    }
}

fn query_local(store: &ContentStore, node: NodeId, regex: &str) -> NodeSearchResult {
    let resp = local_search(store, regex);
    NodeSearchResult {
        node,
        status: resp.status,
        error_message: resp.error_message,
        files: resp.file_info,
    }
}

async fn query_remote(transport: &dyn Transport, node: NodeId, regex: String) -> NodeSearchResult {
    let request = Message::LocalSearchRequest(LocalSearchRequest { regex });
    match transport.exchange(request, &node.host, node.port).await {
        Ok(Message::LocalSearchResponse(resp)) => NodeSearchResult {
            node,
            status: resp.status,
            error_message: resp.error_message,
            files: resp.file_info,
        },
        Ok(other) => {
            tracing::debug!(node = %node, reply = ?other.message_type(), "wrong reply type");
            node_failure(node, Status::MalformedRequest, BAD_PEER_REPLY)
        }
        Err(e) => {
            tracing::debug!(node = %node, error = %e, "search peer failed");
            let (status, message) = e.peer_status();
            node_failure(node, status, message)
        }
    }
}

fn node_failure(node: NodeId, status: Status, message: &str) -> NodeSearchResult {
    NodeSearchResult {
        node,
        status,
        error_message: message.to_string(),
        files: Vec::new(),
    }
}

#[async_trait]
impl RequestHandler for SearchCoordinator {
    fn request_type(&self) -> MessageType {
        MessageType::SearchRequest
    }

    async fn handle(&self, request: Message) -> Message {
        let response = match &request {
            Message::SearchRequest(req) => self.search(req).await,
            other => SearchResponse::failure(
                Status::MalformedRequest,
                unexpected(self.request_type(), other),
            ),
        };
        Message::SearchResponse(response)
    }
}
