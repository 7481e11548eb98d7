//! Local search: filename pattern match over this node's files.

use async_trait::async_trait;
use regex::Regex;
use torr_core::message::{FileInfo, LocalSearchResponse};
use torr_core::{Message, MessageType};

use crate::service::{unexpected, RequestHandler};
use crate::store::ContentStore;
use crate::validate;

/// Descriptors of every stored file whose whole name matches `pattern`.
/// Order is unspecified.
pub fn matching_files(store: &ContentStore, pattern: &Regex) -> Vec<FileInfo> {
    store
        .files()
        .iter()
        .filter(|file| pattern.is_match(&file.info().filename))
        .map(|file| file.info().clone())
        .collect()
}

/// Answer a local search. Also called in-process by the distributed search
/// when the coordinator itself is a subnet member.
pub fn local_search(store: &ContentStore, regex: &str) -> LocalSearchResponse {
    let pattern = match validate::pattern(regex) {
        Ok(p) => p,
        Err(rejection) => return LocalSearchResponse::failure(rejection.status, rejection.message),
    };
    let files = matching_files(store, &pattern);
    tracing::debug!(regex, matches = files.len(), "local search");
    LocalSearchResponse {
        file_info: files,
        ..Default::default()
    }
}

pub struct LocalSearchHandler {
    store: ContentStore,
}

impl LocalSearchHandler {
    pub fn new(store: ContentStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestHandler for LocalSearchHandler {
    fn request_type(&self) -> MessageType {
        MessageType::LocalSearchRequest
    }

    async fn handle(&self, request: Message) -> Message {
        let response = match &request {
            Message::LocalSearchRequest(req) => local_search(&self.store, &req.regex),
            other => LocalSearchResponse::failure(
                torr_core::Status::MalformedRequest,
                unexpected(self.request_type(), other),
            ),
        };
        Message::LocalSearchResponse(response)
    }
}
