//! Upload and download: thin wrappers over the content store.

use async_trait::async_trait;
use torr_core::message::{DownloadRequest, DownloadResponse, UploadRequest, UploadResponse};
use torr_core::{Message, MessageType, Status};

use crate::service::{unexpected, RequestHandler};
use crate::store::ContentStore;
use crate::validate::{self, Rejection, FILE_NOT_FOUND};

pub fn upload(store: &ContentStore, request: &UploadRequest) -> UploadResponse {
    if let Err(rejection) = validate::filename(&request.filename) {
        return UploadResponse::failure(rejection.status, rejection.message);
    }
    let info = store.ingest(&request.filename, &request.data);
    UploadResponse {
        file_info: Some(info),
        ..Default::default()
    }
}

pub fn download(store: &ContentStore, request: &DownloadRequest) -> DownloadResponse {
    let found = validate::file_hash(&request.file_hash).and_then(|hash| {
        store
            .lookup(&hash)
            .ok_or(Rejection::not_found(FILE_NOT_FOUND))
    });
    match found {
        Ok(file) => DownloadResponse {
            data: file.contents(),
            ..Default::default()
        },
        Err(rejection) => DownloadResponse::failure(rejection.status, rejection.message),
    }
}

pub struct UploadHandler {
    store: ContentStore,
}

impl UploadHandler {
    pub fn new(store: ContentStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestHandler for UploadHandler {
    fn request_type(&self) -> MessageType {
        MessageType::UploadRequest
    }

    async fn handle(&self, request: Message) -> Message {
        let response = match &request {
            Message::UploadRequest(req) => upload(&self.store, req),
            other => UploadResponse::failure(
                Status::MalformedRequest,
                unexpected(self.request_type(), other),
            ),
        };
        Message::UploadResponse(response)
    }
}

pub struct DownloadHandler {
    store: ContentStore,
}

impl DownloadHandler {
    pub fn new(store: ContentStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestHandler for DownloadHandler {
    fn request_type(&self) -> MessageType {
        MessageType::DownloadRequest
    }

    async fn handle(&self, request: Message) -> Message {
        let response = match &request {
            Message::DownloadRequest(req) => download(&self.store, req),
            other => DownloadResponse::failure(
                Status::MalformedRequest,
                unexpected(self.request_type(), other),
            ),
        };
        Message::DownloadResponse(response)
    }
}
