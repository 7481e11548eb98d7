//! Protocol messages.
//!
//! One `Message` enum multiplexes every request/response pair a node or the
//! hub understands. On the wire it is JSON, adjacently tagged:
//! `{"type": "ChunkRequest", "body": {...}}`. Byte fields travel as hex.

use serde::{Deserialize, Serialize};

// ── Status ───────────────────────────────────────────────────────────────────

/// Outcome carried by every response body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Success,
    /// Invalid client input, or a peer reply that is unparsable or of the
    /// wrong type.
    MalformedRequest,
    NotFound,
    UnableToComplete,
    /// The hub could not be reached or refused the request.
    CoordinationFailure,
    NetworkError,
}

impl Status {
    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

// ── Shared records ───────────────────────────────────────────────────────────

/// Identifies a node in the overlay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    pub host: String,
    pub port: u16,
    pub owner: String,
    pub index: u32,
}

impl NodeId {
    /// Whether two identities refer to the same node.
    ///
    /// Compares ports only: every node of an overlay is assumed to share one
    /// host. Two hosts reusing a port would be conflated.
    pub fn same_node(&self, other: &NodeId) -> bool {
        self.port == other.port
    }

    /// Ordering key for aggregated results.
    pub fn sort_key(&self) -> (&str, u32, u16) {
        (&self.owner, self.index, self.port)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}@{}:{}", self.owner, self.index, self.host, self.port)
    }
}

/// Describes one chunk of a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkInfo {
    pub index: u32,
    pub size: u32,
    #[serde(with = "hex_bytes")]
    pub hash: Vec<u8>,
}

/// Describes a stored file: its content hash and ordered chunk list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(with = "hex_bytes")]
    pub hash: Vec<u8>,
    pub size: u64,
    pub filename: String,
    #[serde(default)]
    pub chunks: Vec<ChunkInfo>,
}

// ── Hub ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub owner: String,
    pub index: u32,
    pub port: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub status: Status,
    #[serde(default)]
    pub error_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetRequest {
    pub subnet_id: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetResponse {
    pub status: Status,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub nodes: Vec<NodeId>,
}

// ── Node requests ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRequest {
    #[serde(with = "hex_bytes")]
    pub file_hash: Vec<u8>,
    /// Signed so that negative indices reach validation instead of failing
    /// to decode.
    pub chunk_index: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkResponse {
    pub status: Status,
    #[serde(default)]
    pub error_message: String,
    #[serde(default, with = "hex_bytes")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    #[serde(with = "hex_bytes")]
    pub file_hash: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResponse {
    pub status: Status,
    #[serde(default)]
    pub error_message: String,
    #[serde(default, with = "hex_bytes")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub filename: String,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: Status,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub file_info: Option<FileInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSearchRequest {
    pub regex: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSearchResponse {
    pub status: Status,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub file_info: Vec<FileInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub regex: String,
    pub subnet_id: u32,
}

/// One node's contribution to a distributed search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSearchResult {
    pub node: NodeId,
    pub status: Status,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub files: Vec<FileInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub status: Status,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub results: Vec<NodeSearchResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicateRequest {
    pub file_info: FileInfo,
    pub subnet_id: u32,
}

/// One chunk fetch attempt against one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeReplicationStatus {
    pub node: NodeId,
    pub chunk_index: u32,
    pub status: Status,
    #[serde(default)]
    pub error_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicateResponse {
    pub status: Status,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub node_status_list: Vec<NodeReplicationStatus>,
}

// ── Failure constructors ─────────────────────────────────────────────────────

macro_rules! failure_ctor {
    ($($ty:ident),* $(,)?) => {
        $(
            impl $ty {
                /// A response carrying only a status and its message.
                pub fn failure(status: Status, message: impl Into<String>) -> Self {
                    Self {
                        status,
                        error_message: message.into(),
                        ..Default::default()
                    }
                }
            }
        )*
    };
}

failure_ctor!(
    RegistrationResponse,
    SubnetResponse,
    ChunkResponse,
    DownloadResponse,
    UploadResponse,
    LocalSearchResponse,
    SearchResponse,
    ReplicateResponse,
);

// ── Message ──────────────────────────────────────────────────────────────────

/// Discriminator for `Message`. The router keys handlers by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    RegistrationRequest,
    RegistrationResponse,
    SubnetRequest,
    SubnetResponse,
    ChunkRequest,
    ChunkResponse,
    DownloadRequest,
    DownloadResponse,
    UploadRequest,
    UploadResponse,
    LocalSearchRequest,
    LocalSearchResponse,
    SearchRequest,
    SearchResponse,
    ReplicateRequest,
    ReplicateResponse,
}

/// Every message exchanged between nodes, clients and the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body")]
pub enum Message {
    RegistrationRequest(RegistrationRequest),
    RegistrationResponse(RegistrationResponse),
    SubnetRequest(SubnetRequest),
    SubnetResponse(SubnetResponse),
    ChunkRequest(ChunkRequest),
    ChunkResponse(ChunkResponse),
    DownloadRequest(DownloadRequest),
    DownloadResponse(DownloadResponse),
    UploadRequest(UploadRequest),
    UploadResponse(UploadResponse),
    LocalSearchRequest(LocalSearchRequest),
    LocalSearchResponse(LocalSearchResponse),
    SearchRequest(SearchRequest),
    SearchResponse(SearchResponse),
    ReplicateRequest(ReplicateRequest),
    ReplicateResponse(ReplicateResponse),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::RegistrationRequest(_) => MessageType::RegistrationRequest,
            Message::RegistrationResponse(_) => MessageType::RegistrationResponse,
            Message::SubnetRequest(_) => MessageType::SubnetRequest,
            Message::SubnetResponse(_) => MessageType::SubnetResponse,
            Message::ChunkRequest(_) => MessageType::ChunkRequest,
            Message::ChunkResponse(_) => MessageType::ChunkResponse,
            Message::DownloadRequest(_) => MessageType::DownloadRequest,
            Message::DownloadResponse(_) => MessageType::DownloadResponse,
            Message::UploadRequest(_) => MessageType::UploadRequest,
            Message::UploadResponse(_) => MessageType::UploadResponse,
            Message::LocalSearchRequest(_) => MessageType::LocalSearchRequest,
            Message::LocalSearchResponse(_) => MessageType::LocalSearchResponse,
            Message::SearchRequest(_) => MessageType::SearchRequest,
            Message::SearchResponse(_) => MessageType::SearchResponse,
            Message::ReplicateRequest(_) => MessageType::ReplicateRequest,
            Message::ReplicateResponse(_) => MessageType::ReplicateResponse,
        }
    }
}

// ── Hex byte fields ──────────────────────────────────────────────────────────

/// Serde adapter: `Vec<u8>` as a lowercase hex string.
pub mod hex_bytes {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(&text).map_err(D::Error::custom)
    }
}
