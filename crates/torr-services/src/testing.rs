//! In-process stand-ins for the hub and the network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use torr_core::message::{RegistrationResponse, UploadRequest};
use torr_core::wire::FrameError;
use torr_core::{Message, NodeId};

use crate::chunk_serve::serve_chunk;
use crate::directory::{Directory, DirectoryError};
use crate::local_search::local_search;
use crate::store::ContentStore;
use crate::transport::{Transport, TransportError};

pub fn node(owner: &str, index: u32, port: u16) -> NodeId {
    NodeId {
        host: "127.0.0.1".into(),
        port,
        owner: owner.into(),
        index,
    }
}

fn refused(port: u16) -> TransportError {
    TransportError::Connect {
        addr: format!("127.0.0.1:{port}"),
        source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
    }
}

fn garbled() -> TransportError {
    match serde_json::from_str::<Message>("{") {
        Err(e) => TransportError::Frame(FrameError::Decode(e)),
        Ok(_) => TransportError::NoMessage,
    }
}

// ── ScriptedTransport ────────────────────────────────────────────────────────

/// Answers every exchange with the same reply and records what was sent.
pub struct ScriptedTransport {
    reply: Option<Message>,
    sent: Mutex<Vec<(Message, u16)>>,
}

impl ScriptedTransport {
    pub fn replying(reply: Message) -> Self {
        Self {
            reply: Some(reply),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reply: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(Message, u16)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn exchange(
        &self,
        message: Message,
        _host: &str,
        port: u16,
    ) -> Result<Message, TransportError> {
        self.sent.lock().unwrap().push((message, port));
        self.reply.clone().ok_or_else(|| refused(port))
    }
}

// ── FakeDirectory ────────────────────────────────────────────────────────────

pub struct FakeDirectory {
    members: Option<Vec<NodeId>>,
    registered: Mutex<Vec<NodeId>>,
}

impl FakeDirectory {
    pub fn with_members(members: Vec<NodeId>) -> Self {
        Self {
            members: Some(members),
            registered: Mutex::new(Vec::new()),
        }
    }

    /// A hub that cannot be reached.
    pub fn down() -> Self {
        Self {
            members: None,
            registered: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn register(&self, node: &NodeId) -> Result<(), DirectoryError> {
        self.registered.lock().unwrap().push(node.clone());
        Ok(())
    }

    async fn subnet_members(&self, _subnet_id: u32) -> Result<Vec<NodeId>, DirectoryError> {
        self.members
            .clone()
            .ok_or_else(|| DirectoryError::Unreachable(refused(5000)))
    }
}

// ── FakeNetwork ──────────────────────────────────────────────────────────────

/// How a fake peer behaves when contacted.
pub enum FakePeer {
    /// Answers chunk and local-search requests from its store, except that
    /// chunks listed in `withheld` are reported as not found.
    Serving {
        store: ContentStore,
        withheld: Vec<u32>,
    },
    /// Connection refused.
    Unreachable,
    /// Replies with bytes that do not decode.
    Garbled,
    /// Replies with a well-formed message of the wrong type.
    WrongType,
    /// Closes without replying.
    Silent,
    /// Behaves like the wrapped peer after a pause.
    Delayed(Duration, Box<FakePeer>),
}

impl FakePeer {
    pub fn serving(store: ContentStore) -> Self {
        FakePeer::Serving {
            store,
            withheld: Vec::new(),
        }
    }

    pub fn withholding(store: ContentStore, withheld: Vec<u32>) -> Self {
        FakePeer::Serving { store, withheld }
    }

    pub fn delayed(delay: Duration, peer: FakePeer) -> Self {
        FakePeer::Delayed(delay, Box::new(peer))
    }
}

/// A network of fake peers keyed by port. Unknown ports refuse connections.
#[derive(Default)]
pub struct FakeNetwork {
    peers: HashMap<u16, FakePeer>,
    calls: AtomicUsize,
    log: Mutex<Vec<(Message, u16)>>,
    answered: Mutex<Vec<(Message, u16)>>,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_peer(mut self, port: u16, peer: FakePeer) -> Self {
        self.peers.insert(port, peer);
        self
    }

    /// Number of exchanges attempted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<(Message, u16)> {
        self.log.lock().unwrap().clone()
    }

    /// Requests in the order their outcome was handed back.
    pub fn answered(&self) -> Vec<(Message, u16)> {
        self.answered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeNetwork {
    async fn exchange(
        &self,
        message: Message,
        _host: &str,
        port: u16,
    ) -> Result<Message, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push((message.clone(), port));

        let Some(mut peer) = self.peers.get(&port) else {
            self.answered.lock().unwrap().push((message, port));
            return Err(refused(port));
        };
        while let FakePeer::Delayed(delay, inner) = peer {
            tokio::time::sleep(*delay).await;
            peer = inner.as_ref();
        }
        self.answered.lock().unwrap().push((message.clone(), port));
        match peer {
            FakePeer::Delayed(..) => unreachable!("delays are unwrapped above"),
            FakePeer::Unreachable => Err(refused(port)),
            FakePeer::Garbled => Err(garbled()),
            FakePeer::Silent => Err(TransportError::NoMessage),
            FakePeer::WrongType => Ok(Message::RegistrationResponse(
                RegistrationResponse::default(),
            )),
            FakePeer::Serving { store, withheld } => Ok(match message {
                Message::ChunkRequest(req) => {
                    let withhold =
                        u32::try_from(req.chunk_index).is_ok_and(|i| withheld.contains(&i));
                    if withhold {
                        Message::ChunkResponse(torr_core::message::ChunkResponse::failure(
                            torr_core::Status::NotFound,
                            crate::validate::CHUNK_NOT_FOUND,
                        ))
                    } else {
                        Message::ChunkResponse(serve_chunk(store, &req))
                    }
                }
                Message::LocalSearchRequest(req) => {
                    Message::LocalSearchResponse(local_search(store, &req.regex))
                }
                _ => Message::RegistrationResponse(RegistrationResponse::default()),
            }),
        }
    }
}

/// A store holding one uploaded file.
pub fn store_with(filename: &str, data: &[u8]) -> ContentStore {
    let store = ContentStore::new();
    crate::transfer::upload(
        &store,
        &UploadRequest {
            filename: filename.into(),
            data: data.to_vec(),
        },
    );
    store
}
