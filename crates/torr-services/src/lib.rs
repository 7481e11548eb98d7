//! torr-services: request handlers and the distributed coordinators.
//!
//! Everything here is transport-agnostic. Outbound exchanges go through the
//! `Transport` trait and hub queries through `Directory`; torrd supplies the
//! TCP implementations.

pub mod chunk_serve;
pub mod context;
pub mod directory;
pub mod local_search;
pub mod replicate;
pub mod search;
pub mod service;
pub mod shuffle;
pub mod store;
pub mod transfer;
pub mod transport;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use chunk_serve::ChunkHandler;
pub use context::NodeContext;
pub use directory::{Directory, DirectoryError, HubClient};
pub use local_search::LocalSearchHandler;
pub use replicate::ReplicationCoordinator;
pub use search::SearchCoordinator;
pub use service::RequestHandler;
pub use shuffle::PeerShuffler;
pub use store::ContentStore;
pub use transfer::{DownloadHandler, UploadHandler};
pub use transport::{Transport, TransportError};
