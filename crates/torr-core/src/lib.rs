//! torr-core: shared types, wire format and content digests.
//! All other torr crates depend on this one.

pub mod config;
pub mod digest;
pub mod message;
pub mod wire;

pub use digest::{digest, Digest, DIGEST_LEN};
pub use message::{Message, MessageType, NodeId, Status};
