//! torrd: the node daemon. TCP transport, request routing, and startup.

pub mod dispatch;
pub mod listener;
pub mod node;
pub mod transport;

pub use dispatch::Router;
pub use node::{start_node, NodeSettings, RunningNode};
pub use transport::TcpTransport;
