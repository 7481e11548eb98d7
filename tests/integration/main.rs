//! torr integration test harness.
//!
//! Every test runs real nodes on loopback with ephemeral ports, plus an
//! in-test hub that speaks the registration and subnet protocol. Nothing
//! outside the test process is required.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use torr_core::message::{RegistrationResponse, SubnetResponse};
use torr_core::wire::MAX_FRAME_BYTES;
use torr_core::{Message, NodeId, Status};
use torr_services::Transport;
use torrd::transport::{read_frame, write_frame};
use torrd::{start_node, NodeSettings, RunningNode, TcpTransport};

mod search;
mod transfer;

// ── Hub ───────────────────────────────────────────────────────────────────────

/// Minimal hub: records registrations and reports every registered node as
/// a member of any subnet.
#[derive(Clone)]
pub struct TestHub {
    pub port: u16,
    members: Arc<Mutex<Vec<NodeId>>>,
    refusing: Arc<AtomicBool>,
}

impl TestHub {
    pub async fn start() -> Result<Self> {
        let socket = TcpListener::bind("127.0.0.1:0").await?;
        let hub = Self {
            port: socket.local_addr()?.port(),
            members: Arc::new(Mutex::new(Vec::new())),
            refusing: Arc::new(AtomicBool::new(false)),
        };

        let state = hub.clone();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = socket.accept().await {
                let state = state.clone();
                tokio::spawn(async move {
                    let request = read_frame(&mut stream, MAX_FRAME_BYTES).await.ok().flatten();
                    let reply = request.and_then(|r| state.answer(r));
                    let _ = write_frame(&mut stream, reply.as_ref()).await;
                });
            }
        });
        Ok(hub)
    }

    fn answer(&self, request: Message) -> Option<Message> {
        match request {
            Message::RegistrationRequest(req) => {
                self.members.lock().unwrap().push(NodeId {
                    host: "127.0.0.1".into(),
                    port: req.port,
                    owner: req.owner,
                    index: req.index,
                });
                Some(Message::RegistrationResponse(RegistrationResponse::default()))
            }
            Message::SubnetRequest(_) if self.refusing.load(Ordering::SeqCst) => Some(
                Message::SubnetResponse(SubnetResponse::failure(Status::NotFound, "subnet unknown")),
            ),
            Message::SubnetRequest(_) => Some(Message::SubnetResponse(SubnetResponse {
                nodes: self.members.lock().unwrap().clone(),
                ..Default::default()
            })),
            _ => None,
        }
    }

    /// List a member that nobody is listening for.
    pub async fn add_ghost(&self, owner: &str, index: u32) -> Result<NodeId> {
        let port = {
            let probe = TcpListener::bind("127.0.0.1:0").await?;
            probe.local_addr()?.port()
        };
        let ghost = NodeId {
            host: "127.0.0.1".into(),
            port,
            owner: owner.into(),
            index,
        };
        self.members.lock().unwrap().push(ghost.clone());
        Ok(ghost)
    }

    /// Make subnet queries fail from now on.
    pub fn refuse_subnets(&self) {
        self.refusing.store(true, Ordering::SeqCst);
    }
}

// ── Overlay ───────────────────────────────────────────────────────────────────

/// A hub and a set of running nodes. Listeners stop when this is dropped.
pub struct Overlay {
    pub hub: TestHub,
    pub nodes: Vec<RunningNode>,
    shutdown: broadcast::Sender<()>,
}

impl Overlay {
    /// Start a hub and `count` nodes owned by "node", indices 1..=count.
    pub async fn start(count: u32) -> Result<Self> {
        let hub = TestHub::start().await?;
        let (shutdown, _) = broadcast::channel(1);
        let mut overlay = Self {
            hub,
            nodes: Vec::new(),
            shutdown,
        };
        for index in 1..=count {
            overlay.add_node("node", index).await?;
        }
        Ok(overlay)
    }

    pub async fn add_node(&mut self, owner: &str, index: u32) -> Result<&RunningNode> {
        let settings = NodeSettings {
            owner: owner.into(),
            index,
            host: "127.0.0.1".into(),
            port: 0,
            hub_host: "127.0.0.1".into(),
            hub_port: self.hub.port,
            exchange_timeout: Duration::from_secs(2),
            max_frame_bytes: MAX_FRAME_BYTES,
            pool_size: 8,
            rng_seed: Some(u64::from(index)),
        };
        let node = start_node(settings, &self.shutdown)
            .await
            .with_context(|| format!("failed to start {owner}/{index}"))?;
        self.nodes.push(node);
        self.nodes.last().context("node list empty")
    }

    /// Send one request to node `i` (0-based) and return the reply.
    pub async fn ask(&self, i: usize, request: Message) -> Result<Message> {
        let node = &self.nodes[i];
        Ok(client().exchange(request, "127.0.0.1", node.addr.port()).await?)
    }
}

impl Drop for Overlay {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
    }
}

pub fn client() -> TcpTransport {
    TcpTransport::new(Duration::from_secs(5), MAX_FRAME_BYTES)
}

/// Deterministic test payload of `len` bytes.
pub fn payload(len: usize, salt: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(salt)).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_nodes_register_with_hub() {
    let overlay = Overlay::start(3).await.unwrap();
    let members = overlay.hub.members.lock().unwrap().clone();
    assert_eq!(members.len(), 3);
    for (member, node) in members.iter().zip(&overlay.nodes) {
        assert_eq!(member, &node.id, "hub should know {}", node.id);
    }
}
