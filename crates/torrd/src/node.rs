//! Node startup: bind, register with the hub, then serve.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use torr_core::config::TorrConfig;
use torr_core::NodeId;
use torr_services::{Directory, HubClient, NodeContext, PeerShuffler, Transport};

use crate::dispatch::Router;
use crate::listener::NodeListener;
use crate::transport::TcpTransport;

/// Everything one node instance needs to start.
#[derive(Debug, Clone)]
pub struct NodeSettings {
    pub owner: String,
    pub index: u32,
    pub host: String,
    /// 0 binds an ephemeral port.
    pub port: u16,
    pub hub_host: String,
    pub hub_port: u16,
    pub exchange_timeout: Duration,
    pub max_frame_bytes: usize,
    pub pool_size: usize,
    pub rng_seed: Option<u64>,
}

impl NodeSettings {
    /// Settings for instance `index` (1-based) of the configured overlay.
    /// Instance `i` listens on `base_port + i`.
    pub fn from_config(config: &TorrConfig, index: u32) -> Result<Self> {
        let port = u32::from(config.node.base_port)
            .checked_add(index)
            .and_then(|p| u16::try_from(p).ok())
            .with_context(|| format!("instance {index} has no valid port"))?;
        Ok(Self {
            owner: config.node.owner.clone(),
            index,
            host: config.node.host.clone(),
            port,
            hub_host: config.hub.host.clone(),
            hub_port: config.hub.port,
            exchange_timeout: config.transport.exchange_timeout(),
            max_frame_bytes: config.transport.max_frame_bytes,
            pool_size: config.workers.pool_size(),
            // Each instance draws its own sequence from the shared seed.
            rng_seed: config
                .replication
                .rng_seed
                .map(|seed| seed.wrapping_add(u64::from(index))),
        })
    }
}

/// A started node. Dropping it does not stop the listener; send on the
/// shutdown channel for that.
pub struct RunningNode {
    pub id: NodeId,
    pub addr: SocketAddr,
    pub context: NodeContext,
    pub task: JoinHandle<Result<()>>,
}

/// Bind the listening socket, announce the node to the hub, and start
/// serving. Registration failure aborts startup.
pub async fn start_node(
    settings: NodeSettings,
    shutdown: &broadcast::Sender<()>,
) -> Result<RunningNode> {
    let socket = TcpListener::bind((settings.host.as_str(), settings.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", settings.host, settings.port))?;
    let addr = socket.local_addr()?;

    let id = NodeId {
        host: settings.host.clone(),
        port: addr.port(),
        owner: settings.owner.clone(),
        index: settings.index,
    };

    let transport: Arc<dyn Transport> = Arc::new(TcpTransport::new(
        settings.exchange_timeout,
        settings.max_frame_bytes,
    ));
    let directory: Arc<dyn Directory> = Arc::new(HubClient::new(
        settings.hub_host.clone(),
        settings.hub_port,
        transport.clone(),
    ));

    directory.register(&id).await.with_context(|| {
        format!(
            "node {id} failed to register with hub at {}:{}",
            settings.hub_host, settings.hub_port
        )
    })?;
    tracing::info!(node = %id, hub_port = settings.hub_port, "registered with hub");

    let context = NodeContext::new(
        id.clone(),
        directory,
        transport,
        PeerShuffler::new(settings.rng_seed),
    );
    let router = Arc::new(Router::for_node(&context));
    let listener = NodeListener::new(
        socket,
        router,
        settings.pool_size,
        settings.exchange_timeout,
        settings.max_frame_bytes,
        shutdown.subscribe(),
    );
    let task = tokio::spawn(listener.run());

    Ok(RunningNode {
        id,
        addr,
        context,
        task,
    })
}
