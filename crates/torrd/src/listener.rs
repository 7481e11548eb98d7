//! Inbound connection loop.
//!
//! Each accepted connection carries exactly one request and one response.
//! A permit from the worker pool is taken before accepting, so at most
//! `pool_size` connections are served at once and further clients wait in
//! the kernel backlog.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Semaphore};

use crate::dispatch::Router;
use crate::transport::{read_frame, write_frame};

pub struct NodeListener {
    listener: TcpListener,
    router: Arc<Router>,
    permits: Arc<Semaphore>,
    request_timeout: Duration,
    max_frame_bytes: usize,
    shutdown: broadcast::Receiver<()>,
}

impl NodeListener {
    pub fn new(
        listener: TcpListener,
        router: Arc<Router>,
        pool_size: usize,
        request_timeout: Duration,
        max_frame_bytes: usize,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            listener,
            router,
            permits: Arc::new(Semaphore::new(pool_size.max(1))),
            request_timeout,
            max_frame_bytes,
            shutdown,
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(mut self) -> Result<()> {
        let addr = self.listener.local_addr()?;
        tracing::info!(%addr, workers = self.permits.available_permits(), "listening");

        loop {
            let permit = tokio::select! {
                _ = self.shutdown.recv() => break,
                permit = self.permits.clone().acquire_owned() => match permit {
                    Ok(p) => p,
                    Err(_) => break, // semaphore closed
                },
            };

            let (stream, peer) = tokio::select! {
                _ = self.shutdown.recv() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(a) => a,
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                        continue;
                    }
                },
            };

            let router = self.router.clone();
            let request_timeout = self.request_timeout;
            let max_frame_bytes = self.max_frame_bytes;
            tokio::spawn(async move {
                serve_connection(stream, peer, router, request_timeout, max_frame_bytes).await;
                drop(permit);
            });
        }

        tracing::info!(%addr, "listener shutting down");
        Ok(())
    }
}

/// Read one request, answer it, close. Anything that cannot be answered gets
/// the zero-length frame.
async fn serve_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    router: Arc<Router>,
    request_timeout: Duration,
    max_frame_bytes: usize,
) {
    let request = match tokio::time::timeout(request_timeout, read_frame(&mut stream, max_frame_bytes)).await {
        Ok(Ok(request)) => request,
        Ok(Err(e)) => {
            tracing::debug!(%peer, error = %e, "unreadable request");
            None
        }
        Err(_) => {
            tracing::debug!(%peer, "request read timed out");
            None
        }
    };

    let reply = match request {
        Some(request) => {
            let kind = request.message_type();
            tracing::debug!(%peer, ?kind, "request");
            router.route(request).await
        }
        None => None,
    };

    if let Err(e) = write_frame(&mut stream, reply.as_ref()).await {
        tracing::debug!(%peer, error = %e, "reply not delivered");
    }
}
