use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::config::{Config, ServerConfig};
use crate::error::TransportError;
use crate::http::connection::{Connection, Lifecycle};
use crate::http::resource::{FsStore, ResourceStore};
use crate::http::router::Router;
use crate::server::pool::WorkerPool;

/// Longest pause between accept retries before the error is treated as fatal.
const MAX_ACCEPT_BACKOFF_SECS: u64 = 64;

/// A bound, listening socket.
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Binds `host:port` and starts listening with the configured backlog.
    ///
    /// Failures are fatal; binding is never retried.
    pub async fn bind(cfg: &ServerConfig) -> Result<Self, TransportError> {
        let addr_str = cfg.listen_addr();
        let bind_err = |source: io::Error| TransportError::Bind {
            addr: addr_str.clone(),
            source,
        };

        let addr = tokio::net::lookup_host(&addr_str)
            .await
            .map_err(bind_err)?
            .next()
            .ok_or_else(|| bind_err(io::ErrorKind::AddrNotAvailable.into()))?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(bind_err)?;

        socket.set_reuseaddr(true).map_err(bind_err)?;
        socket.bind(addr).map_err(bind_err)?;
        let inner = socket.listen(cfg.backlog).map_err(bind_err)?;
        let local_addr = inner.local_addr().map_err(bind_err)?;

        Ok(Self { inner, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts one connection, sleeping and retrying on resource errors.
    ///
    /// Errors scoped to a single pending connection are retried at once.
    /// Anything else backs off 1s, 2s, ... up to 64s and then gives up.
    async fn accept(&self) -> Result<(TcpStream, SocketAddr), TransportError> {
        let mut backoff = 1;

        loop {
            match self.inner.accept().await {
                Ok(accepted) => return Ok(accepted),
                Err(e) if is_connection_scoped(&e) => {
                    debug!(error = %e, "pending connection dropped before accept");
                    continue;
                }
                Err(e) => {
                    if backoff > MAX_ACCEPT_BACKOFF_SECS {
                        return Err(TransportError::Accept(e));
                    }
                    error!(cause = %e, backoff_secs = backoff, "failed to accept");
                }
            }

            time::sleep(Duration::from_secs(backoff)).await;
            backoff *= 2;
        }
    }
}

fn is_connection_scoped(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}

/// Accept loop plus the worker pool it dispatches to.
pub struct Server<R> {
    listener: Listener,
    pool: WorkerPool,
    router: Arc<Router<R>>,
    read_budget: usize,
}

impl Server<FsStore> {
    /// Binds the configured address and serves files from the static root.
    pub async fn bind(cfg: &Config) -> Result<Self, TransportError> {
        let store = FsStore::from_config(&cfg.static_files);
        Self::bind_with_store(&cfg.server, store).await
    }
}

impl<R: ResourceStore> Server<R> {
    pub async fn bind_with_store(cfg: &ServerConfig, store: R) -> Result<Self, TransportError> {
        let listener = Listener::bind(cfg).await?;
        Ok(Self {
            listener,
            pool: WorkerPool::new(cfg.max_workers, cfg.max_queued),
            router: Arc::new(Router::new(store)),
            read_budget: cfg.read_buffer_size,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Serves until `shutdown` completes or accepting fails for good.
    ///
    /// On return the pool is closed to new work and the listening socket is
    /// released. Connections already handed to the pool are not awaited.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), TransportError>
    where
        F: Future<Output = ()>,
    {
        info!("Listening on {}", self.local_addr());

        let result = tokio::select! {
            res = self.accept_loop() => res,
            _ = shutdown => {
                info!("Shutdown requested");
                Ok(())
            }
        };

        if let Err(e) = &result {
            error!(cause = %e, "accept loop terminated");
        }

        self.pool.close();
        debug!(
            active = self.pool.active(),
            queued = self.pool.queued(),
            "server stopped accepting"
        );
        result
    }

    /// Like [`Server::run_until`], then waits for every connection already
    /// handed to the pool to reach its closed state.
    pub async fn serve_until<F>(self, shutdown: F) -> Result<(), TransportError>
    where
        F: Future<Output = ()>,
    {
        let pool = self.pool.clone();
        let result = self.run_until(shutdown).await;

        if pool.active() + pool.queued() > 0 {
            info!(
                active = pool.active(),
                queued = pool.queued(),
                "Waiting for in-flight connections"
            );
        }
        pool.wait().await;
        result
    }

    async fn accept_loop(&self) -> Result<(), TransportError> {
        loop {
            let (socket, peer) = self.listener.accept().await?;
            info!("Accepted connection from {}", peer);

            let conn = Connection::new(socket, peer);
            let lifecycle = Lifecycle::new(conn, self.router.clone(), self.read_budget);

            if let Err(e) = self.pool.submit(async move {
                lifecycle.run().await;
            }) {
                // The rejected lifecycle was dropped, which released the socket.
                warn!(peer = %peer, cause = %e, "connection rejected");
            }
        }
    }
}
