use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::http::parser::parse_http_request;
use crate::http::request::Request;
use crate::http::resource::ResourceStore;
use crate::http::response::{Response, StatusCode};
use crate::http::router::Router;
use crate::http::writer::ResponseWriter;

/// An accepted stream and the address of its peer.
///
/// The stream is released by [`Connection::close`]; later calls are no-ops.
/// Dropping a connection that was never closed releases it as well.
pub struct Connection<S> {
    stream: Option<S>,
    peer: SocketAddr,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: SocketAddr) -> Self {
        Self {
            stream: Some(stream),
            peer,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Performs a single read of at most `budget` bytes and decodes it.
    ///
    /// A zero-byte read means the peer sent nothing and is reported as
    /// [`TransportError::PeerClosed`]. Bytes that are not UTF-8 fail the
    /// read with [`io::ErrorKind::InvalidData`].
    pub async fn receive(&mut self, budget: usize) -> Result<String, TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::PeerClosed)?;

        let mut buf = BytesMut::zeroed(budget);
        let n = stream.read(&mut buf[..]).await.map_err(TransportError::Read)?;

        if n == 0 {
            return Err(TransportError::PeerClosed);
        }

        buf.truncate(n);
        String::from_utf8(buf.to_vec())
            .map_err(|e| TransportError::Read(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    pub async fn send(&mut self, writer: &mut ResponseWriter) -> Result<(), TransportError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| TransportError::Write(io::ErrorKind::NotConnected.into()))?;
        writer.write_to_stream(stream).await
    }

    /// Shuts down and releases the stream. Returns `false` if it was already
    /// closed.
    pub async fn close(&mut self) -> bool {
        let Some(mut stream) = self.stream.take() else {
            return false;
        };

        if let Err(e) = stream.shutdown().await {
            debug!(peer = %self.peer, error = %e, "shutdown failed");
        }
        debug!(peer = %self.peer, "connection closed");
        true
    }
}

impl<S> Drop for Connection<S> {
    fn drop(&mut self) {
        if self.stream.take().is_some() {
            debug!(peer = %self.peer, "connection released on drop");
        }
    }
}

pub enum LifecycleState {
    Receiving,
    Parsing(String),
    Handling(Request),
    Sending(ResponseWriter, StatusCode),
    Closed,
}

/// How a lifecycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleOutcome {
    pub peer: SocketAddr,
    /// Status of the response that was attempted, if any.
    pub status: Option<StatusCode>,
    /// Whether the whole response reached the socket.
    pub delivered: bool,
}

/// Drives one connection through receive, parse, handle, send and close.
///
/// Failures never escape `run`: a read or decode failure becomes a 500 and
/// a parse failure a 400, both sent best-effort. Write failures are logged
/// and not retried. The connection is closed exactly once on every path.
pub struct Lifecycle<S, R> {
    conn: Connection<S>,
    router: Arc<Router<R>>,
    read_budget: usize,
    state: LifecycleState,
}

impl<S, R> Lifecycle<S, R>
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: ResourceStore,
{
    pub fn new(conn: Connection<S>, router: Arc<Router<R>>, read_budget: usize) -> Self {
        Self {
            conn,
            router,
            read_budget,
            state: LifecycleState::Receiving,
        }
    }

    pub async fn run(mut self) -> LifecycleOutcome {
        let peer = self.conn.peer();
        let mut outcome = LifecycleOutcome {
            peer,
            status: None,
            delivered: false,
        };

        loop {
            match std::mem::replace(&mut self.state, LifecycleState::Closed) {
                LifecycleState::Receiving => {
                    self.state = match self.conn.receive(self.read_budget).await {
                        Ok(raw) => {
                            debug!(peer = %peer, bytes = raw.len(), "request received");
                            LifecycleState::Parsing(raw)
                        }
                        Err(e) => {
                            warn!(peer = %peer, error = %e, "receive failed");
                            Self::sending(Response::internal_error())
                        }
                    };
                }

                LifecycleState::Parsing(raw) => {
                    self.state = match parse_http_request(&raw) {
                        Ok(req) => LifecycleState::Handling(req),
                        Err(e) => {
                            warn!(peer = %peer, error = %e, "parse failed");
                            Self::sending(Response::bad_request())
                        }
                    };
                }

                LifecycleState::Handling(req) => {
                    let response = self.router.handle(&req).await;
                    debug!(
                        peer = %peer,
                        method = %req.method,
                        path = %req.path,
                        status = response.status.as_u16(),
                        "request handled"
                    );
                    self.state = Self::sending(response);
                }

                LifecycleState::Sending(mut writer, status) => {
                    outcome.status = Some(status);
                    match self.conn.send(&mut writer).await {
                        Ok(()) => {
                            outcome.delivered = true;
                            info!(peer = %peer, status = %status, "response sent");
                        }
                        Err(e) => {
                            warn!(
                                peer = %peer,
                                status = %status,
                                unsent = writer.remaining(),
                                error = %e,
                                "response not delivered"
                            );
                        }
                    }
                    // state is already Closed
                }

                LifecycleState::Closed => {
                    self.conn.close().await;
                    break;
                }
            }
        }

        outcome
    }

    fn sending(response: Response) -> LifecycleState {
        let status = response.status;
        LifecycleState::Sending(ResponseWriter::new(&response), status)
    }
}
