//! Error types shared across the server.
//!
//! Every failure that happens while servicing a single connection is caught
//! by the connection lifecycle and turned into a response; only
//! [`TransportError::Bind`] is fatal to the process.

use std::io;

/// Socket level failures: bind, accept, read and write.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// Peer closed the stream before sending anything.
    #[error("peer closed the connection")]
    PeerClosed,
}

/// The request line could not be turned into a [`Request`](crate::http::request::Request).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),
}

/// Static resource lookup failures.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// Missing or unreadable; maps to 404.
    #[error("resource {key:?} unavailable: {source}")]
    Unavailable {
        key: String,
        #[source]
        source: io::Error,
    },

    /// Anything else that went wrong while resolving; maps to 500.
    #[error("internal error resolving {key:?}: {reason}")]
    Internal { key: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("worker pool is closed")]
    Closed,

    #[error("worker pool queue is full ({0} waiting)")]
    Saturated(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid config yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}
