//! Request handling for a single accepted connection.
//!
//! # Architecture
//!
//! - **`request`** / **`parser`**: turn the raw bytes of a request into a [`request::Request`]
//! - **`response`** / **`writer`**: the status-coded response and its wire form
//! - **`resource`**: the key → bytes lookup behind `GET`
//! - **`router`**: maps a request to a response, never failing
//! - **`connection`**: owns the stream and runs the lifecycle state machine
//!
//! # Connection State Machine
//!
//! Exactly one request is served per connection:
//!
//! ```text
//!        ┌─────────────┐
//!        │  Receiving  │ ── read error / EOF ──► 500 ─┐
//!        └──────┬──────┘                              │
//!               ▼                                     │
//!        ┌─────────────┐                              │
//!        │   Parsing   │ ── malformed ─────────► 400 ─┤
//!        └──────┬──────┘                              │
//!               ▼                                     │
//!        ┌─────────────┐                              │
//!        │  Handling   │                              │
//!        └──────┬──────┘                              │
//!               ▼                                     ▼
//!        ┌─────────────┐                       ┌─────────────┐
//!        │   Sending   │ ─────────────────────►│   Closed    │
//!        └─────────────┘                       └─────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pageserve::http::connection::{Connection, Lifecycle};
//! use pageserve::http::resource::FsStore;
//! use pageserve::http::router::Router;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let router = Arc::new(Router::new(FsStore::new("pages")));
//!
//!     loop {
//!         let (socket, peer) = listener.accept().await?;
//!         let router = router.clone();
//!         tokio::spawn(async move {
//!             Lifecycle::new(Connection::new(socket, peer), router, 1024).run().await;
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod parser;
pub mod request;
pub mod resource;
pub mod response;
pub mod router;
pub mod writer;
