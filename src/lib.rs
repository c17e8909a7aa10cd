//! pageserve - Minimal concurrent static page server
//!
//! Core library: one request per connection, handled on a bounded worker pool.

pub mod config;
pub mod error;
pub mod http;
pub mod server;
