//! Accepting connections and dispatching them to workers.

pub mod listener;
pub mod pool;

pub use listener::{Listener, Server};
pub use pool::WorkerPool;
