use tracing::{debug, error};

use crate::error::ResourceError;
use crate::http::request::Request;
use crate::http::resource::ResourceStore;
use crate::http::response::Response;

/// Maps a request to a response using a static resource store.
///
/// `GET` targets are looked up with their leading `/` stripped. Every other
/// method is answered with 404; there is no 405 distinction.
#[derive(Debug)]
pub struct Router<S> {
    store: S,
}

impl<S: ResourceStore> Router<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Never fails: every branch produces a response.
    pub async fn handle(&self, req: &Request) -> Response {
        if !req.is_get() {
            debug!(method = %req.method, path = %req.path, "method not served");
            return Response::not_found();
        }

        match self.store.fetch(req.resource_key()).await {
            Ok(contents) => Response::ok(contents),
            Err(ResourceError::Unavailable { key, source }) => {
                debug!(key = %key, error = %source, "resource unavailable");
                Response::not_found()
            }
            Err(e @ ResourceError::Internal { .. }) => {
                error!(error = %e, "resource resolution failed");
                Response::internal_error()
            }
        }
    }
}
