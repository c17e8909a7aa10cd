/// Method name that the router serves; every other method gets a 404.
pub const GET: &str = "GET";

/// Represents a parsed request from a client.
///
/// Only the request line and the final body segment are kept. Header lines
/// are never interpreted, so nothing here exposes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The method token exactly as sent (e.g. "GET")
    pub method: String,
    /// The request target (e.g. "/index.html")
    pub path: String,
    /// Protocol version token (typically "HTTP/1.1")
    pub version: String,
    /// Last line-terminated segment of the raw input, possibly empty
    pub body: String,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<String>,
    path: Option<String>,
    version: Option<String>,
    body: String,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            path: None,
            version: None,
            body: String::new(),
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            path: self.path.ok_or("path missing")?,
            version: self.version.unwrap_or_else(|| "HTTP/1.1".to_string()),
            body: self.body,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    /// Whether this request is a `GET`. Method tokens are case-sensitive.
    pub fn is_get(&self) -> bool {
        self.method == GET
    }

    /// The target with a single leading `/` removed, used as a resource key.
    ///
    /// # Example
    ///
    /// ```
    /// # use pageserve::http::request::RequestBuilder;
    /// let req = RequestBuilder::new().method("GET").path("/a/b.txt").build().unwrap();
    /// assert_eq!(req.resource_key(), "a/b.txt");
    /// ```
    pub fn resource_key(&self) -> &str {
        self.path.strip_prefix('/').unwrap_or(&self.path)
    }
}
