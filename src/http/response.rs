/// Protocol version written on every status line.
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// Status codes the server can produce.
///
/// - `Ok` (200): resource found and returned
/// - `BadRequest` (400): request line could not be parsed
/// - `NotFound` (404): missing resource or a method other than GET
/// - `InternalServerError` (500): receive failure or unexpected resolution error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 BAD REQUEST
    BadRequest,
    /// 404 NOT FOUND
    NotFound,
    /// 500 INTERNAL SERVER ERROR
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use pageserve::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the reason phrase for this status code, upper-cased as it
    /// appears on the wire.
    ///
    /// # Example
    ///
    /// ```
    /// # use pageserve::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "NOT FOUND");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "BAD REQUEST",
            StatusCode::NotFound => "NOT FOUND",
            StatusCode::InternalServerError => "INTERNAL SERVER ERROR",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// A response ready to be serialized onto the connection it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Always [`HTTP_VERSION`]
    pub version: &'static str,
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl Response {
    /// Creates a response with the given status and an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            version: HTTP_VERSION,
            status,
            body: Vec::new(),
        }
    }

    /// Replaces the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// 200 OK carrying `body`.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(StatusCode::Ok).with_body(body)
    }

    pub fn bad_request() -> Self {
        Self::new(StatusCode::BadRequest)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NotFound)
    }

    pub fn internal_error() -> Self {
        Self::new(StatusCode::InternalServerError)
    }

    /// The status line without its terminator, e.g. `HTTP/1.1 200 OK`.
    pub fn status_line(&self) -> String {
        format!("{} {}", self.version, self.status)
    }
}
