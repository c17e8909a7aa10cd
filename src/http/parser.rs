use crate::error::ParseError;
use crate::http::request::Request;

const LINE_TERMINATOR: &str = "\r\n";

/// Parses the decoded text of a single request.
///
/// Only the request line (`METHOD SP TARGET SP VERSION`) is interpreted and
/// it must hold exactly three tokens. Header lines are skipped and the last
/// `\r\n`-separated segment becomes the body; without any terminator that
/// segment is the request line itself.
pub fn parse_http_request(text: &str) -> Result<Request, ParseError> {
    let segments: Vec<&str> = text.split(LINE_TERMINATOR).collect();

    // split always yields at least one segment
    let request_line = segments[0];
    let mut parts = request_line.split_whitespace();

    let (method, path, version) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(path), Some(version), None) => (method, path, version),
        _ => return Err(ParseError::MalformedRequestLine(request_line.to_string())),
    };

    let body = segments[segments.len() - 1];

    Ok(Request {
        method: method.to_string(),
        path: path.to_string(),
        version: version.to_string(),
        body: body.to_string(),
    })
}
