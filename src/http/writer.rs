use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::TransportError;
use crate::http::response::Response;

/// Serializes a response as `STATUS-LINE\r\n\r\nBODY\r\n`.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let status_line = resp.status_line();
    let mut buf = Vec::with_capacity(status_line.len() + resp.body.len() + 6);

    buf.extend_from_slice(status_line.as_bytes());
    buf.extend_from_slice(b"\r\n");

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf.extend_from_slice(&resp.body);
    buf.extend_from_slice(b"\r\n");

    buf
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
        }
    }

    /// Bytes not yet written to the stream.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.written
    }

    pub async fn write_to_stream<S>(&mut self, stream: &mut S) -> Result<(), TransportError>
    where
        S: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream
                .write(&self.buffer[self.written..])
                .await
                .map_err(TransportError::Write)?;

            if n == 0 {
                return Err(TransportError::Write(std::io::ErrorKind::WriteZero.into()));
            }

            self.written += n;
        }

        stream.flush().await.map_err(TransportError::Write)
    }
}
