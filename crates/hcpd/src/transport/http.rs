//! Just enough HTTP/1.1 for automation clients.
//!
//! One request per connection: a request line, headers, and an optional
//! `Content-Length` body. Responses always use chunked transfer encoding
//! and close the connection.

use std::io::{self, BufRead, BufReader, Read, Write};

use super::errors::TransportError;

/// Upper bound for the head and body of a request.
pub(crate) const MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Payload bytes per chunk of a chunked response.
pub(crate) const CHUNK_SIZE: usize = 1000;

/// A parsed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HttpRequest {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) body: Vec<u8>,
}

/// Response status codes the bridge emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    Ok,
    BadRequest,
    NotFound,
    ServiceUnavailable,
}

impl Status {
    fn line(self) -> &'static str {
        match self {
            Self::Ok => "200 OK",
            Self::BadRequest => "400 Bad Request",
            Self::NotFound => "404 Not Found",
            Self::ServiceUnavailable => "503 Service Unavailable",
        }
    }
}

/// Reads one request from `stream`.
///
/// Returns `Ok(None)` when the client disconnects before sending anything.
pub(crate) fn read_request<R: Read>(stream: R) -> Result<Option<HttpRequest>, TransportError> {
    let mut reader = BufReader::new(stream);
    let mut consumed = 0;

    let Some(request_line) = read_line(&mut reader, &mut consumed)? else {
        return Ok(None);
    };
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(path)) = (parts.next(), parts.next()) else {
        return Err(TransportError::malformed(format!(
            "invalid request line '{request_line}'"
        )));
    };
    let (method, path) = (method.to_owned(), path.to_owned());

    let mut content_length = 0_usize;
    loop {
        let Some(header) = read_line(&mut reader, &mut consumed)? else {
            return Err(TransportError::malformed("connection closed inside headers"));
        };
        if header.is_empty() {
            break;
        }
        let Some((name, value)) = header.split_once(':') else {
            return Err(TransportError::malformed(format!("invalid header '{header}'")));
        };
        if name.trim().eq_ignore_ascii_case("content-length") {
            content_length = value.trim().parse().map_err(|_| {
                TransportError::malformed(format!("invalid content length '{}'", value.trim()))
            })?;
        }
    }

    let total = consumed
        .checked_add(content_length)
        .ok_or(TransportError::TooLarge {
            size: usize::MAX,
            max_size: MAX_REQUEST_BYTES,
        })?;
    enforce_limit(total)?;
    let mut body = vec![0_u8; content_length];
    read_exact_with_retry(&mut reader, &mut body)?;
    Ok(Some(HttpRequest { method, path, body }))
}

// Strips the CRLF (or bare LF). `None` at end of stream.
fn read_line<R: BufRead>(
    reader: &mut R,
    consumed: &mut usize,
) -> Result<Option<String>, TransportError> {
    let mut line = Vec::new();
    let read = loop {
        match reader.read_until(b'\n', &mut line) {
            Ok(read) => break read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error.into()),
        }
    };
    if read == 0 {
        return Ok(None);
    }
    *consumed += read;
    enforce_limit(*consumed)?;
    while matches!(line.last(), Some(b'\n' | b'\r')) {
        line.pop();
    }
    String::from_utf8(line)
        .map(Some)
        .map_err(|_| TransportError::malformed("request head is not UTF-8"))
}

fn read_exact_with_retry<R: Read>(reader: &mut R, buffer: &mut [u8]) -> io::Result<()> {
    loop {
        match reader.read_exact(buffer) {
            Ok(()) => return Ok(()),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
}

fn enforce_limit(size: usize) -> Result<(), TransportError> {
    if size > MAX_REQUEST_BYTES {
        return Err(TransportError::TooLarge {
            size,
            max_size: MAX_REQUEST_BYTES,
        });
    }
    Ok(())
}

/// Writes chunked responses to a connection.
pub(crate) struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self { writer }
    }

    /// JSON body.
    pub(crate) fn write_json(&mut self, status: Status, body: &str) -> io::Result<()> {
        self.write(status, "application/json; charset=utf-8", body.as_bytes())
    }

    /// Plain text body.
    pub(crate) fn write_text(&mut self, status: Status, body: &str) -> io::Result<()> {
        self.write(status, "text/plain; charset=utf-8", body.as_bytes())
    }

    fn write(&mut self, status: Status, content_type: &str, body: &[u8]) -> io::Result<()> {
        write!(
            self.writer,
            "HTTP/1.1 {}\r\nContent-Type: {content_type}\r\nTransfer-Encoding: chunked\r\n\
             Connection: close\r\n\r\n",
            status.line()
        )?;
        for chunk in body.chunks(CHUNK_SIZE) {
            write!(self.writer, "{:X}\r\n", chunk.len())?;
            self.writer.write_all(chunk)?;
            self.writer.write_all(b"\r\n")?;
        }
        self.writer.write_all(b"0\r\n\r\n")?;
        self.writer.flush()
    }
}
