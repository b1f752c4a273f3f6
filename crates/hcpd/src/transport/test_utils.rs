//! Test helpers for the transport module.

use std::io::{self, Cursor, Read, Write};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::net::TcpStream;

use super::ConnectionHandler;

/// Counts accepted connections without reading them.
pub(crate) struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Arc<Self>) {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Self {
            count: Arc::clone(&count),
        });
        (count, handler)
    }
}

impl ConnectionHandler for CountingHandler {
    fn handle(&self, _stream: TcpStream) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory duplex stream: reads a canned request, records the reply.
pub(crate) struct MemoryStream {
    input: Cursor<Vec<u8>>,
    output: Vec<u8>,
}

impl MemoryStream {
    pub(crate) fn new(request: &str) -> Self {
        Self {
            input: Cursor::new(request.as_bytes().to_vec()),
            output: Vec::new(),
        }
    }

    pub(crate) fn status(&self) -> u16 {
        parse_status(&self.output)
    }

    pub(crate) fn body(&self) -> String {
        decode_chunked_body(&self.output)
    }
}

impl Read for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for MemoryStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A `POST /action` request carrying `body`.
pub(crate) fn post_action(body: &str) -> String {
    format!(
        "POST /action HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\n\r\n{body}",
        body.len()
    )
}

/// Status code of a raw HTTP response.
pub(crate) fn parse_status(raw: &[u8]) -> u16 {
    let text = String::from_utf8_lossy(raw);
    text.split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("response should carry a status code")
}

/// Reassembles a chunked response body.
pub(crate) fn decode_chunked_body(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let (_, mut rest) = text
        .split_once("\r\n\r\n")
        .expect("response should have a header terminator");
    let mut body = String::new();
    loop {
        let (size, after) = rest.split_once("\r\n").expect("chunk size line");
        let size = usize::from_str_radix(size, 16).expect("hex chunk size");
        if size == 0 {
            return body;
        }
        body.push_str(&after[..size]);
        rest = &after[size + 2..];
    }
}
