//! Content-Length framing over byte streams
//!
//! Every message on the wire is an ASCII header block followed by a JSON body:
//!
//! ```text
//! Content-Length: <n>\r\n
//! [Other-Header: value\r\n]*
//! \r\n
//! <n bytes of UTF-8 JSON>
//! ```

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::rpc::error::FramingError;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const CONTENT_LENGTH: &str = "Content-Length";
/// Upper bound on a header block that has not been terminated yet
const MAX_HEADER_BYTES: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Parsed header block: where the body starts and how long it is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameHeader {
    body_start: usize,
    content_length: usize,
}

/// Parse the header block at the front of `buffer`.
///
/// Returns `Ok(None)` while the terminating blank line has not arrived yet.
fn parse_header(buffer: &[u8]) -> Result<Option<FrameHeader>, FramingError> {
    let Some(end) = buffer
        .windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
    else {
        if buffer.len() > MAX_HEADER_BYTES {
            return Err(FramingError::InvalidHeader);
        }
        return Ok(None);
    };

    let block = std::str::from_utf8(&buffer[..end]).map_err(|_| FramingError::InvalidHeader)?;
    if !block.is_ascii() {
        return Err(FramingError::InvalidHeader);
    }

    let mut content_length = None;
    for line in block.split("\r\n") {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
            continue;
        }

        let value = value.trim();
        let length: i64 = value
            .parse()
            .map_err(|_| FramingError::InvalidContentLength(value.to_string()))?;
        if length < 0 {
            return Err(FramingError::NegativeContentLength(length));
        }
        let length = usize::try_from(length)
            .map_err(|_| FramingError::InvalidContentLength(value.to_string()))?;
        content_length = Some(length);
    }

    let content_length = content_length.ok_or(FramingError::MissingContentLength)?;
    Ok(Some(FrameHeader {
        body_start: end + HEADER_TERMINATOR.len(),
        content_length,
    }))
}

/// Take one complete payload off the front of `buffer`.
///
/// Returns `Ok(None)` until a full header block and all of its body bytes are
/// buffered. Surplus bytes stay in `buffer` for the next call.
pub fn decode_frame(buffer: &mut Vec<u8>) -> Result<Option<Vec<u8>>, FramingError> {
    let Some(header) = parse_header(buffer)? else {
        return Ok(None);
    };

    let frame_end = header.body_start + header.content_length;
    if buffer.len() < frame_end {
        return Ok(None);
    }

    let payload = buffer[header.body_start..frame_end].to_vec();
    buffer.drain(..frame_end);
    Ok(Some(payload))
}

/// Build the header block and payload as one contiguous buffer.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let header = format!("{}: {}\r\n\r\n", CONTENT_LENGTH, payload.len());
    let mut frame = Vec::with_capacity(header.len() + payload.len());
    frame.extend_from_slice(header.as_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Reads framed payloads from an async byte stream
pub struct MessageReader<R> {
    inner: R,
    buffer: Vec<u8>,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    /// Read the next payload.
    ///
    /// Returns `Ok(None)` when the peer closes the stream on a message
    /// boundary. Cancel safe: bytes already read stay buffered.
    pub async fn read_message(&mut self) -> Result<Option<Vec<u8>>, FramingError> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            if let Some(payload) = decode_frame(&mut self.buffer)? {
                debug!("Framed payload of {} bytes", payload.len());
                return Ok(Some(payload));
            }

            let read = self.inner.read(&mut chunk).await?;
            if read == 0 {
                return self.closed();
            }
            self.buffer.extend_from_slice(&chunk[..read]);
        }
    }

    fn closed(&self) -> Result<Option<Vec<u8>>, FramingError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        match parse_header(&self.buffer)? {
            Some(header) => Err(FramingError::UnexpectedEof {
                expected: header.content_length,
                received: self.buffer.len() - header.body_start,
            }),
            None => Err(FramingError::TruncatedHeader),
        }
    }
}

/// Writes framed payloads to an async byte stream
pub struct MessageWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write header and payload in a single buffered write, then flush.
    pub async fn write_message(&mut self, payload: &[u8]) -> Result<(), FramingError> {
        let frame = encode_frame(payload);
        self.inner.write_all(&frame).await?;
        self.inner.flush().await?;
        Ok(())
    }
}
