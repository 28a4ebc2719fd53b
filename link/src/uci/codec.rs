//! Newline framing for the protocol stream.
//!
//! Same buffering scheme as `tokio_util::codec::LinesCodec`, with two
//! differences that matter for engine links: an over-long line is reported
//! and skipped without ending the stream, and invalid UTF-8 is replaced
//! instead of failing the line.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct LineCodec {
    max_length: usize,
    /// Where to resume the newline scan on the next call.
    next_index: usize,
    /// Set after an over-long line until its terminator has been skipped.
    discarding: bool,
}

impl LineCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }

    fn too_long(&self) -> CodecError {
        CodecError::LineTooLong {
            limit: self.max_length,
        }
    }
}

fn without_carriage_return(line: &[u8]) -> &[u8] {
    match line.last() {
        Some(b'\r') => &line[..line.len() - 1],
        _ => line,
    }
}

fn to_string(line: &[u8]) -> String {
    String::from_utf8_lossy(line).into_owned()
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = CodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, CodecError> {
        loop {
            // A complete line may carry a '\r' before its '\n'
            let read_to = self.max_length.saturating_add(2).min(buf.len());
            let newline = buf[self.next_index..read_to]
                .iter()
                .position(|b| *b == b'\n');

            match (self.discarding, newline) {
                (true, Some(offset)) => {
                    buf.advance(self.next_index + offset + 1);
                    self.discarding = false;
                    self.next_index = 0;
                }
                (true, None) => {
                    buf.advance(read_to);
                    self.next_index = 0;
                    if buf.is_empty() {
                        return Ok(None);
                    }
                }
                (false, Some(offset)) => {
                    let newline_index = self.next_index + offset;
                    self.next_index = 0;
                    let frame = buf.split_to(newline_index + 1);
                    let line = without_carriage_return(&frame[..frame.len() - 1]);
                    if line.len() > self.max_length {
                        return Err(self.too_long());
                    }
                    return Ok(Some(to_string(line)));
                }
                (false, None) if buf.len() > self.max_length.saturating_add(1) => {
                    self.discarding = true;
                    return Err(self.too_long());
                }
                (false, None) => {
                    self.next_index = read_to;
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, CodecError> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }
        if self.discarding {
            buf.clear();
            self.discarding = false;
            self.next_index = 0;
            return Ok(None);
        }
        if buf.is_empty() {
            return Ok(None);
        }
        // Unterminated tail at end of stream
        let frame = buf.split();
        self.next_index = 0;
        let line = without_carriage_return(&frame);
        if line.len() > self.max_length {
            return Err(self.too_long());
        }
        Ok(Some(to_string(line)))
    }
}

impl<T: AsRef<str>> Encoder<T> for LineCodec {
    type Error = CodecError;

    fn encode(&mut self, line: T, buf: &mut BytesMut) -> Result<(), CodecError> {
        let line = line.as_ref();
        buf.reserve(line.len() + 1);
        buf.put(line.as_bytes());
        buf.put_u8(b'\n');
        Ok(())
    }
}
