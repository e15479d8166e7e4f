//! Response body consumers.
//!
//! A `ResponseBody` wraps whatever byte source the transport hands back and
//! can be consumed exactly once: buffered under a cap (`collect`) or walked
//! as a lazy sequence of chunks (`chunks`), which is also how downloads
//! drain it.

use std::fmt;
use std::io::{self, Cursor, Read};
use std::iter::FusedIterator;

use bytes::{Bytes, BytesMut};

use crate::error::{ClientError, ClientResult};

/// Default read size for `chunks`.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Single-use producer of response bytes.
pub struct ResponseBody {
    reader: Box<dyn Read>,
    chunk_size: usize,
}

impl ResponseBody {
    pub fn from_reader(reader: impl Read + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::from_reader(Cursor::new(bytes.into()))
    }

    /// Upper bound on the size of each chunk yielded by `chunks`.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Buffer the whole body. Fails with `PayloadTooLarge` as soon as more
    /// than `limit` bytes arrive; the body is never truncated.
    pub fn collect(self, limit: usize) -> ClientResult<Bytes> {
        let mut buf = Vec::new();
        self.reader
            .take((limit as u64).saturating_add(1))
            .read_to_end(&mut buf)
            .map_err(ClientError::from_io)?;
        if buf.len() > limit {
            return Err(ClientError::PayloadTooLarge { limit });
        }
        Ok(Bytes::from(buf))
    }

    /// Lazy sequence of chunks in arrival order.
    pub fn chunks(self) -> BodyChunks {
        BodyChunks {
            reader: self.reader,
            chunk_size: self.chunk_size,
            done: false,
        }
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody")
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

/// Iterator over the chunks of a response body.
///
/// Finite and not restartable: once it yields `None` or an error, every
/// later call yields `None`.
pub struct BodyChunks {
    reader: Box<dyn Read>,
    chunk_size: usize,
    done: bool,
}

impl Iterator for BodyChunks {
    type Item = ClientResult<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(n) => {
                    buf.truncate(n);
                    return Some(Ok(Bytes::from(buf)));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(ClientError::from_io(e)));
                }
            }
        }
    }
}

impl FusedIterator for BodyChunks {}

/// Concatenate chunks, in order, into one buffer.
pub fn accumulate<I>(chunks: I) -> ClientResult<Bytes>
where
    I: IntoIterator<Item = ClientResult<Bytes>>,
{
    let mut buf = BytesMut::new();
    for chunk in chunks {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}
