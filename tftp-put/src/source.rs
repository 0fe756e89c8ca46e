//! Data sources feeding the transfer loop.
//!
//! The transfer pulls its payload through the [`DataSource`] trait, one chunk
//! of at most one block per call.  A chunk either carries data or marks the
//! end of the stream; read failures are reported as `Err`.
//!
//! Two implementations ship with the crate:
//! - [`ReaderSource`] adapts any `tokio::io::AsyncRead` (file, stdin,
//!   in-memory slice).
//! - [`pipe`] returns a [`PipeWriter`] / [`PipeSource`] pair so a producer
//!   task can stream bytes into a running transfer.
//!
//! Both fill every chunk completely before yielding it.  A chunk shorter than
//! the requested size therefore only ever appears right before end-of-stream,
//! which is what the peer reads as "last block".

use std::future::Future;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

/// One read from a [`DataSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub data: Vec<u8>,
    /// No more data will follow.  Must not be set together with non-empty
    /// `data`.
    pub end_of_stream: bool,
}

impl Chunk {
    pub fn data(data: Vec<u8>) -> Self {
        Self {
            data,
            end_of_stream: false,
        }
    }

    pub fn end() -> Self {
        Self {
            data: Vec::new(),
            end_of_stream: true,
        }
    }
}

/// A single-consumer stream of payload bytes.
pub trait DataSource {
    /// Read up to `max` bytes.
    ///
    /// An empty, non-final chunk is allowed and is treated by the transfer as
    /// a spurious read.
    fn read_chunk(&mut self, max: usize) -> impl Future<Output = io::Result<Chunk>> + Send;
}

// ---------------------------------------------------------------------------
// ReaderSource
// ---------------------------------------------------------------------------

/// [`DataSource`] over an async reader.
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: R,
    eof: bool,
}

impl<R> ReaderSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(inner: R) -> Self {
        Self { inner, eof: false }
    }
}

impl<R> DataSource for ReaderSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn read_chunk(&mut self, max: usize) -> io::Result<Chunk> {
        if self.eof {
            return Ok(Chunk::end());
        }

        let mut buf = vec![0u8; max];
        let mut filled = 0;
        while filled < max {
            match self.inner.read(&mut buf[filled..]).await {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }

        if filled == 0 {
            return Ok(Chunk::end());
        }
        buf.truncate(filled);
        Ok(Chunk::data(buf))
    }
}

// ---------------------------------------------------------------------------
// Pipe
// ---------------------------------------------------------------------------

/// Create a connected writer/source pair.
///
/// `capacity` bounds the number of queued writes, so a fast producer waits
/// for the transfer instead of buffering the whole file.
pub fn pipe(capacity: usize) -> (PipeWriter, PipeSource) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        PipeWriter { tx },
        PipeSource {
            rx,
            pending: Vec::new(),
            closed: false,
        },
    )
}

/// Producer half of [`pipe`].  Dropping it ends the stream.
#[derive(Debug, Clone)]
pub struct PipeWriter {
    tx: mpsc::Sender<io::Result<Vec<u8>>>,
}

impl PipeWriter {
    /// Queue `data` for the transfer.
    ///
    /// Fails with `BrokenPipe` once the transfer has finished or aborted.
    pub async fn write(&self, data: impl Into<Vec<u8>>) -> io::Result<()> {
        self.tx
            .send(Ok(data.into()))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "transfer is gone"))
    }

    /// Abort the stream.  The transfer reports `err` to the peer and stops.
    pub async fn fail(self, err: io::Error) {
        let _ = self.tx.send(Err(err)).await;
    }
}

/// Consumer half of [`pipe`].
#[derive(Debug)]
pub struct PipeSource {
    rx: mpsc::Receiver<io::Result<Vec<u8>>>,
    pending: Vec<u8>,
    closed: bool,
}

impl DataSource for PipeSource {
    async fn read_chunk(&mut self, max: usize) -> io::Result<Chunk> {
        while !self.closed && self.pending.len() < max {
            match self.rx.recv().await {
                Some(Ok(bytes)) => self.pending.extend_from_slice(&bytes),
                Some(Err(e)) => return Err(e),
                None => self.closed = true,
            }
        }

        if self.pending.is_empty() {
            return Ok(Chunk::end());
        }
        let take = self.pending.len().min(max);
        let rest = self.pending.split_off(take);
        let data = std::mem::replace(&mut self.pending, rest);
        Ok(Chunk::data(data))
    }
}
