//! Transfer loop: data source → numbered blocks → peer.
//!
//! The peer learns that a transfer is complete when it receives a block
//! shorter than [`BLOCK_SIZE`].  A stream whose length is an exact multiple
//! of the block size (zero included) never produces such a block on its own,
//! so the loop appends one empty block in exactly that case:
//!
//! ```text
//!  1000 bytes → #1 (512)  #2 (488)
//!  1024 bytes → #1 (512)  #2 (512)  #3 (0)
//!     0 bytes → #1 (0)
//! ```

use std::net::SocketAddr;

use crate::error::PutError;
use crate::packet::{ErrorCode, BLOCK_SIZE};
use crate::session::Session;
use crate::source::DataSource;

/// Outcome of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSummary {
    /// The peer's transfer-specific address.
    pub peer: SocketAddr,
    /// Acknowledged DATA blocks, trailing empty block included.
    pub blocks: u32,
    /// Payload bytes acknowledged by the peer.
    pub bytes: u64,
    /// Retransmissions across the handshake and all blocks.
    pub retransmissions: u32,
    /// Every datagram sent, the write request included.
    pub datagrams: u32,
}

impl Session {
    /// Stream `source` to the peer until end-of-stream.
    ///
    /// A source read error is reported to the peer with one best-effort
    /// ERROR packet before it is returned.
    pub async fn send_stream<S>(&mut self, source: &mut S) -> Result<TransferSummary, PutError>
    where
        S: DataSource,
    {
        let mut block: u16 = 1;
        let mut last_block_size: Option<usize> = None;

        loop {
            let chunk = match source.read_chunk(BLOCK_SIZE).await {
                Ok(chunk) => chunk,
                Err(e) => {
                    self.abort(ErrorCode::FileNotFound, &e.to_string()).await;
                    return Err(PutError::Source(e));
                }
            };

            if chunk.end_of_stream {
                if !chunk.data.is_empty() {
                    let msg = format!("{} bytes delivered with end-of-stream", chunk.data.len());
                    self.abort(ErrorCode::NotDefined, "internal error").await;
                    return Err(PutError::SourceContract(msg));
                }
                if last_block_size.map_or(true, |n| n == BLOCK_SIZE) {
                    self.send_block(block, &[]).await?;
                }
                break;
            }

            if chunk.data.is_empty() {
                // Spurious empty read; nothing to send yet.
                tokio::task::yield_now().await;
                continue;
            }
            if chunk.data.len() > BLOCK_SIZE {
                let msg = format!("chunk of {} bytes exceeds the block size", chunk.data.len());
                self.abort(ErrorCode::NotDefined, "internal error").await;
                return Err(PutError::SourceContract(msg));
            }

            self.send_block(block, &chunk.data).await?;
            block = block.wrapping_add(1);
            last_block_size = Some(chunk.data.len());
        }

        let summary = TransferSummary {
            peer: self.peer(),
            blocks: self.blocks_sent,
            bytes: self.bytes_sent,
            retransmissions: self.retransmissions(),
            datagrams: self.datagrams_sent(),
        };
        log::info!(
            "[put] transfer complete: {} bytes in {} blocks ({} retransmissions)",
            summary.bytes,
            summary.blocks,
            summary.retransmissions
        );
        Ok(summary)
    }
}
