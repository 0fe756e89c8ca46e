//! Block transmitter for an established put transfer.
//!
//! A [`Session`] exists only after the write request was acknowledged, so
//! every method here talks to exactly one pinned peer address.
//!
//! # Stop-and-Wait contract
//! - At most **one** DATA packet is in flight at any moment.
//! - Only an ACK carrying the same block number completes a block; stale or
//!   duplicate ACKs are ignored without resending.
//! - On timeout the identical DATA packet (same number, same payload) is
//!   sent again.

use std::net::SocketAddr;

use crate::error::{PutError, Stage};
use crate::packet::{ErrorCode, Packet, BLOCK_SIZE};
use crate::sender::Sender;

/// A put transfer pinned to the peer that acknowledged the write request.
#[derive(Debug)]
pub struct Session {
    sender: Sender,
    peer: SocketAddr,
    pub(crate) blocks_sent: u32,
    pub(crate) bytes_sent: u64,
}

impl Session {
    pub(crate) fn new(sender: Sender, peer: SocketAddr) -> Self {
        Self {
            sender,
            peer,
            blocks_sent: 0,
            bytes_sent: 0,
        }
    }

    /// The peer's transfer-specific address, fixed for the whole transfer.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.sender.local_addr()
    }

    /// Retransmissions made so far, handshake included.
    pub fn retransmissions(&self) -> u32 {
        self.sender.stats.retransmissions
    }

    /// Datagrams sent so far: requests, blocks, retransmissions and ERRORs.
    pub fn datagrams_sent(&self) -> u32 {
        self.sender.stats.packets_sent
    }

    /// Deliver one block and wait for its acknowledgement.
    ///
    /// `payload` may be empty (the end-of-transfer marker) but never longer
    /// than [`BLOCK_SIZE`].
    pub async fn send_block(&mut self, block: u16, payload: &[u8]) -> Result<(), PutError> {
        if payload.len() > BLOCK_SIZE {
            return Err(PutError::OversizedBlock(payload.len()));
        }

        let data = Packet::Data {
            block,
            payload: payload.to_vec(),
        };
        let peer = self.peer;
        self.sender
            .exchange(&data, peer, Some(peer), Stage::Block(block), |reply| {
                matches!(reply, Packet::Ack(n) if *n == block)
            })
            .await?;

        self.blocks_sent += 1;
        self.bytes_sent += payload.len() as u64;
        Ok(())
    }

    /// Tell the peer the transfer is over.  Sent once, never retried.
    pub async fn abort(&mut self, code: ErrorCode, message: &str) {
        log::warn!("[put] aborting transfer to {}: {message}", self.peer);
        let peer = self.peer;
        self.sender.send_error(peer, code, message).await;
    }
}
