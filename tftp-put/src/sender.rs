//! Write-request handshake and the shared send/await/retry exchange.
//!
//! [`Sender`] is the pre-handshake half of a put transfer.  It owns the
//! socket, sends the write request to the server's well-known address and
//! waits for `ACK #0`.  The address that ACK arrives from becomes the pinned
//! peer of the returned [`Session`], which drives the data blocks.
//!
//! # Exchange contract
//!
//! The handshake and every data block run through [`Sender::exchange`]:
//! - Transmit the packet, then wait until a per-attempt deadline.
//! - An ERROR packet aborts immediately; no retry follows it.
//! - Undecodable datagrams and non-matching replies are ignored and do
//!   **not** re-arm the deadline.
//! - On deadline expiry the identical packet is sent again, one
//!   [`RetryBudget`] attempt per transmission.
//! - When the budget is spent the step fails with [`PutError::SendTimeout`].

use std::net::SocketAddr;

use tokio::time::{timeout_at, Instant};

use crate::config::TransferConfig;
use crate::error::{PutError, Stage};
use crate::packet::{ErrorCode, Packet, TransferMode};
use crate::retry::RetryBudget;
use crate::session::Session;
use crate::socket::{Socket, SocketError};

/// Counters kept across the whole transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SendStats {
    pub packets_sent: u32,
    pub retransmissions: u32,
}

/// A put transfer that has not completed its handshake yet.
#[derive(Debug)]
pub struct Sender {
    socket: Socket,
    server: SocketAddr,
    filename: String,
    mode: TransferMode,
    config: TransferConfig,
    pub(crate) stats: SendStats,
}

impl Sender {
    /// Prepare a transfer of `filename` to the server listening at `server`.
    ///
    /// The sender takes ownership of `socket` for the lifetime of the
    /// transfer.
    pub fn new(
        socket: Socket,
        server: SocketAddr,
        filename: impl Into<String>,
        mode: TransferMode,
        config: TransferConfig,
    ) -> Self {
        Self {
            socket,
            server,
            filename: filename.into(),
            mode,
            config,
            stats: SendStats::default(),
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr
    }

    /// Send the write request and wait for `ACK #0`.
    ///
    /// On success the transfer is pinned to the address the ACK came from.
    pub async fn connect(mut self) -> Result<Session, PutError> {
        let wrq = Packet::Wrq {
            filename: self.filename.clone(),
            mode: self.mode,
        };
        log::info!(
            "[put] requesting write of {:?} ({}) to {}",
            self.filename,
            self.mode,
            self.server
        );

        let server = self.server;
        let peer = self
            .exchange(&wrq, server, None, Stage::Request, |reply| {
                matches!(reply, Packet::Ack(0))
            })
            .await?;

        log::debug!("[put] transfer pinned to {peer}");
        Ok(Session::new(self, peer))
    }

    /// Transmit `packet` to `dest` until `accept` approves a reply.
    ///
    /// With `pinned` set, datagrams from any other address are treated as
    /// noise.  Returns the address the accepted reply came from.
    pub(crate) async fn exchange<F>(
        &mut self,
        packet: &Packet,
        dest: SocketAddr,
        pinned: Option<SocketAddr>,
        stage: Stage,
        mut accept: F,
    ) -> Result<SocketAddr, PutError>
    where
        F: FnMut(&Packet) -> bool,
    {
        let mut budget = RetryBudget::new(self.config.retry_count);

        while budget.try_attempt() {
            if budget.is_retry() {
                self.stats.retransmissions += 1;
                log::debug!("[put] timeout on {stage}; retransmitting (attempt {})", budget.used());
            }
            self.socket.send_to(packet, dest).await?;
            self.stats.packets_sent += 1;
            log::debug!("[put] → {packet}");

            let deadline = Instant::now() + self.config.timeout;
            loop {
                let Ok(received) = timeout_at(deadline, self.socket.recv_from()).await else {
                    break;
                };
                let (reply, from) = match received {
                    Ok(v) => v,
                    Err(SocketError::Packet { from, source }) => {
                        log::debug!("[put] ignoring malformed datagram from {from}: {source}");
                        continue;
                    }
                    Err(SocketError::Io(e)) => return Err(PutError::Transport(e)),
                };

                if let Some(peer) = pinned {
                    if from != peer {
                        // Never answer an ERROR with an ERROR.
                        if !matches!(reply, Packet::Error { .. }) {
                            self.reject_stranger(from).await;
                        }
                        continue;
                    }
                }

                log::debug!("[put] ← {reply}");
                if let Packet::Error { code, message } = reply {
                    return Err(PutError::Peer { code, message });
                }
                if accept(&reply) {
                    return Ok(from);
                }
            }
        }

        Err(PutError::SendTimeout {
            stage,
            attempts: budget.used(),
        })
    }

    /// Best-effort ERROR to `dest`.  Failures are logged, never returned.
    pub(crate) async fn send_error(&mut self, dest: SocketAddr, code: ErrorCode, message: &str) {
        let packet = Packet::Error {
            code,
            message: message.to_string(),
        };
        match self.socket.send_to(&packet, dest).await {
            Ok(()) => {
                self.stats.packets_sent += 1;
                log::debug!("[put] → {packet}");
            }
            Err(e) => log::warn!("[put] could not send ERROR to {dest}: {e}"),
        }
    }

    /// Answer a datagram from an address other than the pinned peer.
    async fn reject_stranger(&mut self, from: SocketAddr) {
        log::debug!("[put] datagram from unknown transfer ID {from}");
        self.send_error(from, ErrorCode::UnknownTransferId, "unknown transfer ID")
            .await;
    }
}
