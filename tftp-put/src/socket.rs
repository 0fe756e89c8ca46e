//! UDP endpoint of one put transfer.
//!
//! A transfer owns exactly one [`Socket`]: the write request leaves from it
//! and every DATA, ACK and ERROR of the transfer uses the same local port,
//! which is the client's transfer ID.  Datagrams are decoded on arrival, so
//! callers see [`Packet`]s or a decode failure tagged with its source
//! address.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::UdpSocket;

use crate::packet::{Packet, PacketError};

/// Receive buffer size.  Large enough for any UDP payload, so an oversized
/// foreign datagram is rejected by the decoder rather than silently truncated.
pub const MAX_DATAGRAM: usize = 65_535;

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("socket I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A datagram arrived but is not a TFTP packet.
    #[error("undecodable datagram from {from}: {source}")]
    Packet {
        from: SocketAddr,
        #[source]
        source: PacketError,
    },
}

/// TFTP packets over one bound UDP port.
#[derive(Debug)]
pub struct Socket {
    /// Bound address with the ephemeral port resolved; this is our TID.
    pub local_addr: SocketAddr,
    inner: UdpSocket,
}

impl Socket {
    /// Bind to `addr`.  Port 0 picks a fresh transfer ID.
    pub async fn bind(addr: SocketAddr) -> Result<Self, SocketError> {
        let inner = UdpSocket::bind(addr).await?;
        Ok(Self {
            local_addr: inner.local_addr()?,
            inner,
        })
    }

    /// Send one packet as one datagram.
    pub async fn send_to(&self, packet: &Packet, dest: SocketAddr) -> Result<(), SocketError> {
        self.send_bytes(&packet.encode(), dest).await
    }

    /// Send raw bytes as one datagram.
    pub async fn send_bytes(&self, bytes: &[u8], dest: SocketAddr) -> Result<(), SocketError> {
        self.inner.send_to(bytes, dest).await?;
        Ok(())
    }

    /// Wait for the next datagram from anyone and decode it.
    ///
    /// A decode failure is [`SocketError::Packet`]; the socket stays usable.
    pub async fn recv_from(&self) -> Result<(Packet, SocketAddr), SocketError> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let (n, from) = self.inner.recv_from(&mut buf).await?;
        let packet =
            Packet::decode(&buf[..n]).map_err(|source| SocketError::Packet { from, source })?;
        Ok((packet, from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn loopback() -> Socket {
        Socket::bind("127.0.0.1:0".parse().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn bind_resolves_ephemeral_port() {
        let sock = loopback().await;
        assert_ne!(sock.local_addr.port(), 0);
    }

    #[tokio::test]
    async fn undecodable_datagram_names_its_sender() {
        let a = loopback().await;
        let b = loopback().await;
        a.send_bytes(&[0x00, 0x09], b.local_addr).await.unwrap();
        a.send_to(&Packet::Ack(7), b.local_addr).await.unwrap();

        match b.recv_from().await {
            Err(SocketError::Packet { from, source }) => {
                assert_eq!(from, a.local_addr);
                assert_eq!(source, PacketError::UnknownOpcode(9));
            }
            other => panic!("expected decode error, got {other:?}"),
        }
        let (pkt, from) = b.recv_from().await.unwrap();
        assert_eq!(pkt, Packet::Ack(7));
        assert_eq!(from, a.local_addr);
    }
}
