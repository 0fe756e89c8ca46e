//! Transfer-level errors.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::packet::ErrorCode;
use crate::socket::SocketError;

/// The step a send timeout happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Waiting for `ACK #0` to the write request.
    Request,
    /// Waiting for the acknowledgement of a data block.
    Block(u16),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Request => f.write_str("write request"),
            Stage::Block(n) => write!(f, "block {n}"),
        }
    }
}

/// Everything that can end a put transfer early.
#[derive(Debug, Error)]
pub enum PutError {
    /// The server name could not be resolved to an address.
    #[error("cannot resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    /// The local socket could not be set up.
    #[error("cannot bind local socket: {0}")]
    Bind(#[source] io::Error),

    /// Sending or receiving failed for a reason other than a timeout.
    #[error("transport error: {0}")]
    Transport(#[source] io::Error),

    /// Every attempt of one step went unanswered.
    #[error("send timeout on {stage} after {attempts} attempt(s)")]
    SendTimeout { stage: Stage, attempts: u32 },

    /// The peer refused or failed the transfer with an ERROR packet.
    #[error("transmission error {code}: {message}")]
    Peer { code: ErrorCode, message: String },

    /// The data source failed while being read.
    #[error("data source error: {0}")]
    Source(#[source] io::Error),

    /// The data source broke its contract: data delivered together with
    /// end-of-stream, or a chunk larger than one block.
    #[error("data source contract violated: {0}")]
    SourceContract(String),

    /// A block payload larger than the block size was handed to the sender.
    #[error("block payload of {0} bytes exceeds the block size")]
    OversizedBlock(usize),
}

impl From<SocketError> for PutError {
    fn from(e: SocketError) -> Self {
        match e {
            SocketError::Io(e) => PutError::Transport(e),
            // Receive loops drop undecodable datagrams before converting.
            SocketError::Packet { source, .. } => {
                PutError::Transport(io::Error::new(io::ErrorKind::InvalidData, source))
            }
        }
    }
}

impl PutError {
    /// `true` for errors the remote side reported itself.
    pub fn is_peer_error(&self) -> bool {
        matches!(self, PutError::Peer { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_error_message_carries_code_and_text() {
        let e = PutError::Peer {
            code: ErrorCode::DiskFull,
            message: "no space".into(),
        };
        assert!(e.is_peer_error());
        assert_eq!(
            e.to_string(),
            "transmission error 3 (disk full or allocation exceeded): no space"
        );
    }

    #[test]
    fn timeout_names_the_stage() {
        let e = PutError::SendTimeout {
            stage: Stage::Block(4),
            attempts: 3,
        };
        assert_eq!(e.to_string(), "send timeout on block 4 after 3 attempt(s)");
        let e = PutError::SendTimeout {
            stage: Stage::Request,
            attempts: 1,
        };
        assert_eq!(e.to_string(), "send timeout on write request after 1 attempt(s)");
    }

    #[test]
    fn socket_io_maps_to_transport() {
        let e: PutError = SocketError::Io(io::Error::other("boom")).into();
        assert!(matches!(e, PutError::Transport(_)));
    }
}
