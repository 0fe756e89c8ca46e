//! `tftp-put`: the upload side of TFTP (RFC 1350) over UDP.
//!
//! # Architecture
//!
//! ```text
//!  ┌────────────┐  chunks ≤ 512  ┌──────────────┐  DATA #n   ┌──────┐
//!  │ DataSource │───────────────▶│   Session    │───────────▶│ peer │
//!  └────────────┘                │ (send_stream │◀───────────│      │
//!                                │  send_block) │  ACK #n    └──────┘
//!                                └──────▲───────┘
//!                                       │ ACK #0 pins the peer
//!                                ┌──────┴───────┐    WRQ     ┌────────┐
//!                                │    Sender    │───────────▶│ server │
//!                                │  (connect)   │            │ :69    │
//!                                └──────┬───────┘            └────────┘
//!                                       │ raw UDP datagrams
//!                                ┌──────▼───────┐
//!                                │    Socket    │  (thin async wrapper around tokio UdpSocket)
//!                                └──────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`packet`]  : wire format (serialise / deserialise)
//! - [`socket`]  : async UDP socket abstraction
//! - [`config`]  : timeout and retry settings
//! - [`retry`]   : per-step attempt budget
//! - [`sender`]  : write-request handshake and the shared retry exchange
//! - [`session`] : stop-and-wait block transmitter
//! - [`transfer`]: transfer loop and end-of-transfer rule
//! - [`source`]  : data sources (async readers, cross-task pipe)
//! - [`client`]  : resolve + bind + transfer in one call
//! - [`error`]   : transfer error type

pub mod client;
pub mod config;
pub mod error;
pub mod packet;
pub mod retry;
pub mod sender;
pub mod session;
pub mod socket;
pub mod source;
pub mod transfer;

pub use client::put;
pub use config::TransferConfig;
pub use error::{PutError, Stage};
pub use packet::{ErrorCode, Packet, TransferMode, BLOCK_SIZE};
pub use sender::Sender;
pub use session::Session;
pub use source::{pipe, Chunk, DataSource, PipeSource, PipeWriter, ReaderSource};
pub use transfer::TransferSummary;
