//! Wire-format definitions for TFTP packets (RFC 1350).
//!
//! Every datagram exchanged with the peer is a [`Packet`].  This module is
//! responsible for:
//! - Defining the on-wire binary layout of the five packet kinds.
//! - Serialising a [`Packet`] into a byte buffer ready for transmission.
//! - Deserialising a raw byte slice back into a [`Packet`], returning errors
//!   for malformed or truncated input.
//!
//! No I/O happens here; encoding and decoding only.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.  Strings are NUL-terminated.
//!
//! ```text
//!  RRQ/WRQ   | 01/02 |  filename  | 0 |  mode  | 0 |
//!  DATA      |  03   |  block #   |  payload (0..=512)  |
//!  ACK       |  04   |  block #   |
//!  ERROR     |  05   | error code |  message  | 0 |
//!             2 bytes   2 bytes
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Payload bytes carried by one full DATA packet.
pub const BLOCK_SIZE: usize = 512;

/// Byte length of the opcode field.
pub const OPCODE_LEN: usize = 2;

/// Byte length of a DATA header (opcode + block number).
pub const DATA_HEADER_LEN: usize = 4;

/// Opcode constants for the first header field.
pub mod opcode {
    /// Read request.
    pub const RRQ: u16 = 1;
    /// Write request.
    pub const WRQ: u16 = 2;
    /// Data block.
    pub const DATA: u16 = 3;
    /// Acknowledgement.
    pub const ACK: u16 = 4;
    /// Error.
    pub const ERROR: u16 = 5;
}

// ---------------------------------------------------------------------------
// TransferMode
// ---------------------------------------------------------------------------

/// Transfer mode named in a request.
///
/// The mode travels verbatim on the wire; this crate does not translate
/// payload bytes for `netascii`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    Netascii,
    #[default]
    Octet,
    Mail,
}

impl TransferMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TransferMode::Netascii => "netascii",
            TransferMode::Octet => "octet",
            TransferMode::Mail => "mail",
        }
    }
}

impl FromStr for TransferMode {
    type Err = PacketError;

    /// Mode names are case-insensitive on the wire.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "netascii" => Ok(TransferMode::Netascii),
            "octet" => Ok(TransferMode::Octet),
            "mail" => Ok(TransferMode::Mail),
            _ => Err(PacketError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Error codes carried by ERROR packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Not defined, see error message.
    NotDefined,
    FileNotFound,
    AccessViolation,
    /// Disk full or allocation exceeded.
    DiskFull,
    IllegalOperation,
    UnknownTransferId,
    FileAlreadyExists,
    NoSuchUser,
    /// Any code outside the RFC 1350 table.
    Other(u16),
}

impl ErrorCode {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => ErrorCode::NotDefined,
            1 => ErrorCode::FileNotFound,
            2 => ErrorCode::AccessViolation,
            3 => ErrorCode::DiskFull,
            4 => ErrorCode::IllegalOperation,
            5 => ErrorCode::UnknownTransferId,
            6 => ErrorCode::FileAlreadyExists,
            7 => ErrorCode::NoSuchUser,
            v => ErrorCode::Other(v),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            ErrorCode::NotDefined => 0,
            ErrorCode::FileNotFound => 1,
            ErrorCode::AccessViolation => 2,
            ErrorCode::DiskFull => 3,
            ErrorCode::IllegalOperation => 4,
            ErrorCode::UnknownTransferId => 5,
            ErrorCode::FileAlreadyExists => 6,
            ErrorCode::NoSuchUser => 7,
            ErrorCode::Other(v) => v,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            ErrorCode::NotDefined => "not defined",
            ErrorCode::FileNotFound => "file not found",
            ErrorCode::AccessViolation => "access violation",
            ErrorCode::DiskFull => "disk full or allocation exceeded",
            ErrorCode::IllegalOperation => "illegal TFTP operation",
            ErrorCode::UnknownTransferId => "unknown transfer ID",
            ErrorCode::FileAlreadyExists => "file already exists",
            ErrorCode::NoSuchUser => "no such user",
            ErrorCode::Other(_) => "non-standard code",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.to_u16(), self.describe())
    }
}

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

/// A complete TFTP datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Read request.
    Rrq { filename: String, mode: TransferMode },
    /// Write request.
    Wrq { filename: String, mode: TransferMode },
    /// One block of file payload, at most [`BLOCK_SIZE`] bytes.
    Data { block: u16, payload: Vec<u8> },
    /// Acknowledgement of a block (0 acknowledges a write request).
    Ack(u16),
    /// Terminal error from either side.
    Error { code: ErrorCode, message: String },
}

impl Packet {
    pub fn opcode(&self) -> u16 {
        match self {
            Packet::Rrq { .. } => opcode::RRQ,
            Packet::Wrq { .. } => opcode::WRQ,
            Packet::Data { .. } => opcode::DATA,
            Packet::Ack(_) => opcode::ACK,
            Packet::Error { .. } => opcode::ERROR,
        }
    }

    /// Serialise this packet into a newly allocated byte vector.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(DATA_HEADER_LEN + BLOCK_SIZE);
        buf.extend_from_slice(&self.opcode().to_be_bytes());

        match self {
            Packet::Rrq { filename, mode } | Packet::Wrq { filename, mode } => {
                put_str(&mut buf, filename);
                put_str(&mut buf, mode.as_str());
            }
            Packet::Data { block, payload } => {
                buf.extend_from_slice(&block.to_be_bytes());
                buf.extend_from_slice(payload);
            }
            Packet::Ack(block) => buf.extend_from_slice(&block.to_be_bytes()),
            Packet::Error { code, message } => {
                buf.extend_from_slice(&code.to_u16().to_be_bytes());
                put_str(&mut buf, message);
            }
        }

        buf
    }

    /// Parse a [`Packet`] from a raw byte slice.
    ///
    /// Returns [`Err`] if:
    /// - `buf` is too short for the opcode or the fixed fields,
    /// - the opcode is not one of the five known kinds,
    /// - a request string field is missing its NUL terminator or is not UTF-8,
    /// - a request names an unknown mode, or
    /// - a DATA payload exceeds [`BLOCK_SIZE`].
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < OPCODE_LEN {
            return Err(PacketError::BufferTooShort);
        }
        let op = u16::from_be_bytes([buf[0], buf[1]]);
        let body = &buf[OPCODE_LEN..];

        match op {
            opcode::RRQ | opcode::WRQ => {
                let (filename, rest) = take_str(body)?;
                let (mode, rest) = take_str(rest)?;
                if !rest.is_empty() {
                    // Trailing fields are option extensions, which we do not speak.
                    return Err(PacketError::TrailingBytes(rest.len()));
                }
                let mode = mode.parse()?;
                Ok(if op == opcode::RRQ {
                    Packet::Rrq { filename, mode }
                } else {
                    Packet::Wrq { filename, mode }
                })
            }
            opcode::DATA => {
                let block = take_u16(body)?;
                let payload = &body[2..];
                if payload.len() > BLOCK_SIZE {
                    return Err(PacketError::PayloadTooLarge(payload.len()));
                }
                Ok(Packet::Data {
                    block,
                    payload: payload.to_vec(),
                })
            }
            opcode::ACK => {
                let block = take_u16(body)?;
                if body.len() != 2 {
                    return Err(PacketError::TrailingBytes(body.len() - 2));
                }
                Ok(Packet::Ack(block))
            }
            opcode::ERROR => {
                let code = ErrorCode::from_u16(take_u16(body)?);
                let message = take_error_message(&body[2..]);
                Ok(Packet::Error { code, message })
            }
            other => Err(PacketError::UnknownOpcode(other)),
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Packet::Rrq { filename, mode } => write!(f, "RRQ filename={filename} mode={mode}"),
            Packet::Wrq { filename, mode } => write!(f, "WRQ filename={filename} mode={mode}"),
            Packet::Data { block, payload } => {
                write!(f, "DATA #{block} ({} bytes)", payload.len())
            }
            Packet::Ack(block) => write!(f, "ACK #{block}"),
            Packet::Error { code, message } => write!(f, "ERROR code={code}: {message}"),
        }
    }
}

/// Errors that can arise when parsing a raw datagram.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    #[error("buffer too short to contain the packet header")]
    BufferTooShort,
    #[error("unknown opcode {0}")]
    UnknownOpcode(u16),
    #[error("string field is not NUL-terminated")]
    MissingTerminator,
    #[error("string field is not valid UTF-8")]
    InvalidString,
    #[error("unknown transfer mode {0:?}")]
    UnknownMode(String),
    #[error("data payload of {0} bytes exceeds the block size")]
    PayloadTooLarge(usize),
    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

/// Split a NUL-terminated string off the front of `buf`.
fn take_str(buf: &[u8]) -> Result<(String, &[u8]), PacketError> {
    let nul = buf
        .iter()
        .position(|&b| b == 0)
        .ok_or(PacketError::MissingTerminator)?;
    let s = std::str::from_utf8(&buf[..nul]).map_err(|_| PacketError::InvalidString)?;
    Ok((s.to_string(), &buf[nul + 1..]))
}

/// ERROR text up to the first NUL or the end of the datagram.
///
/// Peers that omit the terminator or send non-UTF-8 text still refuse the
/// transfer, so the message is decoded leniently.
fn take_error_message(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

fn take_u16(buf: &[u8]) -> Result<u16, PacketError> {
    match buf {
        [hi, lo, ..] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(PacketError::BufferTooShort),
    }
}
