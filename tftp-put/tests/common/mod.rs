//! Shared helpers for integration tests: loopback sockets and a scripted
//! TFTP server built on the crate's own [`Socket`] and [`Packet`] codec.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};

use tftp_put::socket::Socket;
use tftp_put::{Chunk, DataSource, Packet, TransferConfig, TransferMode, BLOCK_SIZE};

/// Bind a socket on an OS-chosen loopback port.
pub async fn loopback() -> Socket {
    Socket::bind("127.0.0.1:0".parse().unwrap())
        .await
        .expect("bind loopback socket")
}

/// Short timeouts so retry paths finish quickly.
pub fn fast_config(retries: u32) -> TransferConfig {
    TransferConfig::default()
        .with_timeout(Duration::from_millis(150))
        .with_retry_count(retries)
}

/// Timeouts long enough that no retransmission happens during a test.
pub fn patient_config() -> TransferConfig {
    TransferConfig::default()
        .with_timeout(Duration::from_secs(3))
        .with_retry_count(3)
}

/// Next decodable packet within `wait`, or `None` when the socket stays quiet.
pub async fn recv_within(sock: &Socket, wait: Duration) -> Option<(Packet, SocketAddr)> {
    let deadline = Instant::now() + wait;
    loop {
        match timeout_at(deadline, sock.recv_from()).await {
            Err(_elapsed) => return None,
            Ok(Ok(v)) => return Some(v),
            Ok(Err(_)) => continue,
        }
    }
}

/// Like [`recv_within`] but panics on silence.
pub async fn expect_packet(sock: &Socket) -> (Packet, SocketAddr) {
    recv_within(sock, Duration::from_secs(5))
        .await
        .expect("peer timed out waiting for a packet")
}

/// Drain everything arriving within `wait`.
pub async fn collect_within(sock: &Socket, wait: Duration) -> Vec<Packet> {
    let mut out = Vec::new();
    while let Some((pkt, _)) = recv_within(sock, wait).await {
        out.push(pkt);
    }
    out
}

/// What a well-behaved server saw during one upload.
#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub mode: TransferMode,
    pub client: SocketAddr,
    /// Payload of every accepted block, in order.
    pub blocks: Vec<Vec<u8>>,
    /// Every DATA block number received, duplicates included.
    pub data_seen: Vec<u16>,
}

impl Upload {
    pub fn block_sizes(&self) -> Vec<usize> {
        self.blocks.iter().map(Vec::len).collect()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.blocks.concat()
    }
}

/// Accept one WRQ on `listen`, answer from a fresh transfer socket and ack
/// every block until a short one arrives.
pub async fn serve_upload(listen: Socket) -> Upload {
    let (wrq, client) = expect_packet(&listen).await;
    let Packet::Wrq { filename, mode } = wrq else {
        panic!("expected WRQ, got {wrq}");
    };

    let tid = loopback().await;
    tid.send_to(&Packet::Ack(0), client).await.unwrap();

    let mut upload = Upload {
        filename,
        mode,
        client,
        blocks: Vec::new(),
        data_seen: Vec::new(),
    };
    let mut expected: u16 = 1;
    loop {
        let (pkt, from) = expect_packet(&tid).await;
        assert_eq!(from, client, "data must come from the requesting socket");
        let Packet::Data { block, payload } = pkt else {
            panic!("expected DATA, got {pkt}");
        };
        upload.data_seen.push(block);
        tid.send_to(&Packet::Ack(block), client).await.unwrap();
        if block == expected {
            let last = payload.len() < BLOCK_SIZE;
            upload.blocks.push(payload);
            expected = expected.wrapping_add(1);
            if last {
                return upload;
            }
        }
    }
}

/// Accept a WRQ on `listen` and acknowledge it from a fresh transfer socket.
/// Returns `(transfer_socket, client_address)` for a scripted continuation.
pub async fn accept_wrq(listen: &Socket) -> (Socket, SocketAddr) {
    let (wrq, client) = expect_packet(listen).await;
    assert!(matches!(wrq, Packet::Wrq { .. }), "expected WRQ, got {wrq}");
    let tid = loopback().await;
    tid.send_to(&Packet::Ack(0), client).await.unwrap();
    (tid, client)
}

/// Data source replaying a fixed script, then end-of-stream forever.
pub struct Scripted(pub VecDeque<io::Result<Chunk>>);

impl Scripted {
    pub fn new(steps: Vec<io::Result<Chunk>>) -> Self {
        Self(steps.into())
    }
}

impl DataSource for Scripted {
    async fn read_chunk(&mut self, _max: usize) -> io::Result<Chunk> {
        self.0.pop_front().unwrap_or_else(|| Ok(Chunk::end()))
    }
}

/// Deterministic test payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
