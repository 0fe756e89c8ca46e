//! Randomised checks: the codec never panics on garbage, and the transfer
//! loop produces the right number of blocks for arbitrary payload sizes.

mod common;

use rand::Rng;

use common::*;
use tftp_put::{put, Packet, ReaderSource, TransferMode, BLOCK_SIZE};

#[test]
fn decode_random_bytes_never_panics() {
    let mut rng = rand::rng();
    for _ in 0..5_000 {
        let len = rng.random_range(0..700);
        let mut buf: Vec<u8> = (0..len).map(|_| rng.random()).collect();
        // Bias half the inputs toward valid opcodes so the field parsers run.
        if len >= 2 && rng.random_bool(0.5) {
            buf[0] = 0;
            buf[1] = rng.random_range(1..=5);
        }
        let _ = Packet::decode(&buf);
    }
}

#[test]
fn decoded_packets_reencode_to_same_bytes() {
    let mut rng = rand::rng();
    for _ in 0..2_000 {
        let block: u16 = rng.random();
        let len = rng.random_range(0..=BLOCK_SIZE);
        let payload: Vec<u8> = (0..len).map(|_| rng.random()).collect();
        let mut bytes = vec![0x00, 0x03];
        bytes.extend_from_slice(&block.to_be_bytes());
        bytes.extend_from_slice(&payload);

        let pkt = Packet::decode(&bytes).expect("valid DATA");
        assert_eq!(pkt.encode(), bytes);
    }
}

#[tokio::test]
async fn random_sizes_produce_expected_block_counts() {
    let mut rng = rand::rng();
    let sizes: Vec<usize> = (0..6).map(|_| rng.random_range(0..4 * BLOCK_SIZE)).collect();

    for size in sizes {
        let listen = loopback().await;
        let server_addr = listen.local_addr;
        let server = tokio::spawn(serve_upload(listen));

        let data = payload(size);
        let mut source = ReaderSource::new(&data[..]);
        let summary = put(
            &server_addr.to_string(),
            "random.bin",
            TransferMode::Octet,
            &mut source,
            patient_config(),
        )
        .await
        .expect("put");
        let upload = server.await.unwrap();

        // ⌈S / 512⌉ plus one empty block when S is an exact multiple.
        let expected = size.div_ceil(BLOCK_SIZE) + usize::from(size % BLOCK_SIZE == 0);
        assert_eq!(upload.blocks.len(), expected, "size {size}");
        assert_eq!(summary.blocks as usize, expected, "size {size}");
        assert_eq!(upload.contents(), data, "size {size}");
        assert!(upload.blocks.last().unwrap().len() < BLOCK_SIZE);
    }
}
