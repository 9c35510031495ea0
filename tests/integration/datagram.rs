//! Datagram-mode end-to-end tests: chunked frames over real UDP sockets.

use std::time::Duration;

use crate::{passthrough_processor, tagging_processor};

use bytes::Bytes;
use framelink_core::mode::ModeSwitch;
use framelink_core::wire::Chunk;
use framelinkd::datagram::send::encode_datagrams;
use framelinkd::datagram::DatagramRelay;
use framelinkd::reassembly::ReassemblyBuffer;

use tokio::net::UdpSocket;
use tokio::sync::broadcast;

const RECV_DEADLINE: Duration = Duration::from_secs(5);

/// Receive reply datagrams until one frame completes.
async fn recv_frame(socket: &UdpSocket, expect_frame_id: u16) -> Bytes {
    let mut reassembly = ReassemblyBuffer::new(5, Duration::from_secs(5));
    let mut buf = vec![0u8; 65536];
    loop {
        let (len, _) = tokio::time::timeout(RECV_DEADLINE, socket.recv_from(&mut buf))
            .await
            .expect("timed out waiting for a reply datagram")
            .expect("recv_from failed");
        let chunk = Chunk::parse(&buf[..len]).expect("reply datagram should parse");
        assert_eq!(chunk.frame_id, expect_frame_id);
        if let Some(frame) = reassembly.accept(chunk) {
            return frame;
        }
    }
}

/// A multi-chunk frame delivered out of order is reassembled, transformed,
/// and returned intact under the same frame id.
#[tokio::test]
async fn datagram_frame_round_trips_out_of_order() {
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let client_addr = client.local_addr().unwrap();

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let relay = DatagramRelay::bind(
        "127.0.0.1:0",
        client_addr,
        5,
        Duration::from_secs(5),
        passthrough_processor(ModeSwitch::default()),
        shutdown_tx.subscribe(),
    )
    .await
    .unwrap();
    let relay_addr = relay.local_addr().unwrap();
    let relay_task = tokio::spawn(relay.run());

    // three chunks' worth of payload, sent 1, 0, 2
    let payload: Vec<u8> = (0..150_000).map(|i| (i % 251) as u8).collect();
    let mut datagrams = encode_datagrams(7, &payload);
    assert_eq!(datagrams.len(), 3);
    datagrams.swap(0, 1);
    for datagram in &datagrams {
        client.send_to(datagram, relay_addr).await.unwrap();
    }

    let reply = recv_frame(&client, 7).await;
    assert_eq!(&reply[..], &payload[..]);

    let _ = shutdown_tx.send(());
    relay_task.await.unwrap().unwrap();
}

/// Garbage datagrams are discarded without disturbing the relay.
#[tokio::test]
async fn datagram_relay_ignores_malformed_datagrams() {
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let client_addr = client.local_addr().unwrap();

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let relay = DatagramRelay::bind(
        "127.0.0.1:0",
        client_addr,
        5,
        Duration::from_secs(5),
        passthrough_processor(ModeSwitch::default()),
        shutdown_tx.subscribe(),
    )
    .await
    .unwrap();
    let relay_addr = relay.local_addr().unwrap();
    let relay_task = tokio::spawn(relay.run());

    // shorter than the 12-byte header
    client.send_to(b"junk", relay_addr).await.unwrap();
    // header whose chunk_index is out of range
    client
        .send_to(&[0, 0, 0, 1, 0, 5, 0, 2, 0, 0, 0, 4], relay_addr)
        .await
        .unwrap();

    // a well-formed frame still goes through
    for datagram in encode_datagrams(3, b"still alive") {
        client.send_to(&datagram, relay_addr).await.unwrap();
    }
    let reply = recv_frame(&client, 3).await;
    assert_eq!(&reply[..], b"still alive");

    let _ = shutdown_tx.send(());
    relay_task.await.unwrap().unwrap();
}

/// Mode switches made between frames are visible to subsequent frames, and
/// frame ids are echoed per frame even when they arrive out of capture
/// order.
#[tokio::test]
async fn datagram_relay_applies_current_mode_per_frame() {
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let client_addr = client.local_addr().unwrap();

    let modes = ModeSwitch::default();
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let relay = DatagramRelay::bind(
        "127.0.0.1:0",
        client_addr,
        5,
        Duration::from_secs(5),
        tagging_processor(modes.clone()),
        shutdown_tx.subscribe(),
    )
    .await
    .unwrap();
    let relay_addr = relay.local_addr().unwrap();
    let relay_task = tokio::spawn(relay.run());

    for datagram in encode_datagrams(10, b"a:") {
        client.send_to(&datagram, relay_addr).await.unwrap();
    }
    assert_eq!(&recv_frame(&client, 10).await[..], b"a:normal");

    modes.apply_command("4").unwrap();

    // out-of-order ids are fine: the relay does not assume monotonic arrival
    for datagram in encode_datagrams(9, b"b:") {
        client.send_to(&datagram, relay_addr).await.unwrap();
    }
    assert_eq!(&recv_frame(&client, 9).await[..], b"b:thermal");

    let _ = shutdown_tx.send(());
    relay_task.await.unwrap().unwrap();
}
