//! Stream-mode end-to-end tests: one TCP peer, request/response alternation.

use crate::{passthrough_processor, tagging_processor};

use framelink_core::mode::ModeSwitch;
use framelinkd::stream::{recv_payload, send_payload, StreamServer};

use tokio::net::TcpStream;
use tokio::sync::broadcast;

/// Frames flow in FIFO order and each reply reflects the mode snapshot
/// taken when its frame was processed — including a switch made while the
/// connection is live.
#[tokio::test]
async fn stream_session_relays_and_honors_mode_switches() {
    let modes = ModeSwitch::default();
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let server = StreamServer::bind(
        "127.0.0.1:0",
        tagging_processor(modes.clone()),
        shutdown_tx.subscribe(),
    )
    .await
    .unwrap();
    let addr = server.local_addr().unwrap();
    let server_task = tokio::spawn(server.run());

    let mut conn = TcpStream::connect(addr).await.unwrap();

    for i in 0..5 {
        let request = format!("frame-{i}:");
        send_payload(&mut conn, request.as_bytes()).await.unwrap();
        let reply = recv_payload(&mut conn).await.unwrap();
        assert_eq!(&reply[..], format!("frame-{i}:normal").as_bytes());
    }

    // operator switches modes concurrently with the frame flow
    modes.apply_command("night vision").unwrap();
    send_payload(&mut conn, b"frame-5:").await.unwrap();
    let reply = recv_payload(&mut conn).await.unwrap();
    assert_eq!(&reply[..], b"frame-5:night");

    let _ = shutdown_tx.send(());
    server_task.await.unwrap().unwrap();
}

/// A dropped peer ends the session; the listener goes back to awaiting a
/// new connection rather than exiting.
#[tokio::test]
async fn stream_server_awaits_a_new_peer_after_a_fault() {
    let modes = ModeSwitch::default();
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let server = StreamServer::bind(
        "127.0.0.1:0",
        passthrough_processor(modes),
        shutdown_tx.subscribe(),
    )
    .await
    .unwrap();
    let addr = server.local_addr().unwrap();
    let server_task = tokio::spawn(server.run());

    // first peer hangs up mid-message
    {
        let mut conn = TcpStream::connect(addr).await.unwrap();
        send_payload(&mut conn, b"complete frame").await.unwrap();
        let reply = recv_payload(&mut conn).await.unwrap();
        assert_eq!(&reply[..], b"complete frame");

        use tokio::io::AsyncWriteExt;
        conn.write_all(&100u32.to_be_bytes()).await.unwrap();
        conn.write_all(&[0u8; 10]).await.unwrap();
        // connection dropped here
    }

    // a second peer gets a fresh session
    let mut conn = TcpStream::connect(addr).await.unwrap();
    send_payload(&mut conn, b"second peer").await.unwrap();
    let reply = recv_payload(&mut conn).await.unwrap();
    assert_eq!(&reply[..], b"second peer");

    let _ = shutdown_tx.send(());
    server_task.await.unwrap().unwrap();
}

/// Shutdown unblocks a server parked in accept or receive.
#[tokio::test]
async fn stream_server_exits_on_shutdown_while_idle() {
    let modes = ModeSwitch::default();
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let server = StreamServer::bind(
        "127.0.0.1:0",
        passthrough_processor(modes),
        shutdown_tx.subscribe(),
    )
    .await
    .unwrap();
    let server_task = tokio::spawn(server.run());

    // nothing ever connects
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let _ = shutdown_tx.send(());

    tokio::time::timeout(std::time::Duration::from_secs(5), server_task)
        .await
        .expect("server should exit promptly on shutdown")
        .unwrap()
        .unwrap();
}
