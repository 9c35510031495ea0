//! Datagram receive loop — parse, reassemble, relay.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::net::UdpSocket;
use tokio::sync::broadcast;

use framelink_core::wire::Chunk;

use crate::datagram::send;
use crate::reassembly::ReassemblyBuffer;
use crate::relay::FrameProcessor;

/// Poll timeout on the receive socket, so shutdown is noticed promptly even
/// when no traffic arrives. Also the stale-sweep interval.
const RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// Datagram-mode relay: receives chunked frames, reassembles them, runs the
/// transform, and sends the result back to the configured peer.
pub struct DatagramRelay {
    socket: UdpSocket,
    peer: SocketAddr,
    buffer: ReassemblyBuffer,
    processor: FrameProcessor,
    shutdown: broadcast::Receiver<()>,
}

impl DatagramRelay {
    pub async fn bind(
        listen_addr: &str,
        peer: SocketAddr,
        window: u16,
        stale_ttl: Duration,
        processor: FrameProcessor,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<Self> {
        let socket = UdpSocket::bind(listen_addr)
            .await
            .with_context(|| format!("failed to bind datagram socket on {listen_addr}"))?;
        Ok(Self {
            socket,
            peer,
            buffer: ReassemblyBuffer::new(window, stale_ttl),
            processor,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket
            .local_addr()
            .context("datagram socket has no local address")
    }

    pub async fn run(mut self) -> Result<()> {
        tracing::info!(
            addr = %self.local_addr()?,
            peer = %self.peer,
            "datagram relay listening"
        );

        let mut buf = vec![0u8; 65536];
        let mut last_sweep = Instant::now();

        loop {
            // Time-based, not idle-based: continuous traffic must not
            // starve the sweep.
            if last_sweep.elapsed() >= RECV_TIMEOUT {
                self.buffer.sweep_stale();
                last_sweep = Instant::now();
            }

            let received = tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("datagram relay shutting down");
                    return Ok(());
                }
                r = tokio::time::timeout(RECV_TIMEOUT, self.socket.recv_from(&mut buf)) => r,
            };

            let (len, _from) = match received {
                Ok(Ok(r)) => r,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "recv_from failed");
                    continue;
                }
                Err(_) => {
                    // idle tick; the sweep runs at the top of the loop
                    continue;
                }
            };

            // Malformed datagrams are an expected condition under loss —
            // trace only, never a per-occurrence warning.
            let chunk = match Chunk::parse(&buf[..len]) {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::trace!(error = %e, len, "discarding malformed datagram");
                    continue;
                }
            };

            let frame_id = chunk.frame_id;
            let Some(payload) = self.buffer.accept(chunk) else {
                continue;
            };
            tracing::trace!(frame_id, bytes = payload.len(), "frame reassembled");

            if let Some(reply) = self.processor.process(payload) {
                send::send_frame(&self.socket, frame_id, &reply, self.peer).await;
            }
        }
    }
}
