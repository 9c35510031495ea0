//! Reliable stream transport — length-prefixed frames over TCP.
//!
//! One accepted connection at a time; the peer sends a frame and the server
//! replies with the processed frame on the same connection, in strict
//! alternation. A connection fault ends the session and the listener goes
//! back to awaiting the next peer.
//!
//! A frame dropped by the transform gets no reply, so a peer must pair its
//! blocking receive with a timeout rather than counting on one reply per
//! request.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use framelink_core::wire::{MAX_STREAM_PAYLOAD, STREAM_PREFIX_SIZE};

use crate::relay::FrameProcessor;

/// Session-fatal stream failure: the peer closed, the pipe broke, or the
/// length prefix is not trustworthy.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionFault {
    #[error("stream i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("announced payload length {0} exceeds maximum {}", MAX_STREAM_PAYLOAD)]
    OversizedPayload(u32),
}

/// Write one frame payload: 4-byte big-endian length prefix, then the bytes.
pub async fn send_payload(stream: &mut TcpStream, payload: &[u8]) -> Result<(), ConnectionFault> {
    let prefix = (payload.len() as u32).to_be_bytes();
    stream.write_all(&prefix).await?;
    stream.write_all(payload).await?;
    stream.flush().await?;
    Ok(())
}

/// Read one frame payload. Returns exactly the announced byte count or a
/// [`ConnectionFault`] — never a short payload.
pub async fn recv_payload(stream: &mut TcpStream) -> Result<Bytes, ConnectionFault> {
    let mut prefix = [0u8; STREAM_PREFIX_SIZE];
    stream.read_exact(&mut prefix).await?;

    let length = u32::from_be_bytes(prefix);
    if length as usize > MAX_STREAM_PAYLOAD {
        return Err(ConnectionFault::OversizedPayload(length));
    }

    let mut payload = vec![0u8; length as usize];
    stream.read_exact(&mut payload).await?;
    Ok(Bytes::from(payload))
}

enum SessionEnd {
    Shutdown,
    Fault(ConnectionFault),
}

/// Stream-mode relay server.
pub struct StreamServer {
    listener: TcpListener,
    processor: FrameProcessor,
    shutdown: broadcast::Receiver<()>,
}

impl StreamServer {
    pub async fn bind(
        addr: &str,
        processor: FrameProcessor,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind stream listener on {addr}"))?;
        Ok(Self {
            listener,
            processor,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("stream listener has no local address")
    }

    pub async fn run(mut self) -> Result<()> {
        tracing::info!(addr = %self.local_addr()?, "stream server awaiting connection");

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("stream server shutting down");
                    return Ok(());
                }

                result = self.listener.accept() => {
                    let (stream, peer) = match result {
                        Ok(r) => r,
                        Err(e) => {
                            tracing::warn!(error = %e, "accept failed");
                            continue;
                        }
                    };
                    tracing::info!(%peer, "peer connected");

                    match self.serve_connection(stream).await {
                        SessionEnd::Shutdown => {
                            tracing::info!("stream server shutting down");
                            return Ok(());
                        }
                        SessionEnd::Fault(e) => {
                            tracing::warn!(%peer, error = %e, "session ended, awaiting new connection");
                        }
                    }
                }
            }
        }
    }

    /// Request/response loop for one connection. Frames are relayed in FIFO
    /// order; a dropped frame (transform failure) sends no reply.
    async fn serve_connection(&mut self, mut stream: TcpStream) -> SessionEnd {
        loop {
            let payload = tokio::select! {
                _ = self.shutdown.recv() => return SessionEnd::Shutdown,
                r = recv_payload(&mut stream) => match r {
                    Ok(p) => p,
                    Err(e) => return SessionEnd::Fault(e),
                },
            };

            if let Some(reply) = self.processor.process(payload) {
                if let Err(e) = send_payload(&mut stream, &reply).await {
                    return SessionEnd::Fault(e);
                }
            }
        }
    }
}
