//! Frame chunking and best-effort transmission.

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use zerocopy::AsBytes;

use framelink_core::wire::{ChunkHeader, CHUNK_HEADER_SIZE, MAX_CHUNK_PAYLOAD};

/// Build the datagrams for one frame: consecutive chunks of at most
/// [`MAX_CHUNK_PAYLOAD`] bytes, each prefixed with its 12-byte header.
///
/// An empty payload still produces one (empty) chunk so the frame can
/// complete on the receiving side.
pub fn encode_datagrams(frame_id: u16, payload: &[u8]) -> Vec<Vec<u8>> {
    let total_length = payload.len() as u32;
    let parts: Vec<&[u8]> = if payload.is_empty() {
        vec![&[]]
    } else {
        payload.chunks(MAX_CHUNK_PAYLOAD).collect()
    };
    let total_chunks = parts.len() as u16;

    parts
        .iter()
        .enumerate()
        .map(|(index, part)| {
            let header = ChunkHeader::new(frame_id, index as u16, total_chunks, total_length);
            let mut datagram = Vec::with_capacity(CHUNK_HEADER_SIZE + part.len());
            datagram.extend_from_slice(header.as_bytes());
            datagram.extend_from_slice(part);
            datagram
        })
        .collect()
}

/// Send one frame to `dest`, chunk by chunk.
///
/// Best-effort per chunk: a failed send is logged and the remaining chunks
/// are still transmitted. There is no rollback and no retry.
pub async fn send_frame(socket: &UdpSocket, frame_id: u16, payload: &[u8], dest: SocketAddr) {
    let datagrams = encode_datagrams(frame_id, payload);
    let total_chunks = datagrams.len();

    for (index, datagram) in datagrams.iter().enumerate() {
        if let Err(e) = socket.send_to(datagram, dest).await {
            tracing::warn!(frame_id, chunk = index, error = %e, "chunk send failed");
        }
    }

    tracing::trace!(
        frame_id,
        total_chunks,
        bytes = payload.len(),
        "frame sent"
    );
}
