// ABOUTME: UDP listener for the DNS lookup surface.
// ABOUTME: Receives datagrams, answers each one on its own task, and sends exactly one reply.

use std::net::SocketAddr;
use std::sync::Arc;

use hickory_proto::ProtoError;
use hickory_proto::op::Message;
use thiserror::Error;
use timespotter_core::OccurrenceStore;
use tokio::net::UdpSocket;

use crate::query::answer;

/// Largest datagram accepted from a client.
const MAX_DATAGRAM: usize = 4096;

/// Errors that can occur while serving DNS.
#[derive(Debug, Error)]
pub enum DnsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dns protocol error: {0}")]
    Proto(#[from] ProtoError),
}

/// Bind the UDP socket for the DNS listener.
pub async fn bind(addr: SocketAddr) -> Result<UdpSocket, DnsError> {
    let socket = UdpSocket::bind(addr).await?;
    tracing::info!(addr = %socket.local_addr()?, "DNS socket bound");
    Ok(socket)
}

/// Serve queries on `socket` until receiving fails. Each datagram is handled
/// on its own task so slow lookups do not block the receive loop.
pub async fn serve(socket: UdpSocket, store: Arc<OccurrenceStore>) -> Result<(), DnsError> {
    let socket = Arc::new(socket);
    let mut buf = vec![0u8; MAX_DATAGRAM];

    loop {
        let (len, peer) = socket.recv_from(&mut buf).await?;
        let packet = buf[..len].to_vec();
        let socket = Arc::clone(&socket);
        let store = Arc::clone(&store);

        tokio::spawn(async move {
            if let Err(e) = handle_packet(&socket, &store, &packet, peer).await {
                tracing::warn!(%peer, "dns request failed: {}", e);
            }
        });
    }
}

async fn handle_packet(
    socket: &UdpSocket,
    store: &OccurrenceStore,
    packet: &[u8],
    peer: SocketAddr,
) -> Result<(), DnsError> {
    let request = Message::from_vec(packet)?;
    let response = answer(store, &request);
    socket.send_to(&response.to_vec()?, peer).await?;
    Ok(())
}
