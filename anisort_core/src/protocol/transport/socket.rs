//! Tokio UDP socket transport

use super::{RECV_BUFFER_SIZE, Transport};
use async_trait::async_trait;
use log::debug;
use std::io;
use std::net::SocketAddr;
use tokio::net::{UdpSocket, lookup_host};

/// UDP socket bound to a fixed local port and connected to the server
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Bind `local_port` on all interfaces and connect to `server`.
    ///
    /// The socket is dropped if any step fails.
    pub async fn connect(local_port: u16, server: &str) -> io::Result<Self> {
        let server_addr = lookup_host(server).await?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("No addresses found for '{server}'"),
            )
        })?;

        let bind_addr: SocketAddr = if server_addr.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], local_port))
        } else {
            SocketAddr::from(([0u16; 8], local_port))
        };

        debug!("Binding UDP socket on {bind_addr} for {server_addr}");
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(server_addr).await?;

        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&self, datagram: &[u8]) -> io::Result<()> {
        let sent = self.socket.send(datagram).await?;
        if sent != datagram.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("sent {sent} of {} bytes", datagram.len()),
            ));
        }
        Ok(())
    }

    async fn recv(&self) -> io::Result<Vec<u8>> {
        let mut buffer = vec![0u8; RECV_BUFFER_SIZE];
        let received = self.socket.recv(&mut buffer).await?;
        buffer.truncate(received);
        Ok(buffer)
    }

    fn try_send(&self, datagram: &[u8]) -> io::Result<()> {
        self.socket.try_send(datagram).map(|_| ())
    }
}
