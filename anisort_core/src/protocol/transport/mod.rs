//! Transport layer for UDP communication
//!
//! [`Transport`] is the seam between the protocol client and the socket, so the
//! client can be driven by a scripted transport in tests.

mod socket;
mod state;

pub use socket::UdpTransport;
pub use state::ConnectionState;

use async_trait::async_trait;
use std::io;

/// Largest reply datagram accepted
pub const RECV_BUFFER_SIZE: usize = 1500;

/// One connected datagram endpoint
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one datagram
    async fn send(&self, datagram: &[u8]) -> io::Result<()>;

    /// Wait for the next datagram
    async fn recv(&self) -> io::Result<Vec<u8>>;

    /// Send without waiting. Used when dropping the client outside of async context.
    fn try_send(&self, datagram: &[u8]) -> io::Result<()>;
}
