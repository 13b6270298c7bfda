//! AniDB UDP protocol implementation
//!
//! - `codec`: command encoding, reply decoding and value escaping
//! - `masks`: field selectors for FILE lookups
//! - `messages`: command and reply value objects
//! - `status`: status codes shared by every command
//! - `transport`: the datagram seam and session state
//! - `client`: rate limited request/reply client

pub mod client;
pub mod codec;
pub mod masks;
pub mod messages;
pub mod status;
pub mod transport;

pub use client::{ProtocolClient, ProtocolConfig};
pub use masks::{AnimeField, AnimeMask, FileField, FileMask};
pub use messages::{AuthResult, Command, FileSearchResult, Response};
pub use transport::{ConnectionState, Transport, UdpTransport};

use std::time::Duration;

/// Protocol version sent with AUTH
pub const PROTOCOL_VERSION: &str = "3";

/// Maximum UDP packet size (considering PPPoE)
pub const MAX_PACKET_SIZE: usize = 1400;

/// Default AniDB server address
pub const DEFAULT_SERVER: &str = "api.anidb.net";

/// Default AniDB UDP port
pub const DEFAULT_PORT: u16 = 9000;

/// Local port the socket binds to
pub const DEFAULT_LOCAL_PORT: u16 = 4556;

/// How long to wait for a reply before assuming we are being refused
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum spacing between two outgoing commands
pub const SEND_COOLDOWN: Duration = Duration::from_secs(2);
