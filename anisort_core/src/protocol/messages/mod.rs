//! Command and reply value objects
//!
//! Only the subset of the AniDB UDP API used for authentication and file
//! lookup is modelled here.

pub mod auth;
pub mod command;
pub mod file;
pub mod response;

pub use auth::AuthResult;
pub use command::{Command, ParamValue, SESSION_PARAM, UNAUTHENTICATED_COMMANDS};
pub use file::{FileSearchResult, parse_lookup};
pub use response::Response;

/// Reply to PING
pub const PONG: u16 = 300;
