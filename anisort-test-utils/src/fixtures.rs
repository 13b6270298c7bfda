//! Canned AniDB replies

pub const AUTH_ACCEPTED: &str = "200 abc123 LOGIN ACCEPTED";
pub const AUTH_ACCEPTED_NEW_VERSION: &str = "201 abc123 LOGIN ACCEPTED - NEW VERSION AVAILABLE";
pub const AUTH_FAILED: &str = "500 LOGIN FAILED";
pub const PONG: &str = "300 PONG";
pub const LOGGED_OUT: &str = "203 LOGGED OUT";
pub const NO_SUCH_FILE: &str = "320 NO SUCH FILE";
pub const BANNED: &str = "555 BANNED your ban reason";
pub const SERVER_BUSY: &str = "602 SERVER BUSY";
pub const LOGIN_FIRST: &str = "501 LOGIN FIRST";
