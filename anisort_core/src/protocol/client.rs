//! Rate limited request/reply client for the AniDB UDP API
//!
//! One command is in flight at a time. Every send waits until the cooldown since
//! the previous send has passed, and the next command cannot start until the
//! current one has its reply or has timed out.

use crate::error::{ConnectionError, Error, ProtocolError, Result, ValidationError};
use crate::hashing::ContentHash;
use crate::protocol::codec::{Decoder, Encoder};
use crate::protocol::messages::file::{FILE_FOUND, NO_SUCH_FILE};
use crate::protocol::messages::{
    AuthResult, Command, FileSearchResult, PONG, Response, SESSION_PARAM, parse_lookup,
};
use crate::protocol::transport::{ConnectionState, Transport, UdpTransport};
use crate::protocol::{AnimeMask, FileMask};
use crate::security::Credentials;
use crate::shutdown::Shutdown;
use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tokio::time::{Instant, sleep, timeout};

/// Protocol client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Server hostname or IP address
    pub server_host: String,
    pub server_port: u16,
    /// Local UDP port to bind
    pub local_port: u16,
    /// Registered client name sent with AUTH
    pub client_name: String,
    pub client_version: String,
    /// Seconds to wait for a reply
    pub request_timeout_secs: u64,
    /// Milliseconds between two sends
    pub send_cooldown_ms: u64,
}

impl ProtocolConfig {
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn send_cooldown(&self) -> Duration {
        Duration::from_millis(self.send_cooldown_ms)
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            server_host: crate::protocol::DEFAULT_SERVER.to_string(),
            server_port: crate::protocol::DEFAULT_PORT,
            local_port: crate::protocol::DEFAULT_LOCAL_PORT,
            client_name: "anisort".to_string(),
            client_version: "1".to_string(),
            request_timeout_secs: crate::protocol::REQUEST_TIMEOUT.as_secs(),
            send_cooldown_ms: crate::protocol::SEND_COOLDOWN.as_millis() as u64,
        }
    }
}

/// Serializes exchanges and spaces out sends
struct RateLimiter {
    last_send: Mutex<Option<Instant>>,
    min_delay: Duration,
}

impl RateLimiter {
    fn new(min_delay: Duration) -> Self {
        Self {
            last_send: Mutex::new(None),
            min_delay,
        }
    }

    /// Wait for the cooldown and claim the send slot.
    ///
    /// The returned guard must be held until the reply arrives.
    async fn acquire(&self) -> MutexGuard<'_, Option<Instant>> {
        let mut last = self.last_send.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_delay {
                let wait_time = self.min_delay - elapsed;
                debug!("Rate limiter: waiting {wait_time:?} to respect rate limit");
                sleep(wait_time).await;
            } else {
                trace!("Rate limiter: no wait needed, last send was {elapsed:?} ago");
            }
        }

        *last = Some(Instant::now());
        last
    }
}

/// AniDB protocol client
pub struct ProtocolClient {
    config: ProtocolConfig,
    encoder: Encoder,
    decoder: Decoder,
    transport: RwLock<Option<Arc<dyn Transport>>>,
    state: RwLock<ConnectionState>,
    rate_limiter: RateLimiter,
    /// Set once a fatal error has been seen
    halted: OnceLock<String>,
    closed: Shutdown,
}

impl ProtocolClient {
    /// Create a disconnected client. Call [`connect`](Self::connect) before use.
    pub fn new(config: ProtocolConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a client that is already connected over the given transport
    pub fn with_transport(config: ProtocolConfig, transport: Arc<dyn Transport>) -> Self {
        Self::build(config, Some(transport))
    }

    fn build(config: ProtocolConfig, transport: Option<Arc<dyn Transport>>) -> Self {
        let state = match transport {
            Some(_) => ConnectionState::Connected,
            None => ConnectionState::Disconnected,
        };
        Self {
            rate_limiter: RateLimiter::new(config.send_cooldown()),
            config,
            encoder: Encoder::new(),
            decoder: Decoder::new(),
            transport: RwLock::new(transport),
            state: RwLock::new(state),
            halted: OnceLock::new(),
            closed: Shutdown::new(),
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Bind the local port and connect to the configured server
    pub async fn connect(&self) -> Result<()> {
        if self.closed.is_triggered() {
            return Err(ConnectionError::Closed.into());
        }
        if self.state.read().await.is_connected() {
            return Ok(());
        }

        let server = self.config.server_address();
        debug!(
            "Connecting to {server} from local port {}",
            self.config.local_port
        );
        let transport = UdpTransport::connect(self.config.local_port, &server)
            .await
            .map_err(|e| {
                warn!("Failed to connect to AniDB server {server}: {e}");
                ConnectionError::socket("connect", e)
            })?;

        *self.transport.write().await = Some(Arc::new(transport));
        *self.state.write().await = ConnectionState::Connected;
        debug!("Connected to AniDB server {server}");
        Ok(())
    }

    /// AUTH with explicit client identity.
    ///
    /// A rejected login is returned as an unsuccessful [`AuthResult`]; fatal
    /// status codes are returned as errors.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        client_name: &str,
        client_version: &str,
    ) -> Result<AuthResult> {
        debug!("Authenticating as {username} with client {client_name} v{client_version}");
        let command = Command::auth(username, password, client_name, client_version);
        let response = self.send_command(command).await?;
        let result = AuthResult::from_response(&response)?;

        match &result.session {
            Some(session) => {
                *self.state.write().await = ConnectionState::Authenticated {
                    session: session.clone(),
                };
                info!("Logged in to AniDB as {username}");
                if result.has_new_version {
                    warn!("A newer client version is available");
                }
            }
            None => warn!("AniDB login failed: {} {}", result.code, result.message),
        }

        Ok(result)
    }

    /// AUTH with the configured client identity
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResult> {
        let password = credentials
            .password
            .to_str()
            .map_err(|_| ValidationError::invalid_parameter("password", "not valid UTF-8"))?;
        self.authenticate(
            &credentials.username,
            password,
            &self.config.client_name,
            &self.config.client_version,
        )
        .await
    }

    /// Best-effort LOGOUT. Failures are logged and the session is dropped anyway.
    pub async fn logout(&self) {
        if !self.is_authenticated().await {
            return;
        }

        match self.send_command(Command::logout()).await {
            Ok(response) => debug!("Logged out: {} {}", response.code, response.message),
            Err(e) => warn!("Logout failed: {e}"),
        }

        let mut state = self.state.write().await;
        if state.is_authenticated() {
            *state = ConnectionState::Connected;
        }
    }

    pub async fn ping(&self) -> Result<()> {
        let response = self.send_command(Command::ping()).await?;
        if response.code == PONG {
            Ok(())
        } else {
            Err(ProtocolError::unexpected_response("PING", response.code, &response.message).into())
        }
    }

    /// FILE lookup by size and content hash
    pub async fn search_for_file(
        &self,
        size: u64,
        hash: &ContentHash,
        file_mask: FileMask,
        anime_mask: AnimeMask,
    ) -> Result<FileSearchResult> {
        let command = Command::file_by_hash(size, hash, file_mask, anime_mask);
        let response = self.send_command(command).await?;

        match response.code {
            FILE_FOUND => {
                let lookup = parse_lookup(&response, file_mask, anime_mask)?;
                debug!("File {hash} found with fid {}", lookup.file.fid);
                Ok(FileSearchResult::Found(Box::new(lookup)))
            }
            NO_SUCH_FILE => {
                debug!("No AniDB file for {hash} ({size} bytes)");
                Ok(FileSearchResult::NotFound)
            }
            code => Err(ProtocolError::unexpected_response("FILE", code, &response.message).into()),
        }
    }

    /// Send one command and wait for its reply.
    ///
    /// Replies with a global status code are returned as errors.
    pub async fn send_command(&self, mut command: Command) -> Result<Response> {
        if let Some(reason) = self.halted.get() {
            return Err(ConnectionError::Halted {
                reason: reason.clone(),
            }
            .into());
        }
        if self.closed.is_triggered() {
            return Err(ConnectionError::Closed.into());
        }

        {
            let state = self.state.read().await;
            if !state.is_connected() {
                return Err(ConnectionError::NotConnected.into());
            }
            match state.session() {
                Some(session) => command.set_param(SESSION_PARAM, session),
                None if command.requires_auth() => {
                    return Err(ProtocolError::authentication_required(command.name()).into());
                }
                None => {}
            }
        }

        let transport = self
            .transport
            .read()
            .await
            .clone()
            .ok_or(ConnectionError::NotConnected)?;

        let datagram = self.encoder.encode(&command)?;

        let _slot = self.rate_limiter.acquire().await;
        debug!("Sending {}", Encoder::masked(&datagram));
        transport
            .send(&datagram)
            .await
            .map_err(|e| ConnectionError::socket("send", e))?;

        let reply = match self.await_reply(transport.as_ref()).await {
            Ok(reply) => reply,
            Err(e) => {
                if e.is_fatal() {
                    self.halt(&e);
                }
                return Err(e);
            }
        };

        let response = self.decoder.decode(&reply)?;
        debug!(
            "Received {} {} ({} lines) for {}",
            response.code,
            response.message,
            response.lines.len(),
            command.name()
        );

        if let Some(status) = crate::protocol::status::global_error(&response) {
            let error = Error::from(status);
            if error.is_fatal() {
                error!("AniDB refused {}: {error}", command.name());
                self.halt(&error);
            } else {
                warn!("AniDB returned an error for {}: {error}", command.name());
            }
            return Err(error);
        }

        Ok(response)
    }

    async fn await_reply(&self, transport: &dyn Transport) -> Result<Vec<u8>> {
        let request_timeout = self.config.request_timeout();
        tokio::select! {
            result = timeout(request_timeout, transport.recv()) => match result {
                Ok(Ok(reply)) => Ok(reply),
                Ok(Err(e)) => Err(ConnectionError::socket("receive", e).into()),
                Err(_) => {
                    error!("No reply from AniDB within {request_timeout:?}");
                    Err(ConnectionError::no_reply(request_timeout).into())
                }
            },
            _ = self.closed.triggered() => Err(ConnectionError::Closed.into()),
        }
    }

    fn halt(&self, error: &Error) {
        if self.halted.set(error.to_string()).is_ok() {
            error!("Halting all AniDB traffic: {error}");
        }
    }

    /// Log out if needed, wake any pending request and release the socket.
    /// The client cannot be reconnected afterwards.
    pub async fn close(&self) {
        self.logout().await;
        self.closed.trigger();
        *self.transport.write().await = None;
        *self.state.write().await = ConnectionState::Disconnected;
        debug!("Protocol client closed");
    }

    pub async fn state(&self) -> ConnectionState {
        self.state.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    pub async fn session_token(&self) -> Option<String> {
        self.state.read().await.session().map(str::to_string)
    }

    /// Reason traffic was halted, if a fatal error occurred
    pub fn halted(&self) -> Option<&str> {
        self.halted.get().map(String::as_str)
    }
}

impl Drop for ProtocolClient {
    fn drop(&mut self) {
        self.closed.trigger();

        let Some(session) = self.state.get_mut().session().map(str::to_string) else {
            return;
        };
        let Some(transport) = self.transport.get_mut().take() else {
            return;
        };

        let command = Command::logout().param(SESSION_PARAM, session);
        match self.encoder.encode(&command) {
            Ok(datagram) => match transport.try_send(&datagram) {
                Ok(()) => debug!("Sent LOGOUT on drop"),
                Err(e) => debug!("LOGOUT on drop failed: {e}"),
            },
            Err(e) => debug!("Could not encode LOGOUT on drop: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::io;

    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Vec<u8>>>,
        sent: std::sync::Mutex<Vec<(Instant, String)>>,
    }

    impl ScriptedTransport {
        fn with_replies(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| r.as_bytes().to_vec()).collect()),
                ..Default::default()
            })
        }

        fn sent(&self) -> Vec<(Instant, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, datagram: &[u8]) -> io::Result<()> {
            self.try_send(datagram)
        }

        async fn recv(&self) -> io::Result<Vec<u8>> {
            let next = self.replies.lock().await.pop_front();
            match next {
                Some(reply) => Ok(reply),
                None => std::future::pending().await,
            }
        }

        fn try_send(&self, datagram: &[u8]) -> io::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((Instant::now(), String::from_utf8_lossy(datagram).into_owned()));
            Ok(())
        }
    }

    fn client(transport: Arc<ScriptedTransport>) -> ProtocolClient {
        ProtocolClient::with_transport(ProtocolConfig::default(), transport)
    }

    #[test]
    fn test_protocol_config_default() {
        let config = ProtocolConfig::default();
        assert_eq!(config.server_address(), "api.anidb.net:9000");
        assert_eq!(config.local_port, 4556);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.send_cooldown(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_spaces_sends() {
        let limiter = RateLimiter::new(Duration::from_secs(2));

        let start = Instant::now();
        drop(limiter.acquire().await);
        assert_eq!(start.elapsed(), Duration::ZERO);

        drop(limiter.acquire().await);
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_disconnected_client_refuses_commands() {
        let client = ProtocolClient::new(ProtocolConfig::default());
        let result = client.ping().await;
        assert!(matches!(
            result,
            Err(Error::Connection(ConnectionError::NotConnected))
        ));
    }

    #[tokio::test]
    async fn test_authenticated_command_requires_session() {
        let transport = ScriptedTransport::with_replies(&[]);
        let client = client(transport.clone());

        let result = client.send_command(Command::new("FILE")).await;
        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::AuthenticationRequired { .. }))
        ));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_is_injected_after_login() {
        let transport = ScriptedTransport::with_replies(&["200 tok42 LOGIN ACCEPTED", "300 PONG"]);
        let client = client(transport.clone());

        let result = client.authenticate("user", "pw", "anisort", "1").await.unwrap();
        assert!(result.success);
        assert_eq!(client.session_token().await.as_deref(), Some("tok42"));

        client.ping().await.unwrap();
        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].1.starts_with("PING s=tok42"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_reply_is_fatal_and_halts() {
        let transport = ScriptedTransport::with_replies(&[]);
        let client = client(transport.clone());

        let error = client.ping().await.unwrap_err();
        assert!(matches!(
            error,
            Error::Connection(ConnectionError::NoReply { .. })
        ));
        assert!(error.is_fatal());

        let error = client.ping().await.unwrap_err();
        assert!(matches!(
            error,
            Error::Connection(ConnectionError::Halted { .. })
        ));
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_drop_sends_logout_when_authenticated() {
        let transport = ScriptedTransport::with_replies(&["200 tok LOGIN ACCEPTED"]);
        let client = client(transport.clone());
        client.authenticate("user", "pw", "anisort", "1").await.unwrap();

        drop(client);
        let sent = transport.sent();
        assert_eq!(sent.last().map(|(_, s)| s.as_str()), Some("LOGOUT s=tok"));
    }
}
