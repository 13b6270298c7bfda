//! Scripted datagram transport

use anisort_core::protocol::Transport;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::time::Instant;

type Responder = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// One datagram the client sent
#[derive(Debug, Clone)]
pub struct SentDatagram {
    pub at: Instant,
    pub payload: String,
}

impl SentDatagram {
    /// Command name, the text before the first space
    pub fn command(&self) -> &str {
        self.payload.split(' ').next().unwrap_or_default()
    }
}

/// Transport that answers each send from a script.
///
/// Every send consumes one scripted entry: either a reply that becomes
/// available to the next `recv`, or silence. Once the script runs out the
/// responder is asked, and without a responder the mock stays silent.
///
/// ```rust,no_run
/// use anisort_test_utils::MockTransport;
///
/// let transport = MockTransport::new()
///     .with_reply("200 abc123 LOGIN ACCEPTED")
///     .with_silence()
///     .into_shared();
/// ```
pub struct MockTransport {
    script: Mutex<VecDeque<Option<String>>>,
    responder: Option<Responder>,
    sent: Mutex<Vec<SentDatagram>>,
    inbound: mpsc::UnboundedSender<Vec<u8>>,
    replies: AsyncMutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        let (inbound, replies) = mpsc::unbounded_channel();
        Self {
            script: Mutex::new(VecDeque::new()),
            responder: None,
            sent: Mutex::new(Vec::new()),
            inbound,
            replies: AsyncMutex::new(replies),
        }
    }

    /// Answer the next unanswered send with `reply`
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.script.lock().unwrap().push_back(Some(reply.into()));
        self
    }

    /// Leave the next unanswered send without a reply
    pub fn with_silence(self) -> Self {
        self.script.lock().unwrap().push_back(None);
        self
    }

    /// Fallback once the script is exhausted
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    pub fn into_shared(self) -> std::sync::Arc<Self> {
        std::sync::Arc::new(self)
    }

    /// Queue a reply for a later send
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.script.lock().unwrap().push_back(Some(reply.into()));
    }

    pub fn sent(&self) -> Vec<SentDatagram> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_payloads(&self) -> Vec<String> {
        self.sent().into_iter().map(|datagram| datagram.payload).collect()
    }

    /// Number of sends of the named command
    pub fn count(&self, command: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|datagram| datagram.command() == command)
            .count()
    }

    fn answer(&self, payload: &str) -> Option<String> {
        let scripted = self.script.lock().unwrap().pop_front();
        match scripted {
            Some(reply) => reply,
            None => self.responder.as_ref().and_then(|respond| respond(payload)),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, datagram: &[u8]) -> io::Result<()> {
        self.try_send(datagram)
    }

    async fn recv(&self) -> io::Result<Vec<u8>> {
        match self.replies.lock().await.recv().await {
            Some(reply) => Ok(reply),
            None => std::future::pending().await,
        }
    }

    fn try_send(&self, datagram: &[u8]) -> io::Result<()> {
        let payload = String::from_utf8_lossy(datagram).into_owned();
        let reply = self.answer(&payload);
        self.sent.lock().unwrap().push(SentDatagram {
            at: Instant::now(),
            payload,
        });
        if let Some(reply) = reply {
            let _ = self.inbound.send(reply.into_bytes());
        }
        Ok(())
    }
}
