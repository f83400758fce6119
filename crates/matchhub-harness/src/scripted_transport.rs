//! In-memory transport driven by the test.
//!
//! [`ScriptedTransport`] goes to the code under test; the matching
//! [`ScriptedPeer`] stays with the test and plays the server: it pushes
//! inbound frames, closes or breaks the connection, refuses or stalls
//! connects, and records everything the client sent.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use matchhub_client::{Transport, TransportError};
use tokio::sync::mpsc;
use tracing::trace;
use url::Url;

#[derive(Debug)]
enum Inbound {
    Frame(String),
    Close,
    Fail(String),
}

#[derive(Debug, Default)]
struct Shared {
    connects: Vec<Url>,
    sent: Vec<String>,
    refuse: Option<String>,
    handshake: Duration,
    inbound: Option<mpsc::UnboundedSender<Inbound>>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Client half: implements [`Transport`].
#[derive(Debug)]
pub struct ScriptedTransport {
    shared: Arc<Mutex<Shared>>,
    inbound: Option<mpsc::UnboundedReceiver<Inbound>>,
}

impl ScriptedTransport {
    /// Create a transport and the peer that scripts it.
    pub fn pair() -> (Self, ScriptedPeer) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        (Self { shared: Arc::clone(&shared), inbound: None }, ScriptedPeer { shared })
    }
}

impl Transport for ScriptedTransport {
    async fn connect(&mut self, url: &Url) -> Result<(), TransportError> {
        let handshake = {
            let mut shared = lock(&self.shared);
            shared.connects.push(url.clone());
            shared.handshake
        };
        if !handshake.is_zero() {
            tokio::time::sleep(handshake).await;
        }

        let mut shared = lock(&self.shared);

        if let Some(reason) = shared.refuse.clone() {
            shared.inbound = None;
            self.inbound = None;
            return Err(TransportError::Connection(reason));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        shared.inbound = Some(tx);
        self.inbound = Some(rx);
        trace!(%url, "scripted connect");
        Ok(())
    }

    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        if self.inbound.is_none() {
            return Err(TransportError::NotConnected);
        }
        lock(&self.shared).sent.push(text);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        let next = self.inbound.as_mut()?.recv().await;
        match next {
            Some(Inbound::Frame(text)) => Some(Ok(text)),
            Some(Inbound::Fail(reason)) => {
                self.inbound = None;
                Some(Err(TransportError::Stream(reason)))
            },
            Some(Inbound::Close) | None => {
                self.inbound = None;
                None
            },
        }
    }

    async fn close(&mut self) {
        self.inbound = None;
        lock(&self.shared).inbound = None;
    }

    fn is_connected(&self) -> bool {
        self.inbound.is_some()
    }
}

/// Server half, held by the test.
#[derive(Debug, Clone)]
pub struct ScriptedPeer {
    shared: Arc<Mutex<Shared>>,
}

impl ScriptedPeer {
    /// Deliver a text frame on the current connection.
    ///
    /// Returns `false` if there is no open connection.
    pub fn push_frame(&self, text: impl Into<String>) -> bool {
        self.deliver(Inbound::Frame(text.into()))
    }

    /// Close the current connection cleanly.
    pub fn close_connection(&self) -> bool {
        let delivered = self.deliver(Inbound::Close);
        lock(&self.shared).inbound = None;
        delivered
    }

    /// Break the current connection with a stream error.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        let delivered = self.deliver(Inbound::Fail(reason.into()));
        lock(&self.shared).inbound = None;
        delivered
    }

    /// Make later connects fail with `reason`.
    pub fn refuse_connects(&self, reason: impl Into<String>) {
        lock(&self.shared).refuse = Some(reason.into());
    }

    /// Let later connects succeed again.
    pub fn accept_connects(&self) {
        lock(&self.shared).refuse = None;
    }

    /// Make later handshakes take `duration` before they resolve.
    pub fn stall_connects(&self, duration: Duration) {
        lock(&self.shared).handshake = duration;
    }

    /// Whether the client currently holds a connection.
    pub fn is_connected(&self) -> bool {
        lock(&self.shared).inbound.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Every text frame the client sent, in order.
    pub fn sent(&self) -> Vec<String> {
        lock(&self.shared).sent.clone()
    }

    /// Drain the sent frames.
    pub fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut lock(&self.shared).sent)
    }

    /// Every URL the client connected to, refused attempts included.
    pub fn connects(&self) -> Vec<Url> {
        lock(&self.shared).connects.clone()
    }

    fn deliver(&self, inbound: Inbound) -> bool {
        lock(&self.shared).inbound.as_ref().is_some_and(|tx| tx.send(inbound).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("ws://localhost:8000/ws/chat/r1/?token=t").unwrap()
    }

    #[tokio::test]
    async fn frames_flow_both_ways() {
        let (mut transport, peer) = ScriptedTransport::pair();
        assert!(!peer.push_frame("early"));

        transport.connect(&url()).await.unwrap();
        assert!(transport.is_connected());
        assert!(peer.is_connected());

        assert!(peer.push_frame("hello"));
        assert_eq!(transport.recv().await, Some(Ok("hello".to_string())));

        transport.send("out".to_string()).await.unwrap();
        assert_eq!(peer.sent(), vec!["out".to_string()]);
        assert_eq!(peer.connects(), vec![url()]);
    }

    #[tokio::test]
    async fn peer_close_ends_the_stream() {
        let (mut transport, peer) = ScriptedTransport::pair();
        transport.connect(&url()).await.unwrap();

        assert!(peer.close_connection());
        assert_eq!(transport.recv().await, None);
        assert!(!transport.is_connected());
        assert_eq!(transport.send("x".to_string()).await, Err(TransportError::NotConnected));
    }

    #[tokio::test]
    async fn failure_surfaces_as_stream_error() {
        let (mut transport, peer) = ScriptedTransport::pair();
        transport.connect(&url()).await.unwrap();

        assert!(peer.fail("reset"));
        assert_eq!(transport.recv().await, Some(Err(TransportError::Stream("reset".to_string()))));
        assert!(!transport.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_connects_resolve_after_the_delay() {
        let (mut transport, peer) = ScriptedTransport::pair();
        peer.stall_connects(Duration::from_secs(5));

        let start = tokio::time::Instant::now();
        transport.connect(&url()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert!(transport.is_connected());
    }

    #[tokio::test]
    async fn refused_connects_are_recorded() {
        let (mut transport, peer) = ScriptedTransport::pair();
        peer.refuse_connects("403");

        let result = transport.connect(&url()).await;
        assert_eq!(result, Err(TransportError::Connection("403".to_string())));
        assert_eq!(peer.connects().len(), 1);

        peer.accept_connects();
        transport.connect(&url()).await.unwrap();
        assert!(transport.is_connected());
    }
}
