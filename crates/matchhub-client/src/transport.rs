//! Socket transport for the session runner.
//!
//! [`Transport`] is the seam between the [`SessionRunner`](crate::SessionRunner)
//! and the network: open a socket, move text frames, close it. Protocol logic
//! stays in the Sans-IO [`ChatSession`](matchhub_core::ChatSession).
//!
//! [`WsTransport`] (feature `transport`) implements it over
//! `tokio-tungstenite`. Tests use a scripted in-memory implementation.

use std::{future::Future, time::Duration};

use thiserror::Error;
use url::Url;

/// Transport errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Handshake did not finish in time.
    #[error("connection timed out after {0:?}")]
    Timeout(Duration),

    /// Reading or writing failed on an open connection.
    #[error("stream error: {0}")]
    Stream(String),

    /// Operation needs an open connection.
    #[error("not connected")]
    NotConnected,
}

/// A text-frame socket.
///
/// One transport carries at most one connection at a time. `connect` on an
/// open transport replaces the old connection.
pub trait Transport: Send {
    /// Open a connection to `url`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Connection` if the handshake fails.
    fn connect(&mut self, url: &Url) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Send one text frame.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::NotConnected` without a connection, or
    /// `TransportError::Stream` if the write fails.
    fn send(&mut self, text: String) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Next inbound text frame.
    ///
    /// Returns `None` once the peer closed the connection (or there is none).
    /// Must be cancel-safe: the runner polls it inside `tokio::select!`.
    fn recv(&mut self) -> impl Future<Output = Option<Result<String, TransportError>>> + Send;

    /// Close the connection, if any.
    fn close(&mut self) -> impl Future<Output = ()> + Send;

    /// Whether a connection is open.
    fn is_connected(&self) -> bool;
}

#[cfg(feature = "transport")]
pub use ws::WsTransport;

#[cfg(feature = "transport")]
mod ws {
    use futures::{SinkExt, StreamExt};
    use tokio::net::TcpStream;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};
    use tracing::debug;
    use url::Url;

    use super::{Transport, TransportError};

    type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

    /// WebSocket transport over `tokio-tungstenite`.
    ///
    /// `wss` endpoints need the `tls` feature.
    #[derive(Default)]
    pub struct WsTransport {
        stream: Option<WsStream>,
    }

    impl WsTransport {
        /// Create a transport with no connection.
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl std::fmt::Debug for WsTransport {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("WsTransport").field("connected", &self.stream.is_some()).finish()
        }
    }

    impl Transport for WsTransport {
        async fn connect(&mut self, url: &Url) -> Result<(), TransportError> {
            self.close().await;

            let (stream, response) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| TransportError::Connection(e.to_string()))?;
            debug!(status = %response.status(), "websocket handshake complete");

            self.stream = Some(stream);
            Ok(())
        }

        async fn send(&mut self, text: String) -> Result<(), TransportError> {
            let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
            stream.send(Message::text(text)).await.map_err(|e| TransportError::Stream(e.to_string()))
        }

        async fn recv(&mut self) -> Option<Result<String, TransportError>> {
            loop {
                let next = self.stream.as_mut()?.next().await;
                match next {
                    Some(Ok(Message::Text(text))) => return Some(Ok(text.as_str().to_owned())),
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => return Some(Ok(text)),
                        Err(_) => debug!("dropping non-UTF-8 binary frame"),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        debug!(?frame, "websocket closed by peer");
                        self.stream = None;
                        return None;
                    },
                    // Ping, pong, and raw frames; tungstenite answers pings itself.
                    Some(Ok(_)) => {},
                    Some(Err(e)) => {
                        self.stream = None;
                        return Some(Err(TransportError::Stream(e.to_string())));
                    },
                    None => {
                        self.stream = None;
                        return None;
                    },
                }
            }
        }

        async fn close(&mut self) {
            if let Some(mut stream) = self.stream.take() {
                if let Err(error) = stream.close(None).await {
                    debug!(%error, "websocket close failed");
                }
            }
        }

        fn is_connected(&self) -> bool {
            self.stream.is_some()
        }
    }
}
