//! MatchHub client.
//!
//! Everything around the Sans-IO [`ChatSession`](matchhub_core::ChatSession)
//! that touches the outside world:
//!
//! - [`ApiClient`]: typed REST calls (auth, profile, rooms, history, matching,
//!   payments, uploads)
//! - [`SessionRunner`] / [`SessionHandle`]: async driver that executes session
//!   actions over a [`Transport`]
//! - [`ClientConfig`]: endpoints and timing, from defaults, environment, or
//!   flags
//! - [`TokenStore`]: persisted access/refresh tokens
//!
//! # Transport
//!
//! The WebSocket implementation ([`WsTransport`]) is behind the `transport`
//! feature; the runner itself is generic over [`Transport`], so tests drive it
//! with a scripted in-memory transport.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod api;
pub mod config;
mod endpoint;
pub mod error;
pub mod models;
mod runner;
mod system_env;
mod token_store;
mod transport;

pub use api::{ApiClient, ApiRequest, Method};
pub use config::{ClientConfig, ConfigError};
pub use endpoint::{chat_url, websocket_base};
pub use error::{ApiError, ErrorCode};
pub use runner::{RunnerStopped, SessionHandle, SessionRunner};
pub use system_env::SystemEnv;
pub use token_store::{TokenStore, TokenStoreError};
#[cfg(feature = "transport")]
pub use transport::WsTransport;
pub use transport::{Transport, TransportError};
