//! MatchHub command-line client.
//!
//! One-shot subcommands wrap the REST flows of
//! [`ApiClient`](matchhub_client::ApiClient); `chat` runs a
//! [`SessionRunner`](matchhub_client::SessionRunner) over a WebSocket and
//! reads messages from stdin.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod args;
pub mod chat;
mod commands;
pub mod context;
pub mod error;
pub mod render;

pub use args::{Args, Command};
pub use commands::run;
pub use context::Context;
pub use error::CliError;
