//! CLI errors.

use std::{io, path::PathBuf};

use matchhub_client::{ApiError, ConfigError, RunnerStopped, TokenStoreError};
use thiserror::Error;

/// Anything a command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    /// No saved tokens, or the refresh token was rejected
    #[error("not logged in; run `matchhub verify <email> <otp>` first")]
    NotLoggedIn,

    /// REST call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Bad URL or setting
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Token file could not be read or written
    #[error(transparent)]
    Tokens(#[from] TokenStoreError),

    /// Input file could not be read
    #[error("{}: {source}", path.display())]
    File {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Terminal I/O failed
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The chat session stopped unexpectedly
    #[error(transparent)]
    Session(#[from] RunnerStopped),
}
