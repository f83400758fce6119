//! Persisted login tokens.
//!
//! One small JSON file, `{"access": "...", "refresh": "..."}`. A file that
//! does not decode is deleted and treated as logged out.

use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::AuthTokens;

/// Token store errors.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// Filesystem failure
    #[error("token store {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Tokens could not be serialized
    #[error("token store encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// File-backed storage for [`AuthTokens`].
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Store at `path`. Nothing is touched until the first call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved tokens, or `None` when logged out.
    pub async fn load(&self) -> Result<Option<AuthTokens>, TokenStoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };

        match serde_json::from_slice::<AuthTokens>(&bytes) {
            Ok(tokens) => Ok(Some(tokens)),
            Err(error) => {
                warn!(path = %self.path.display(), %error, "discarding corrupt token file");
                self.clear().await?;
                Ok(None)
            },
        }
    }

    /// Replace the saved tokens.
    ///
    /// Writes a sibling temp file and renames it over the old one, so a crash
    /// never leaves a half-written file behind.
    pub async fn save(&self, tokens: &AuthTokens) -> Result<(), TokenStoreError> {
        let bytes = serde_json::to_vec(tokens)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| self.io_error(e))?;
        }

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await.map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), "tokens saved");
        Ok(())
    }

    /// Forget the saved tokens. Succeeds when there were none.
    pub async fn clear(&self) -> Result<(), TokenStoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: io::Error) -> TokenStoreError {
        TokenStoreError::Io { path: self.path.clone(), source }
    }
}
