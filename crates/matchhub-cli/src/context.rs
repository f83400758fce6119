//! Shared state for one CLI invocation.

use std::future::Future;

use matchhub_client::{
    ApiClient, ApiError, ClientConfig, TokenStore, config::parse_url, models::AuthTokens,
};
use tracing::info;

use crate::{args::Args, error::CliError};

/// Configuration, API client and token store.
#[derive(Debug, Clone)]
pub struct Context {
    /// Resolved configuration
    pub config: ClientConfig,
    /// REST client
    pub api: ApiClient,
    /// Saved login
    pub store: TokenStore,
}

impl Context {
    /// Resolve configuration from the environment, then apply flags.
    pub fn from_args(args: &Args) -> Result<Self, CliError> {
        let mut config = ClientConfig::from_env()?;
        if let Some(url) = &args.api_url {
            config.api_url = parse_url("--api-url", url)?;
        }
        if let Some(url) = &args.ws_url {
            config.ws_url = Some(parse_url("--ws-url", url)?);
        }
        // Fail early rather than at the first chat.
        config.websocket_base()?;

        Ok(Self::new(config, TokenStore::new(&args.token_file))?)
    }

    /// Context over an explicit configuration.
    pub fn new(config: ClientConfig, store: TokenStore) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config)?;
        Ok(Self { config, api, store })
    }

    /// Saved tokens.
    ///
    /// # Errors
    ///
    /// `CliError::NotLoggedIn` when there are none.
    pub async fn tokens(&self) -> Result<AuthTokens, CliError> {
        self.store.load().await?.ok_or(CliError::NotLoggedIn)
    }

    /// Run an authenticated call with the saved access token.
    ///
    /// If the server rejects the token as expired, the refresh token is traded
    /// for a new one, the new pair is saved and the call is retried once. A
    /// rejected refresh token clears the saved login.
    pub async fn authed<T, F, Fut>(&self, call: F) -> Result<T, CliError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let tokens = self.tokens().await?;

        match call(tokens.access).await {
            Err(error) if error.is_auth() => {
                info!("access token rejected, refreshing");
                let renewed = match self.api.refresh_access(&tokens.refresh).await {
                    Ok(renewed) => renewed,
                    Err(error) if error.is_auth() => {
                        self.store.clear().await?;
                        return Err(CliError::NotLoggedIn);
                    },
                    Err(error) => return Err(error.into()),
                };
                self.store.save(&renewed).await?;
                Ok(call(renewed.access).await?)
            },
            result => Ok(result?),
        }
    }
}
