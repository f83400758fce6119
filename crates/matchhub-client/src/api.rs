//! REST API client.
//!
//! [`ApiClient::request`] is the single request path: JSON in, JSON out,
//! optional bearer token, and uniform [`ApiError`]s. The page-level flows
//! (register, rooms, matching, payments, ...) are thin typed wrappers over it.

use matchhub_core::{ChatMessage, RoomId};
use reqwest::{
    StatusCode,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use crate::{
    config::ClientConfig,
    error::{ApiError, ErrorCode},
    models::{
        AuthSession, AuthTokens, Candidate, ChatRoom, Match, MatchMode, Notice,
        PaymentInitiation, PaymentRequest, ProfileUpdate, RefreshedTokens, UploadResponse, User,
    },
};

/// HTTP method of an [`ApiRequest`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Patch => Self::PATCH,
            Method::Delete => Self::DELETE,
        }
    }
}

/// One REST call.
#[derive(Debug, Clone, Default)]
pub struct ApiRequest<'a> {
    /// HTTP method, GET by default
    pub method: Method,
    /// Bearer token, sent as `Authorization: Bearer <token>`
    pub token: Option<&'a str>,
    /// JSON body
    pub body: Option<Value>,
}

impl<'a> ApiRequest<'a> {
    /// GET without a body.
    pub fn get() -> Self {
        Self::default()
    }

    /// POST with a JSON body.
    pub fn post(body: Value) -> Self {
        Self { method: Method::Post, token: None, body: Some(body) }
    }

    /// PATCH with a JSON body.
    pub fn patch(body: Value) -> Self {
        Self { method: Method::Patch, token: None, body: Some(body) }
    }

    /// Attach a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: &'a str) -> Self {
        self.token = Some(token);
        self
    }
}

/// Typed client for the MatchHub REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
}

impl ApiClient {
    /// Client for `config.api_url` with the configured request timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ApiError::network)?;
        Ok(Self::with_http(config.api_url.clone(), http))
    }

    /// Client over an existing `reqwest::Client`.
    pub fn with_http(mut base: Url, http: reqwest::Client) -> Self {
        // Url::join replaces the last segment unless the base ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { base, http }
    }

    /// Base URL all paths are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Send one request and decode the JSON response.
    ///
    /// An empty success body decodes as JSON `null`.
    ///
    /// # Errors
    ///
    /// - `ErrorCode::Network` (status 0) if no response arrived
    /// - the status-derived code if the response was not 2xx
    /// - `ErrorCode::Decode` if the body is not the expected JSON
    ///
    /// [`ErrorCode`]: crate::ErrorCode
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        request: ApiRequest<'_>,
    ) -> Result<T, ApiError> {
        let url = self.url(path)?;
        self.request_url(url, request).await
    }

    /// `POST /api/auth/register/`: sends an OTP to `email`.
    pub async fn register(&self, email: &str, password: &str) -> Result<Notice, ApiError> {
        let body = json!({ "email": email, "password": password });
        self.request("/api/auth/register/", ApiRequest::post(body)).await
    }

    /// `POST /api/auth/verify-otp/`: completes registration or login.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<AuthSession, ApiError> {
        let body = json!({ "email": email, "otp": otp });
        self.request("/api/auth/verify-otp/", ApiRequest::post(body)).await
    }

    /// `POST /api/auth/resend-otp/`
    pub async fn resend_otp(&self, email: &str) -> Result<Notice, ApiError> {
        self.request("/api/auth/resend-otp/", ApiRequest::post(json!({ "email": email }))).await
    }

    /// `POST /api/auth/token/refresh/`: trade the refresh token for a new
    /// access token.
    ///
    /// Servers that rotate refresh tokens return a new one; otherwise the old
    /// refresh token is kept.
    pub async fn refresh_access(&self, refresh: &str) -> Result<AuthTokens, ApiError> {
        let body = json!({ "refresh": refresh });
        let renewed: RefreshedTokens =
            self.request("/api/auth/token/refresh/", ApiRequest::post(body)).await?;
        Ok(AuthTokens {
            access: renewed.access,
            refresh: renewed.refresh.unwrap_or_else(|| refresh.to_owned()),
        })
    }

    /// `GET /api/users/`: the own profile.
    pub async fn profile(&self, token: &str) -> Result<User, ApiError> {
        self.request("/api/users/", ApiRequest::get().with_token(token)).await
    }

    /// `PATCH /api/users/`
    pub async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<User, ApiError> {
        let body = serde_json::to_value(update).map_err(|e| ApiError::decode(0, e))?;
        self.request("/api/users/", ApiRequest::patch(body).with_token(token)).await
    }

    /// `GET /api/chat-rooms/`, most recently active first.
    pub async fn chat_rooms(&self, token: &str) -> Result<Vec<ChatRoom>, ApiError> {
        self.request("/api/chat-rooms/", ApiRequest::get().with_token(token)).await
    }

    /// `GET /api/chat-rooms/{id}/messages/`: the latest page of history.
    ///
    /// The server returns newest first; feed the result to the session as
    /// `HistoryLoaded` and the timeline puts it in order.
    pub async fn room_messages(
        &self,
        token: &str,
        room_id: &RoomId,
    ) -> Result<Vec<ChatMessage>, ApiError> {
        self.room_messages_page(token, room_id, 1).await
    }

    /// One page (1-based, 20 messages) of a room's history.
    pub async fn room_messages_page(
        &self,
        token: &str,
        room_id: &RoomId,
        page: u32,
    ) -> Result<Vec<ChatMessage>, ApiError> {
        let mut url = self.url("/api/chat-rooms/")?;
        url.path_segments_mut()
            .map_err(|()| invalid_path("/api/chat-rooms/"))?
            .pop_if_empty()
            .extend([room_id.as_str(), "messages", ""]);
        if page > 1 {
            url.query_pairs_mut().append_pair("page", &page.to_string());
        }
        self.request_url(url, ApiRequest::get().with_token(token)).await
    }

    /// `GET /api/matching/`: the discover feed.
    pub async fn candidates(&self, token: &str) -> Result<Vec<Candidate>, ApiError> {
        self.request("/api/matching/", ApiRequest::get().with_token(token)).await
    }

    /// `POST /api/matching/create_match/`
    pub async fn create_match(
        &self,
        token: &str,
        target_user_id: &str,
        mode: MatchMode,
    ) -> Result<Match, ApiError> {
        let body = json!({ "target_user_id": target_user_id, "mode": mode });
        self.request("/api/matching/create_match/", ApiRequest::post(body).with_token(token)).await
    }

    /// `POST /api/payments/initiate/`
    pub async fn initiate_payment(
        &self,
        token: &str,
        request: &PaymentRequest,
    ) -> Result<PaymentInitiation, ApiError> {
        let body = serde_json::to_value(request).map_err(|e| ApiError::decode(0, e))?;
        self.request("/api/payments/initiate/", ApiRequest::post(body).with_token(token)).await
    }

    /// `POST /api/upload/` (multipart, field `file`). Returns the media URL.
    pub async fn upload_file(
        &self,
        token: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ApiError> {
        let url = self.url("/api/upload/")?;
        debug!(%url, file_name, size = bytes.len(), "uploading file");

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.to_owned()));
        let builder = self.http.post(url).bearer_auth(token).multipart(form);

        let response: UploadResponse = self.execute(builder).await?;
        Ok(response.url)
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base.join(path.trim_start_matches('/')).map_err(|_| invalid_path(path))
    }

    async fn request_url<T: DeserializeOwned>(
        &self,
        url: Url,
        request: ApiRequest<'_>,
    ) -> Result<T, ApiError> {
        debug!(method = ?request.method, %url, "api request");

        let mut builder = self.http.request(request.method.into(), url);
        if let Some(token) = request.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        self.execute(builder).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "api request failed");
            ApiError::network(e)
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(ApiError::network)?;

        if !status.is_success() {
            let error = ApiError::from_response(status.as_u16(), &body);
            debug!(status = status.as_u16(), code = %error.code, message = %error.message, "api error");
            return Err(error);
        }

        decode_body(status, &body)
    }
}

fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, ApiError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) { b"null".as_slice() } else { body };
    serde_json::from_slice(body).map_err(|e| ApiError::decode(status.as_u16(), e))
}

fn invalid_path(path: &str) -> ApiError {
    ApiError { status: 0, code: ErrorCode::Unknown, message: format!("invalid request path {path:?}") }
}
