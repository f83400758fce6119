//! Chat socket endpoint.
//!
//! `ws(s)://<host>/ws/chat/<room_id>/?token=<token>`, with `wss` whenever the
//! API is served over https.

use matchhub_core::{AuthToken, RoomId};
use url::Url;

use crate::config::ConfigError;

/// Map an API (or WebSocket) base URL to its WebSocket form.
///
/// `http` becomes `ws`, `https` becomes `wss`; `ws` and `wss` pass through.
/// Query and fragment are dropped.
pub fn websocket_base(base: &Url) -> Result<Url, ConfigError> {
    let scheme = match base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(ConfigError::UnsupportedScheme { scheme: other.to_owned() }),
    };
    if base.cannot_be_a_base() {
        return Err(ConfigError::NotABase(base.to_string()));
    }

    // Scheme changes between special schemes are allowed by `set_scheme`, but
    // rebuilding keeps host, port, and path without relying on that.
    let rest = &base[url::Position::BeforeHost..url::Position::AfterPath];
    let rebuilt = format!("{scheme}://{rest}");
    crate::config::parse_url("websocket base", &rebuilt)
}

/// Chat endpoint for one room.
pub fn chat_url(ws_base: &Url, room_id: &RoomId, token: &AuthToken) -> Result<Url, ConfigError> {
    let mut url = ws_base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| ConfigError::NotABase(ws_base.to_string()))?
        .pop_if_empty()
        .extend(["ws", "chat", room_id.as_str(), ""]);
    url.query_pairs_mut().append_pair("token", token.expose());
    Ok(url)
}
