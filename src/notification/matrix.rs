//! Matrix backend using the client-server API.
//!
//! The configured room may be an alias (`#room:server`), resolved once through
//! the room directory, or a room id (`!id:server`) used as is.

use super::http;
use crate::core::{Backend, Message};
use crate::error::{DeliveryError, KnockError};
use crate::formatting::{PlainTextFormatter, TextFormatter};
use crate::registry::{BackendConfig, BackendParams};
use reqwest::blocking::Client;
use reqwest::Url;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use tracing::debug;

const NAME: &str = "matrix";
const CLIENT_API: [&str; 3] = ["_matrix", "client", "v3"];

static TXN_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixConfig {
    /// Homeserver base URL, e.g. `https://matrix-client.matrix.org`.
    pub homeserver: Url,
    /// Access token of the sending user.
    pub token: String,
    pub room: String,
}

impl BackendConfig for MatrixConfig {
    fn from_params(params: &BackendParams) -> Result<Self, KnockError> {
        let raw = params.required(NAME, "homeserver")?;
        let homeserver = Url::parse(raw).map_err(|e| KnockError::InvalidParameter {
            backend: NAME,
            key: "homeserver",
            reason: e.to_string(),
        })?;
        if homeserver.cannot_be_a_base() {
            return Err(KnockError::InvalidParameter {
                backend: NAME,
                key: "homeserver",
                reason: format!("`{}` is not an http(s) base URL", raw),
            });
        }
        Ok(Self {
            homeserver,
            token: params.required(NAME, "token")?.to_string(),
            room: params.required(NAME, "room")?.to_string(),
        })
    }

    fn into_backend(self) -> Result<Box<dyn Backend>, KnockError> {
        Ok(Box::new(MatrixBackend {
            config: self,
            room_id: OnceLock::new(),
            client: http::client()?,
        }))
    }
}

pub struct MatrixBackend {
    config: MatrixConfig,
    room_id: OnceLock<String>,
    client: Client,
}

impl MatrixBackend {
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.config.homeserver.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(CLIENT_API).extend(segments);
        }
        url
    }

    fn room_id(&self) -> Result<String, DeliveryError> {
        if let Some(id) = self.room_id.get() {
            return Ok(id.clone());
        }
        let id = if self.config.room.starts_with('!') {
            self.config.room.clone()
        } else {
            self.resolve_alias()?
        };
        Ok(self.room_id.get_or_init(|| id).clone())
    }

    fn resolve_alias(&self) -> Result<String, DeliveryError> {
        let url = self.endpoint(&["directory", "room", &self.config.room]);
        let response = http::send(NAME, self.client.get(url).bearer_auth(&self.config.token))?;
        let body = http::json_body(response);
        let id = body
            .get("room_id")
            .and_then(Value::as_str)
            .ok_or_else(|| DeliveryError::Api {
                backend: NAME,
                message: format!("could not resolve room alias `{}`", self.config.room),
            })?;
        debug!(alias = %self.config.room, room_id = id, "Resolved Matrix room alias");
        Ok(id.to_string())
    }
}

impl Backend for MatrixBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        let room_id = self.room_id()?;
        let txn_id = format!(
            "knockknock-{}-{}",
            chrono::Utc::now().timestamp_millis(),
            TXN_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        let url = self.endpoint(&["rooms", &room_id, "send", "m.room.message", &txn_id]);
        let body = json!({
            "msgtype": "m.text",
            "body": PlainTextFormatter.format(message),
        });
        http::send(NAME, self.client.put(url).bearer_auth(&self.config.token).json(&body))?;
        Ok(())
    }
}
