//! RocketChat backend posting through the REST API with a personal access token.

use super::http;
use crate::core::{Backend, MentionList, Message};
use crate::error::{DeliveryError, KnockError};
use crate::formatting::{MarkdownFormatter, TextFormatter};
use crate::registry::{BackendConfig, BackendParams};
use reqwest::blocking::Client;
use serde_json::{json, Value};

const NAME: &str = "rocketchat";
const POST_MESSAGE_PATH: &str = "/api/v1/chat.postMessage";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RocketChatConfig {
    /// Server base URL, e.g. `https://rocketchat.example.com`.
    pub server_url: String,
    pub user_id: String,
    pub auth_token: String,
    pub channel: String,
    pub user_mentions: MentionList,
    /// Display name shown instead of the token owner's.
    pub alias: String,
}

impl BackendConfig for RocketChatConfig {
    fn from_params(params: &BackendParams) -> Result<Self, KnockError> {
        Ok(Self {
            server_url: params.required(NAME, "rocketchat_server_url")?.to_string(),
            user_id: params.required(NAME, "rocketchat_user_id")?.to_string(),
            auth_token: params.required(NAME, "rocketchat_auth_token")?.to_string(),
            channel: params.required(NAME, "channel")?.to_string(),
            user_mentions: params.mentions("user_mentions"),
            alias: params.optional("alias").unwrap_or_default(),
        })
    }

    fn into_backend(self) -> Result<Box<dyn Backend>, KnockError> {
        Ok(Box::new(RocketChatBackend {
            endpoint: format!("{}{}", self.server_url.trim_end_matches('/'), POST_MESSAGE_PATH),
            config: self,
            client: http::client()?,
        }))
    }
}

pub struct RocketChatBackend {
    config: RocketChatConfig,
    endpoint: String,
    client: Client,
}

impl RocketChatBackend {
    fn payload(&self, message: &Message) -> Value {
        let mut lines = MarkdownFormatter.lines(message);
        if !self.config.user_mentions.is_empty() {
            let mentions = self.config.user_mentions.join_with(|user| format!("@{}", user));
            lines[0] = format!("{} {}", lines[0], mentions);
        }
        json!({
            "alias": self.config.alias,
            "channel": self.config.channel,
            "emoji": ":bell:",
            "text": lines.join("\n"),
        })
    }
}

impl Backend for RocketChatBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        let request = self
            .client
            .post(&self.endpoint)
            .header("X-Auth-Token", &self.config.auth_token)
            .header("X-User-Id", &self.config.user_id)
            .json(&self.payload(message));
        http::send(NAME, request)?;
        Ok(())
    }
}
