//! Telegram Bot API backend.

use super::http;
use crate::core::{Backend, Message};
use crate::error::{DeliveryError, KnockError};
use crate::formatting::{PlainTextFormatter, TextFormatter};
use crate::registry::{BackendConfig, BackendParams};
use reqwest::blocking::Client;
use serde_json::{json, Value};

const NAME: &str = "telegram";
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API integration.
///
/// The chat id is the numeric id of the conversation with the bot, or an
/// `@channelusername`. It is visible under `message.chat.id` in the bot's
/// `getUpdates` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
    pub api_base: String,
}

impl BackendConfig for TelegramConfig {
    fn from_params(params: &BackendParams) -> Result<Self, KnockError> {
        let chat_id = match params.get("chat_id").or_else(|| params.get("to")) {
            Some(id) => id.to_string(),
            None => {
                return Err(KnockError::MissingParameter {
                    backend: NAME,
                    key: "chat_id",
                })
            }
        };
        Ok(Self {
            token: params.required(NAME, "token")?.to_string(),
            chat_id,
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    fn into_backend(self) -> Result<Box<dyn Backend>, KnockError> {
        Ok(Box::new(TelegramBackend {
            config: self,
            client: http::client()?,
        }))
    }
}

pub struct TelegramBackend {
    config: TelegramConfig,
    client: Client,
}

impl TelegramBackend {
    fn chat_id(&self) -> Value {
        // Numeric ids are sent as numbers, usernames as strings.
        match self.config.chat_id.parse::<i64>() {
            Ok(id) => json!(id),
            Err(_) => json!(self.config.chat_id),
        }
    }
}

impl Backend for TelegramBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.token
        );
        let body = json!({
            "chat_id": self.chat_id(),
            "text": PlainTextFormatter.format(message),
        });
        http::post_json(&self.client, NAME, &url, &body)?;
        Ok(())
    }
}
