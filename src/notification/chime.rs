//! Amazon Chime webhook backend.

use super::http;
use crate::core::{Backend, MentionList, Message};
use crate::error::{DeliveryError, KnockError};
use crate::formatting::{PlainTextFormatter, TextFormatter};
use crate::registry::{BackendConfig, BackendParams};
use reqwest::blocking::Client;
use serde_json::json;

const NAME: &str = "chime";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChimeConfig {
    pub webhook_url: String,
    /// User aliases or email addresses, e.g. `@All` or `@Present`.
    pub user_mentions: MentionList,
}

impl BackendConfig for ChimeConfig {
    fn from_params(params: &BackendParams) -> Result<Self, KnockError> {
        Ok(Self {
            webhook_url: params.required(NAME, "webhook_url")?.to_string(),
            user_mentions: params.mentions("user_mentions"),
        })
    }

    fn into_backend(self) -> Result<Box<dyn Backend>, KnockError> {
        Ok(Box::new(ChimeBackend {
            config: self,
            client: http::client()?,
        }))
    }
}

pub struct ChimeBackend {
    config: ChimeConfig,
    client: Client,
}

impl Backend for ChimeBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        let mut lines = PlainTextFormatter.lines(message);
        lines.push(self.config.user_mentions.join_with(str::to_string));
        let payload = json!({ "Content": lines.join("\n") });
        http::post_json(&self.client, NAME, &self.config.webhook_url, &payload)?;
        Ok(())
    }
}
