//! Zoho Cliq webhook backend.

use super::http;
use crate::core::{Backend, MentionList, Message};
use crate::error::{DeliveryError, KnockError};
use crate::formatting::{PlainTextFormatter, TextFormatter};
use crate::registry::{BackendConfig, BackendParams};
use reqwest::blocking::Client;
use serde_json::json;

const NAME: &str = "cliq";
const BOT_IMAGE: &str = "https://huggingface.co/front/assets/huggingface_logo.svg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliqConfig {
    pub webhook_url: String,
    pub user_mentions: MentionList,
}

impl BackendConfig for CliqConfig {
    fn from_params(params: &BackendParams) -> Result<Self, KnockError> {
        Ok(Self {
            webhook_url: params.required(NAME, "webhook_url")?.to_string(),
            user_mentions: params.mentions("user_mentions"),
        })
    }

    fn into_backend(self) -> Result<Box<dyn Backend>, KnockError> {
        Ok(Box::new(CliqBackend {
            config: self,
            client: http::client()?,
        }))
    }
}

pub struct CliqBackend {
    config: CliqConfig,
    client: Client,
}

impl Backend for CliqBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        let mut lines = PlainTextFormatter.lines(message);
        lines.push(self.config.user_mentions.join_with(|user| format!("{{@{}}}", user)));
        let payload = json!({
            "bot": { "name": "Knock Knock", "image": BOT_IMAGE },
            "text": lines.join("\n"),
        });
        http::post_json(&self.client, NAME, &self.config.webhook_url, &payload)?;
        Ok(())
    }
}
