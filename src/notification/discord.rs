//! Discord webhook backend.

use super::http;
use crate::core::{Backend, Message};
use crate::error::{DeliveryError, KnockError};
use crate::formatting::{PlainTextFormatter, TextFormatter};
use crate::registry::{BackendConfig, BackendParams};
use reqwest::blocking::Client;
use serde_json::json;

const NAME: &str = "discord";

/// Discord rejects message content longer than this many characters.
const MAX_CONTENT_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordConfig {
    pub webhook_url: String,
}

impl BackendConfig for DiscordConfig {
    fn from_params(params: &BackendParams) -> Result<Self, KnockError> {
        Ok(Self {
            webhook_url: params.required(NAME, "webhook_url")?.to_string(),
        })
    }

    fn into_backend(self) -> Result<Box<dyn Backend>, KnockError> {
        Ok(Box::new(DiscordBackend {
            config: self,
            client: http::client()?,
        }))
    }
}

pub struct DiscordBackend {
    config: DiscordConfig,
    client: Client,
}

impl Backend for DiscordBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        let content = truncate(PlainTextFormatter.format(message), MAX_CONTENT_CHARS);
        http::post_json(
            &self.client,
            NAME,
            &self.config.webhook_url,
            &json!({ "content": content }),
        )?;
        Ok(())
    }
}

/// Cuts `text` to at most `max` characters, marking the cut with an ellipsis.
fn truncate(text: String, max: usize) -> String {
    if text.chars().count() <= max {
        return text;
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
