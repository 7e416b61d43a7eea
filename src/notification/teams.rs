//! Microsoft Teams incoming webhook backend, using the legacy MessageCard format.

use super::http;
use crate::core::{Backend, Event, MentionList, Message};
use crate::error::{DeliveryError, KnockError};
use crate::formatting::{MarkdownFormatter, TextFormatter};
use crate::registry::{BackendConfig, BackendParams};
use reqwest::blocking::Client;
use serde_json::{json, Value};

const NAME: &str = "teams";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamsConfig {
    pub webhook_url: String,
    pub user_mentions: MentionList,
}

impl BackendConfig for TeamsConfig {
    fn from_params(params: &BackendParams) -> Result<Self, KnockError> {
        Ok(Self {
            webhook_url: params.required(NAME, "webhook_url")?.to_string(),
            user_mentions: params.mentions("user_mentions"),
        })
    }

    fn into_backend(self) -> Result<Box<dyn Backend>, KnockError> {
        Ok(Box::new(TeamsBackend {
            config: self,
            client: http::client()?,
        }))
    }
}

pub struct TeamsBackend {
    config: TeamsConfig,
    client: Client,
}

impl TeamsBackend {
    fn payload(&self, message: &Message) -> Value {
        let mut lines = MarkdownFormatter.lines(message);
        let title = lines.remove(0);
        if !self.config.user_mentions.is_empty() {
            lines.push(self.config.user_mentions.join_with(str::to_string));
        }
        let color = match message.event() {
            Event::Started => "1E90FF",
            Event::Succeeded => "2EB886",
            Event::Crashed => "D40E0D",
        };
        // Teams markdown needs a blank line to break paragraphs.
        json!({
            "@type": "MessageCard",
            "@context": "https://schema.org/extensions",
            "summary": "Knock Knock",
            "themeColor": color,
            "title": title,
            "text": lines.join("\n\n"),
        })
    }
}

impl Backend for TeamsBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        http::post_json(&self.client, NAME, &self.config.webhook_url, &self.payload(message))?;
        Ok(())
    }
}
