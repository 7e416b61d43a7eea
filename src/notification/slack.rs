//! A client for sending notifications to a Slack incoming webhook.

use super::http;
use crate::core::{Backend, Event, MentionList, Message};
use crate::error::{DeliveryError, KnockError};
use crate::formatting::{PlainTextFormatter, TextFormatter};
use crate::registry::{BackendConfig, BackendParams};
use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::{info, instrument};

const NAME: &str = "slack";

/// Configuration for Slack alerts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackConfig {
    /// The Slack incoming webhook URL.
    pub webhook_url: String,
    /// Channel override, e.g. `#ml`. The webhook's default channel is used when absent.
    pub channel: Option<String>,
    pub user_mentions: MentionList,
}

impl BackendConfig for SlackConfig {
    fn from_params(params: &BackendParams) -> Result<Self, KnockError> {
        Ok(Self {
            webhook_url: params.required(NAME, "webhook_url")?.to_string(),
            channel: params.optional("channel"),
            user_mentions: params.mentions("user_mentions"),
        })
    }

    fn into_backend(self) -> Result<Box<dyn Backend>, KnockError> {
        Ok(Box::new(SlackClient::new(self, Box::new(PlainTextFormatter))?))
    }
}

/// A client for sending messages to a Slack webhook.
pub struct SlackClient {
    config: SlackConfig,
    formatter: Box<dyn TextFormatter>,
    client: Client,
}

impl SlackClient {
    /// Creates a new `SlackClient`.
    pub fn new(config: SlackConfig, formatter: Box<dyn TextFormatter>) -> Result<Self, KnockError> {
        Ok(Self {
            config,
            formatter,
            client: http::client()?,
        })
    }

    fn payload(&self, message: &Message) -> Value {
        let mut lines = self.formatter.lines(message);
        lines.push(self.config.user_mentions.join_with(str::to_string));

        let icon = match message.event() {
            Event::Started => ":clapper:",
            Event::Succeeded => ":tada:",
            Event::Crashed => ":skull_and_crossbones:",
        };
        let mut payload = json!({
            "username": "Knock Knock",
            "icon_emoji": icon,
            "text": lines.join("\n"),
        });
        if let Some(channel) = &self.config.channel {
            payload["channel"] = json!(channel);
        }
        payload
    }
}

impl Backend for SlackClient {
    fn name(&self) -> &'static str {
        NAME
    }

    /// Formats and sends a lifecycle message to the configured Slack webhook.
    #[instrument(skip_all, fields(event = %message.event()))]
    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        let payload = self.payload(message);
        http::post_json(&self.client, NAME, &self.config.webhook_url, &payload)?;
        info!("Successfully sent message to Slack.");
        Ok(())
    }
}
