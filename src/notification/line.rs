//! LINE Notify backend.

use super::http;
use crate::core::{Backend, Message};
use crate::error::{DeliveryError, KnockError};
use crate::formatting::{PlainTextFormatter, TextFormatter};
use crate::registry::{BackendConfig, BackendParams};
use reqwest::blocking::Client;

const NAME: &str = "line";
pub const NOTIFY_API_URL: &str = "https://notify-api.line.me/api/notify";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineConfig {
    /// Personal access token issued by LINE Notify.
    pub token: String,
    pub api_url: String,
}

impl BackendConfig for LineConfig {
    fn from_params(params: &BackendParams) -> Result<Self, KnockError> {
        Ok(Self {
            token: params.required(NAME, "token")?.to_string(),
            api_url: NOTIFY_API_URL.to_string(),
        })
    }

    fn into_backend(self) -> Result<Box<dyn Backend>, KnockError> {
        Ok(Box::new(LineBackend {
            config: self,
            client: http::client()?,
        }))
    }
}

pub struct LineBackend {
    config: LineConfig,
    client: Client,
}

impl Backend for LineBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        // The first line is dropped by LINE's own header, so lead with a newline.
        let text = format!("\n{}", PlainTextFormatter.format(message));
        let request = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.token)
            .query(&[("message", text.as_str())]);
        http::send(NAME, request)?;
        Ok(())
    }
}
