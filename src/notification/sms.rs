//! SMS backend using Twilio's Messages API.

use super::http;
use crate::core::{Backend, Message};
use crate::error::{DeliveryError, KnockError};
use crate::formatting::{PlainTextFormatter, TextFormatter};
use crate::registry::{BackendConfig, BackendParams};
use reqwest::blocking::Client;

const NAME: &str = "sms";
pub const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Twilio number sending the message, in E.164 form.
    pub sender_number: String,
    pub recipient_number: String,
    pub api_base: String,
}

impl BackendConfig for SmsConfig {
    fn from_params(params: &BackendParams) -> Result<Self, KnockError> {
        Ok(Self {
            account_sid: params.required(NAME, "account_sid")?.to_string(),
            auth_token: params.required(NAME, "auth_token")?.to_string(),
            sender_number: params.required(NAME, "sender_number")?.to_string(),
            recipient_number: params.required(NAME, "recipient_number")?.to_string(),
            api_base: TWILIO_API_BASE.to_string(),
        })
    }

    fn into_backend(self) -> Result<Box<dyn Backend>, KnockError> {
        Ok(Box::new(SmsBackend {
            config: self,
            client: http::client()?,
        }))
    }
}

pub struct SmsBackend {
    config: SmsConfig,
    client: Client,
}

impl Backend for SmsBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        let url = format!(
            "{}/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        );
        let body = PlainTextFormatter.format(message);
        let request = self
            .client
            .post(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("From", self.config.sender_number.as_str()),
                ("To", self.config.recipient_number.as_str()),
                ("Body", body.as_str()),
            ]);
        http::send(NAME, request)?;
        Ok(())
    }
}
