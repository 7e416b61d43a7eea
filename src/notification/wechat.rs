//! WeChat Work (WeCom) group robot backend.

use super::http;
use crate::core::{Backend, MentionList, Message};
use crate::error::{DeliveryError, KnockError};
use crate::formatting::{PlainTextFormatter, TextFormatter};
use crate::registry::{BackendConfig, BackendParams};
use reqwest::blocking::Client;
use serde_json::{json, Value};

const NAME: &str = "wechat";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeChatConfig {
    pub webhook_url: String,
    /// User ids to mention; `@all` mentions everyone.
    pub user_mentions: MentionList,
    /// Phone numbers to mention.
    pub user_mentions_mobile: MentionList,
}

impl BackendConfig for WeChatConfig {
    fn from_params(params: &BackendParams) -> Result<Self, KnockError> {
        Ok(Self {
            webhook_url: params.required(NAME, "webhook_url")?.to_string(),
            user_mentions: params.mentions("user_mentions"),
            user_mentions_mobile: params.mentions("user_mentions_mobile"),
        })
    }

    fn into_backend(self) -> Result<Box<dyn Backend>, KnockError> {
        Ok(Box::new(WeChatBackend {
            config: self,
            client: http::client()?,
        }))
    }
}

pub struct WeChatBackend {
    config: WeChatConfig,
    client: Client,
}

impl WeChatBackend {
    fn payload(&self, message: &Message) -> Value {
        json!({
            "msgtype": "text",
            "text": {
                "content": PlainTextFormatter.format(message),
                "mentioned_list": self.config.user_mentions.as_slice(),
                "mentioned_mobile_list": self.config.user_mentions_mobile.as_slice(),
            },
        })
    }
}

impl Backend for WeChatBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        let response = http::post_json(&self.client, NAME, &self.config.webhook_url, &self.payload(message))?;
        let body = http::json_body(response);
        match body.get("errcode").and_then(Value::as_i64) {
            Some(code) if code != 0 => Err(DeliveryError::Api {
                backend: NAME,
                message: body["errmsg"].as_str().unwrap_or("unknown error").to_string(),
            }),
            _ => Ok(()),
        }
    }
}
