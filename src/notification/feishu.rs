//! Feishu/Lark custom bot backend.
//!
//! Sends plain text messages. When the bot has signature verification
//! enabled, the payload carries `timestamp` and `sign`.

use super::http;
use crate::core::{Backend, Message};
use crate::error::{DeliveryError, KnockError};
use crate::formatting::{PlainTextFormatter, TextFormatter};
use crate::registry::{BackendConfig, BackendParams};
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::blocking::Client;
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::warn;

const NAME: &str = "feishu";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeishuConfig {
    pub webhook_url: String,
    pub secret: Option<String>,
}

impl BackendConfig for FeishuConfig {
    fn from_params(params: &BackendParams) -> Result<Self, KnockError> {
        Ok(Self {
            webhook_url: params.required(NAME, "webhook_url")?.to_string(),
            secret: params.optional("secret"),
        })
    }

    fn into_backend(self) -> Result<Box<dyn Backend>, KnockError> {
        Ok(Box::new(FeishuBackend {
            config: self,
            client: http::client()?,
        }))
    }
}

pub struct FeishuBackend {
    config: FeishuConfig,
    client: Client,
}

impl FeishuBackend {
    fn payload(&self, message: &Message, timestamp: i64) -> Value {
        let mut payload = json!({
            "msg_type": "text",
            "content": { "text": PlainTextFormatter.format(message) },
            "timestamp": timestamp.to_string(),
        });
        if let Some(secret) = &self.config.secret {
            payload["sign"] = json!(compute_signature(&timestamp.to_string(), secret));
        }
        payload
    }
}

impl Backend for FeishuBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        let timestamp = chrono::Utc::now().timestamp();
        let response = http::post_json(
            &self.client,
            NAME,
            &self.config.webhook_url,
            &self.payload(message, timestamp),
        )?;

        // Feishu answers HTTP 200 with a non-zero `code` on rejection.
        let body = http::json_body(response);
        match body.get("code").and_then(Value::as_i64) {
            Some(code) if code != 0 => {
                let msg = body["msg"].as_str().unwrap_or("unknown error").to_string();
                warn!(code, msg = %msg, "Feishu rejected the message");
                Err(DeliveryError::Api {
                    backend: NAME,
                    message: msg,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Computes `base64(HMAC-SHA256("<timestamp>\n<secret>", ""))` as Feishu expects.
pub fn compute_signature(timestamp: &str, secret: &str) -> String {
    let string_to_sign = format!("{}\n{}", timestamp, secret);
    let mac = Hmac::<Sha256>::new_from_slice(string_to_sign.as_bytes())
        .expect("HMAC accepts any key length");
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}
