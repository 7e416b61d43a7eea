//! DingTalk custom robot backend.
//!
//! A robot is protected by at least one of: an IP allow list, required
//! keywords, or a signing secret. Keywords are appended to every message and
//! a configured secret signs the request URL.

use super::http;
use crate::core::{Backend, MentionList, Message};
use crate::error::{DeliveryError, KnockError};
use crate::formatting::{PlainTextFormatter, TextFormatter};
use crate::registry::{BackendConfig, BackendParams};
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::blocking::Client;
use serde_json::{json, Value};
use sha2::Sha256;

const NAME: &str = "dingtalk";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DingTalkConfig {
    pub webhook_url: String,
    /// Phone numbers of the users to notify.
    pub user_mentions: MentionList,
    pub secret: Option<String>,
    pub keywords: Vec<String>,
}

impl BackendConfig for DingTalkConfig {
    fn from_params(params: &BackendParams) -> Result<Self, KnockError> {
        Ok(Self {
            webhook_url: params.required(NAME, "webhook_url")?.to_string(),
            user_mentions: params.mentions("user_mentions"),
            secret: params.optional("secret"),
            keywords: params.mentions("keywords").as_slice().to_vec(),
        })
    }

    fn into_backend(self) -> Result<Box<dyn Backend>, KnockError> {
        Ok(Box::new(DingTalkBackend {
            config: self,
            client: http::client()?,
        }))
    }
}

pub struct DingTalkBackend {
    config: DingTalkConfig,
    client: Client,
}

impl DingTalkBackend {
    fn payload(&self, message: &Message) -> Value {
        let mut lines = PlainTextFormatter.lines(message);
        lines.extend(self.config.user_mentions.as_slice().iter().map(|m| format!("@{}", m)));
        lines.extend(self.config.keywords.iter().cloned());
        json!({
            "msgtype": "text",
            "text": { "content": lines.join("\n") },
            "at": {
                "atMobiles": self.config.user_mentions.as_slice(),
                "isAtAll": false,
            },
        })
    }

    /// Webhook URL, signed with the current time when a secret is configured.
    fn target_url(&self) -> String {
        match &self.config.secret {
            Some(secret) => {
                let timestamp = chrono::Utc::now().timestamp_millis();
                signed_url(&self.config.webhook_url, secret, timestamp)
            }
            None => self.config.webhook_url.clone(),
        }
    }
}

impl Backend for DingTalkBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        let response = http::post_json(&self.client, NAME, &self.target_url(), &self.payload(message))?;
        // DingTalk reports failures with HTTP 200 and a non-zero errcode.
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

/// Computes `base64(HMAC-SHA256(secret, "<timestamp>\n<secret>"))`.
pub fn sign(secret: &str, timestamp: i64) -> String {
    let string_to_sign = format!("{}\n{}", timestamp, secret);
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(string_to_sign.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

fn signed_url(webhook_url: &str, secret: &str, timestamp: i64) -> String {
    let separator = if webhook_url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}timestamp={}&sign={}",
        webhook_url,
        separator,
        timestamp,
        urlencoding::encode(&sign(secret, timestamp))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::test_support::{self, MockHttp};
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, ResponseTemplate};

    fn config(url: String, secret: Option<&str>) -> DingTalkConfig {
        DingTalkConfig {
            webhook_url: url,
            user_mentions: MentionList::parse("13800000000"),
            secret: secret.map(str::to_string),
            keywords: vec!["training".to_string()],
        }
    }

    #[test]
    fn test_payload_mentions_and_keywords() {
        let backend = DingTalkBackend {
            config: config("http://unused".into(), None),
            client: http::client().unwrap(),
        };
        let payload = backend.payload(&test_support::started());
        assert_eq!(payload["msgtype"], "text");
        assert_eq!(payload["at"]["atMobiles"][0], "13800000000");
        let content = payload["text"]["content"].as_str().unwrap();
        assert!(content.ends_with("@13800000000\ntraining"));
    }

    #[test]
    fn test_signature_is_stable() {
        // Same inputs always produce the same url-safe signature.
        let first = signed_url("https://oapi.dingtalk.com/robot/send?access_token=t", "SEC1", 1_700_000_000_000);
        let second = signed_url("https://oapi.dingtalk.com/robot/send?access_token=t", "SEC1", 1_700_000_000_000);
        assert_eq!(first, second);
        assert!(first.contains("&timestamp=1700000000000&sign="));
        assert!(!first.contains('+'));
        assert_eq!(sign("SEC1", 1).len(), 44);
    }

    #[test]
    fn test_signed_delivery_and_api_error() {
        let server = MockHttp::start();
        server.mount(
            Mock::given(method("POST"))
                .and(query_param("access_token", "t"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({ "errcode": 310000, "errmsg": "sign not match" })),
                ),
        );
        let backend = config(server.url("/robot/send?access_token=t"), Some("SEC1"))
            .into_backend()
            .unwrap();

        let err = backend.deliver(&test_support::started()).unwrap_err();
        assert!(err.to_string().contains("sign not match"));

        let request = &server.requests()[0];
        let query: Vec<_> = request.url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert!(query.contains(&"timestamp".to_string()));
        assert!(query.contains(&"sign".to_string()));
    }
}
