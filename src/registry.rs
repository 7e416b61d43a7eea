//! Maps sender names to backend constructors.
//!
//! Both the CLI and the config file hand a name plus a flat string map to
//! [`resolve`]. Each backend validates the keys it needs through a typed
//! config struct.

use crate::core::{Backend, MentionList};
use crate::error::KnockError;
use crate::notification::{
    chime::ChimeConfig, cliq::CliqConfig, desktop::DesktopConfig, dingtalk::DingTalkConfig,
    discord::DiscordConfig, email::EmailConfig, feishu::FeishuConfig, line::LineConfig,
    matrix::MatrixConfig, rocketchat::RocketChatConfig, slack::SlackConfig, sms::SmsConfig,
    teams::TeamsConfig, telegram::TelegramConfig, wechat::WeChatConfig,
};
use std::collections::BTreeMap;

/// Flat key/value parameters for a backend, as read from flags or a config section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendParams(BTreeMap<String, String>);

impl BackendParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns a non-empty value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn required(&self, backend: &'static str, key: &'static str) -> Result<&str, KnockError> {
        self.get(key)
            .ok_or(KnockError::MissingParameter { backend, key })
    }

    pub fn optional(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    /// Parses a comma separated list; absent keys yield an empty list.
    pub fn mentions(&self, key: &str) -> MentionList {
        self.get(key).map(MentionList::parse).unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BackendParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Typed configuration of one backend.
pub trait BackendConfig: Sized {
    /// Reads and validates the backend's keys.
    fn from_params(params: &BackendParams) -> Result<Self, KnockError>;

    /// Builds the backend, opening any client it needs.
    fn into_backend(self) -> Result<Box<dyn Backend>, KnockError>;
}

type Factory = fn(&BackendParams) -> Result<Box<dyn Backend>, KnockError>;

fn build<C: BackendConfig>(params: &BackendParams) -> Result<Box<dyn Backend>, KnockError> {
    C::from_params(params)?.into_backend()
}

const BACKENDS: &[(&str, Factory)] = &[
    ("chime", build::<ChimeConfig>),
    ("cliq", build::<CliqConfig>),
    ("desktop", build::<DesktopConfig>),
    ("dingtalk", build::<DingTalkConfig>),
    ("discord", build::<DiscordConfig>),
    ("email", build::<EmailConfig>),
    ("feishu", build::<FeishuConfig>),
    ("line", build::<LineConfig>),
    ("matrix", build::<MatrixConfig>),
    ("rocketchat", build::<RocketChatConfig>),
    ("slack", build::<SlackConfig>),
    ("sms", build::<SmsConfig>),
    ("teams", build::<TeamsConfig>),
    ("telegram", build::<TelegramConfig>),
    ("wechat", build::<WeChatConfig>),
];

/// Names of every supported backend, sorted.
pub fn known_backends() -> impl Iterator<Item = &'static str> {
    BACKENDS.iter().map(|(name, _)| *name)
}

pub fn is_known(name: &str) -> bool {
    known_backends().any(|known| known == name)
}

/// Constructs the backend registered under `name`.
pub fn resolve(name: &str, params: &BackendParams) -> Result<Box<dyn Backend>, KnockError> {
    let (_, factory) = BACKENDS
        .iter()
        .find(|(known, _)| *known == name)
        .ok_or_else(|| unknown_backend(name))?;
    factory(params)
}

pub(crate) fn unknown_backend(name: &str) -> KnockError {
    KnockError::UnknownBackend {
        name: name.to_string(),
        known: known_backends().collect::<Vec<_>>().join(" "),
    }
}
