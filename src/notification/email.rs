//! Email backend over SMTP.

use crate::core::{Backend, Event, Message};
use crate::error::{DeliveryError, KnockError};
use crate::formatting::{PlainTextFormatter, TextFormatter};
use crate::registry::{BackendConfig, BackendParams};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message as Email, SmtpTransport, Transport};
use std::fmt::Display;
use tracing::warn;

const NAME: &str = "email";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const SMTP_PASSWORD_ENV: &str = "KNOCKKNOCK_SMTP_PASSWORD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub recipients: Vec<Mailbox>,
    pub sender: Mailbox,
    pub smtp_host: String,
    pub smtp_password: Option<String>,
}

impl BackendConfig for EmailConfig {
    fn from_params(params: &BackendParams) -> Result<Self, KnockError> {
        let recipients = params
            .mentions("recipient_emails")
            .as_slice()
            .iter()
            .map(|address| parse_mailbox("recipient_emails", address))
            .collect::<Result<Vec<_>, _>>()?;
        let Some(first) = recipients.first().cloned() else {
            return Err(KnockError::MissingParameter {
                backend: NAME,
                key: "recipient_emails",
            });
        };
        let sender = match params.get("sender_email") {
            Some(address) => parse_mailbox("sender_email", address)?,
            None => first,
        };
        let smtp_password = params
            .optional("smtp_password")
            .or_else(|| std::env::var(SMTP_PASSWORD_ENV).ok().filter(|p| !p.is_empty()));

        Ok(Self {
            recipients,
            sender,
            smtp_host: params
                .optional("smtp_host")
                .unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            smtp_password,
        })
    }

    fn into_backend(self) -> Result<Box<dyn Backend>, KnockError> {
        let mut builder = SmtpTransport::relay(&self.smtp_host).map_err(|e| {
            KnockError::InvalidParameter {
                backend: NAME,
                key: "smtp_host",
                reason: e.to_string(),
            }
        })?;
        match &self.smtp_password {
            Some(password) => {
                builder = builder.credentials(Credentials::new(
                    self.sender.email.to_string(),
                    password.clone(),
                ));
            }
            None => warn!(
                host = %self.smtp_host,
                "No SMTP password configured, connecting without authentication"
            ),
        }
        let transport = builder.build();
        Ok(Box::new(EmailBackend::new(self, transport)))
    }
}

fn parse_mailbox(key: &'static str, address: &str) -> Result<Mailbox, KnockError> {
    address.parse().map_err(|e: lettre::address::AddressError| KnockError::InvalidParameter {
        backend: NAME,
        key,
        reason: format!("`{}`: {}", address, e),
    })
}

/// Sends one plain text email per lifecycle event through `T`.
pub struct EmailBackend<T> {
    config: EmailConfig,
    transport: T,
}

impl<T: Transport> EmailBackend<T> {
    pub fn new(config: EmailConfig, transport: T) -> Self {
        Self { config, transport }
    }

    fn compose(&self, message: &Message) -> Result<Email, DeliveryError> {
        let mut builder = Email::builder()
            .from(self.config.sender.clone())
            .subject(subject(message.event()))
            .header(ContentType::TEXT_PLAIN);
        for recipient in &self.config.recipients {
            builder = builder.to(recipient.clone());
        }
        builder
            .body(PlainTextFormatter.format(message))
            .map_err(|e| DeliveryError::Email(e.to_string()))
    }
}

pub fn subject(event: Event) -> &'static str {
    match event {
        Event::Started => "Training has started 🎬",
        Event::Succeeded => "Training has successfully finished 🎉",
        Event::Crashed => "Training has crashed ☠️",
    }
}

impl<T> Backend for EmailBackend<T>
where
    T: Transport + Send + Sync,
    T::Error: Display,
{
    fn name(&self) -> &'static str {
        NAME
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        let email = self.compose(message)?;
        self.transport
            .send(&email)
            .map_err(|e| DeliveryError::Email(e.to_string()))?;
        Ok(())
    }
}
