//! Core domain types and the backend contract.
//!
//! A wrapped run produces up to three [`Message`]s. Each one is built fresh
//! from a [`RunRecord`] and handed to a [`Backend`], which formats it for its
//! provider and delivers it.

use crate::error::DeliveryError;
use chrono::{DateTime, Local, TimeDelta};
use std::fmt;

/// A notification channel able to deliver lifecycle messages.
///
/// Implementations own their connection parameters, fixed at construction,
/// and are responsible only for formatting and transport.
pub trait Backend: Send + Sync {
    /// Registry identifier of the provider, e.g. `"slack"`.
    fn name(&self) -> &'static str;

    /// Delivers one lifecycle message.
    fn deliver(&self, message: &Message) -> Result<(), DeliveryError>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        (**self).deliver(message)
    }
}

/// The three lifecycle events of a wrapped run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Started,
    Succeeded,
    Crashed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::Started => "started",
            Event::Succeeded => "succeeded",
            Event::Crashed => "crashed",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event specific part of a lifecycle message.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Started,
    Succeeded {
        ended_at: DateTime<Local>,
        elapsed: TimeDelta,
        /// Rendering of the value returned by the work.
        value: String,
    },
    Crashed {
        crashed_at: DateTime<Local>,
        elapsed: TimeDelta,
        /// Short description of the failure.
        error: String,
        trace: String,
    },
}

/// A single lifecycle message, ready to be formatted by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Host identifier, suffixed with the process rank when one is set.
    pub host: String,
    /// Display name of the wrapped work.
    pub call: String,
    pub started_at: DateTime<Local>,
    pub status: Status,
}

impl Message {
    pub fn event(&self) -> Event {
        match self.status {
            Status::Started => Event::Started,
            Status::Succeeded { .. } => Event::Succeeded,
            Status::Crashed { .. } => Event::Crashed,
        }
    }
}

/// Timing and identity of one wrapped invocation.
///
/// Lives only for the duration of the call and is never persisted.
#[derive(Debug, Clone)]
pub struct RunRecord {
    host: String,
    call: String,
    started_at: DateTime<Local>,
}

impl RunRecord {
    /// Starts a record at the current local time.
    pub fn start(host: impl Into<String>, call: impl Into<String>) -> Self {
        Self::new(host, call, Local::now())
    }

    pub fn new(host: impl Into<String>, call: impl Into<String>, started_at: DateTime<Local>) -> Self {
        Self {
            host: host.into(),
            call: call.into(),
            started_at,
        }
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn started(&self) -> Message {
        self.message(Status::Started)
    }

    pub fn succeeded(&self, value: String) -> Message {
        self.succeeded_at(Local::now(), value)
    }

    pub fn succeeded_at(&self, ended_at: DateTime<Local>, value: String) -> Message {
        self.message(Status::Succeeded {
            ended_at,
            elapsed: ended_at - self.started_at,
            value,
        })
    }

    pub fn crashed(&self, error: String, trace: String) -> Message {
        self.crashed_at(Local::now(), error, trace)
    }

    pub fn crashed_at(&self, crashed_at: DateTime<Local>, error: String, trace: String) -> Message {
        self.message(Status::Crashed {
            crashed_at,
            elapsed: crashed_at - self.started_at,
            error,
            trace,
        })
    }

    fn message(&self, status: Status) -> Message {
        Message {
            host: self.host.clone(),
            call: self.call.clone(),
            started_at: self.started_at,
            status,
        }
    }
}

/// Ordered list of user identifiers to mention.
///
/// Identifiers are passed through unvalidated; backends decide how to
/// render them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentionList(Vec<String>);

impl MentionList {
    /// Parses a comma separated list, dropping empty entries.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Renders every identifier with `render` and joins them with spaces.
    pub fn join_with(&self, render: impl Fn(&str) -> String) -> String {
        self.0
            .iter()
            .map(|user| render(user))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<S: Into<String>> FromIterator<S> for MentionList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
