//! Error types shared by the registry, the backends and the CLI.

use thiserror::Error;

/// Errors raised while resolving or configuring a notification backend.
///
/// All of these are raised before the wrapped work starts.
#[derive(Error, Debug)]
pub enum KnockError {
    #[error("unknown sender `{name}`, expected one of: {known}")]
    UnknownBackend { name: String, known: String },

    #[error("sender `{backend}` requires the `{key}` parameter")]
    MissingParameter { backend: &'static str, key: &'static str },

    #[error("invalid value for `{key}` on sender `{backend}`: {reason}")]
    InvalidParameter {
        backend: &'static str,
        key: &'static str,
        reason: String,
    },

    #[error("failed to load configuration: {0}")]
    Config(#[from] figment::Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// A single delivery of a lifecycle message failed.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("HTTP request to {backend} failed: {source}")]
    Http {
        backend: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{backend} returned status {status}: {body}")]
    Status {
        backend: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{backend} rejected the message: {message}")]
    Api { backend: &'static str, message: String },

    #[error("failed to send email: {0}")]
    Email(String),

    #[error("desktop notification failed: {0}")]
    Desktop(String),
}

/// Failure of a child command run by the CLI.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("no command given")]
    Empty,

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command `{command}` exited with {}", describe_exit(.code))]
    Failed { command: String, code: Option<i32> },
}

impl CommandError {
    /// Exit code the CLI should terminate with.
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::Failed { code: Some(code), .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status code {}", code),
        None => "no status code (terminated by signal)".to_string(),
    }
}
