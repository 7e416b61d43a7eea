//! KnockKnock - get notified when your training starts, finishes or crashes.
//!
//! Wrap any unit of work with a [`Notifier`] built from one of the supported
//! backends, either in code through [`registry::resolve`], from a
//! `knockknock.ini` file through [`config::ConfiguredNotifier`], or from the
//! `knockknock` command line.
pub mod cli;
pub mod command;
pub mod config;
pub mod core;
pub mod error;
pub mod formatting;
pub mod notification;
pub mod notifier;
pub mod registry;

// Re-export core types for convenience
pub use crate::core::{Backend, Event, MentionList, Message, RunRecord, Status};
pub use error::{CommandError, DeliveryError, KnockError};
pub use notifier::{Notifier, ProcessRole};
pub use registry::{resolve, BackendParams};
