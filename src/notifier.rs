//! The lifecycle wrapper shared by every backend.
//!
//! [`Notifier::run`] announces the start of a unit of work, runs it on the
//! calling thread and reports how it ended. Only the master process of a
//! distributed job sends anything.

use crate::core::{Backend, Message, RunRecord};
use crate::formatting::UNRENDERABLE_VALUE;
use std::any::Any;
use std::backtrace::Backtrace;
use std::convert::Infallible;
use std::fmt::{self, Write as _};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

/// Environment variable set by `torch.distributed` style launchers.
pub const RANK_ENV: &str = "RANK";

/// Whether this process should emit notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRole {
    rank: Option<String>,
    master: bool,
}

impl ProcessRole {
    /// Reads the role from the `RANK` environment variable.
    pub fn detect() -> Self {
        Self::from_rank(std::env::var(RANK_ENV).ok().as_deref())
    }

    /// Builds the role from a raw rank value. Absent or zero means master.
    pub fn from_rank(rank: Option<&str>) -> Self {
        let Some(raw) = rank else {
            return Self::master();
        };
        let master = match raw.trim().parse::<i64>() {
            Ok(value) => value == 0,
            Err(_) => {
                warn!(rank = raw, "Ignoring non-integer {}; treating this process as master", RANK_ENV);
                true
            }
        };
        Self {
            rank: Some(raw.to_string()),
            master,
        }
    }

    pub fn master() -> Self {
        Self {
            rank: None,
            master: true,
        }
    }

    pub fn is_master(&self) -> bool {
        self.master
    }

    pub fn rank(&self) -> Option<&str> {
        self.rank.as_deref()
    }

    /// Host identifier as shown in messages.
    pub fn host_label(&self, host: &str) -> String {
        match &self.rank {
            Some(rank) => format!("{} - RANK: {}", host, rank),
            None => host.to_string(),
        }
    }
}

impl Default for ProcessRole {
    fn default() -> Self {
        Self::master()
    }
}

/// Wraps units of work and reports their lifecycle through a backend.
pub struct Notifier {
    backend: Box<dyn Backend>,
    role: ProcessRole,
    host: String,
}

impl Notifier {
    /// Creates a notifier for this machine, reading the rank from the environment.
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self::with_role(backend, ProcessRole::detect())
    }

    pub fn with_role(backend: Box<dyn Backend>, role: ProcessRole) -> Self {
        Self {
            backend,
            role,
            host: local_host_name(),
        }
    }

    /// Overrides the detected host name.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn role(&self) -> &ProcessRole {
        &self.role
    }

    /// Runs `work`, sending a start message before it and a success or
    /// crash message after it.
    ///
    /// The work's result is returned unchanged. A panic inside `work` is
    /// reported as a crash and then resumed. Delivery failures are logged
    /// and never affect the outcome.
    pub fn run<T, E, F>(&self, call: &str, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        T: fmt::Debug,
        E: fmt::Display + fmt::Debug,
    {
        if !self.role.is_master() {
            debug!(
                rank = self.role.rank().unwrap_or_default(),
                call, "Not the master process, running without notifications"
            );
            return work();
        }

        let record = RunRecord::start(self.role.host_label(&self.host), call);
        self.dispatch(&record.started());

        match panic::catch_unwind(AssertUnwindSafe(work)) {
            Ok(Ok(value)) => {
                self.dispatch(&record.succeeded(render_value(&value)));
                Ok(value)
            }
            Ok(Err(err)) => {
                self.dispatch(&record.crashed(err.to_string(), render_trace(&err)));
                Err(err)
            }
            Err(payload) => {
                let trace = Backtrace::force_capture().to_string();
                self.dispatch(&record.crashed(panic_message(payload.as_ref()), trace));
                panic::resume_unwind(payload)
            }
        }
    }

    /// Like [`Notifier::run`] for work that cannot fail.
    pub fn call<T, F>(&self, call: &str, work: F) -> T
    where
        F: FnOnce() -> T,
        T: fmt::Debug,
    {
        match self.run::<T, Infallible, _>(call, || Ok(work())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    fn dispatch(&self, message: &Message) {
        let backend = self.backend.name();
        let event = message.event();
        match self.backend.deliver(message) {
            Ok(()) => info!(backend, %event, "Notification delivered"),
            Err(e) => error!(backend, %event, error = %e, "Failed to deliver notification"),
        }
    }
}

/// Best-effort `Debug` rendering of a returned value.
pub fn render_value<T: fmt::Debug + ?Sized>(value: &T) -> String {
    let mut out = String::new();
    match write!(out, "{:?}", value) {
        Ok(()) => out,
        Err(_) => UNRENDERABLE_VALUE.to_string(),
    }
}

/// Renders an error's debug form, which for `anyhow` errors carries the
/// cause chain and any captured backtrace. A backtrace of the reporting site
/// is appended when none is present.
pub fn render_trace<E: fmt::Debug + ?Sized>(err: &E) -> String {
    let debug = render_value(err);
    if debug.contains("Stack backtrace:") {
        debug
    } else {
        format!("{}\n\n{}", debug, Backtrace::force_capture())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panic: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panic: {}", message)
    } else {
        "panic with a non-string payload".to_string()
    }
}

fn local_host_name() -> String {
    sysinfo::System::host_name().unwrap_or_else(|| "unknown".to_string())
}
