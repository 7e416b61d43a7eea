#![allow(dead_code)]

pub mod mock_http;
pub mod recording_backend;

pub use mock_http::MockHttp;
pub use recording_backend::RecordingBackend;

use knockknock::{Notifier, ProcessRole};

/// A master-process notifier over `backend` with a fixed host name.
pub fn master_notifier(backend: RecordingBackend) -> Notifier {
    Notifier::with_role(Box::new(backend), ProcessRole::master()).with_host("test-host")
}
