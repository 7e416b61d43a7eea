//! Helpers for exercising blocking backends against a wiremock server.

use crate::core::{Message, RunRecord};
use chrono::{Local, TimeZone};
use serde_json::Value;
use tokio::runtime::Runtime;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A mock HTTP server driven from synchronous test code.
///
/// The backends use `reqwest::blocking`, which must not run inside an async
/// context, so the runtime only drives the mock server.
pub(crate) struct MockHttp {
    server: MockServer,
    rt: Runtime,
}

impl MockHttp {
    pub(crate) fn start() -> Self {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        Self { server, rt }
    }

    /// Starts a server answering every request with `status`.
    pub(crate) fn responding(status: u16) -> Self {
        let http = Self::start();
        http.mount(Mock::given(method("POST")).respond_with(ResponseTemplate::new(status)));
        http
    }

    pub(crate) fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    pub(crate) fn uri(&self) -> String {
        self.server.uri()
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.server.uri(), path)
    }

    pub(crate) fn requests(&self) -> Vec<wiremock::Request> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }

    /// JSON bodies of all received requests, in order.
    pub(crate) fn json_bodies(&self) -> Vec<Value> {
        self.requests()
            .iter()
            .map(|request| serde_json::from_slice(&request.body).unwrap())
            .collect()
    }
}

pub(crate) fn sample_record() -> RunRecord {
    let start = Local.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap();
    RunRecord::new("gpu-01", "train_model", start)
}

pub(crate) fn started() -> Message {
    sample_record().started()
}

pub(crate) fn succeeded() -> Message {
    let record = sample_record();
    record.succeeded_at(
        record.started_at() + chrono::TimeDelta::seconds(90),
        "{\"loss\": 0.9}".to_string(),
    )
}

pub(crate) fn crashed() -> Message {
    let record = sample_record();
    record.crashed_at(
        record.started_at() + chrono::TimeDelta::seconds(5),
        "bad data".to_string(),
        "at train_model".to_string(),
    )
}
