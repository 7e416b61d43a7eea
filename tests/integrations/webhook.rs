//! Webhook backends driven through the full resolve-and-notify path.

#[path = "../helpers/mod.rs"]
mod helpers;

use anyhow::anyhow;
use helpers::MockHttp;
use knockknock::{registry, BackendParams, Notifier, ProcessRole};
use std::collections::BTreeMap;

fn notifier(sender: &str, params: BackendParams) -> Notifier {
    let backend = registry::resolve(sender, &params).unwrap();
    Notifier::with_role(backend, ProcessRole::master()).with_host("gpu-01")
}

#[test]
fn test_slack_channel_and_success_text() {
    let server = MockHttp::start();
    let notifier = notifier(
        "slack",
        BackendParams::new()
            .with("webhook_url", server.url("/services/T000/B000"))
            .with("channel", "#ml"),
    );

    let metrics = notifier
        .run("train_model", || {
            Ok::<_, anyhow::Error>(BTreeMap::from([("loss", 0.9)]))
        })
        .unwrap();
    assert_eq!(metrics["loss"], 0.9);

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.url.path() == "/services/T000/B000"));

    let bodies = server.json_bodies();
    assert_eq!(bodies[0]["channel"], "#ml");
    assert_eq!(bodies[1]["channel"], "#ml");
    let text = bodies[1]["text"].as_str().unwrap();
    assert!(text.contains("complete"));
    assert!(text.contains("loss"));
    assert!(text.contains("Machine name: gpu-01"));
}

#[test]
fn test_slack_crash_text_carries_error_and_trace() {
    let server = MockHttp::start();
    let notifier = notifier(
        "slack",
        BackendParams::new().with("webhook_url", server.url("/hook")),
    );

    let err = notifier
        .run("train_model", || -> anyhow::Result<()> { Err(anyhow!("bad data")) })
        .unwrap_err();
    assert_eq!(err.to_string(), "bad data");

    let bodies = server.json_bodies();
    assert_eq!(bodies.len(), 2);
    let text = bodies[1]["text"].as_str().unwrap();
    assert!(text.contains("crashed"));
    assert!(text.contains("bad data"));
    assert!(text.contains("Traceback:"));
}

#[test]
fn test_discord_uses_same_lifecycle() {
    let server = MockHttp::start();
    let notifier = notifier(
        "discord",
        BackendParams::new().with("webhook_url", server.url("/api/webhooks/1/abc")),
    );

    notifier.call("evaluate", || 0.87);

    let bodies = server.json_bodies();
    assert_eq!(bodies.len(), 2);
    assert!(bodies[0]["content"].as_str().unwrap().contains("started"));
    assert!(bodies[1]["content"].as_str().unwrap().contains("0.87"));
}

#[test]
fn test_unreachable_webhook_does_not_affect_result() {
    // Nothing listens on the discard port.
    let notifier = notifier(
        "teams",
        BackendParams::new().with("webhook_url", "http://127.0.0.1:9/hook"),
    );

    assert_eq!(notifier.call("train_model", || "done"), "done");
}
