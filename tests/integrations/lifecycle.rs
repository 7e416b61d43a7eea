//! End-to-end behavior of the lifecycle wrapper.

#[path = "../helpers/mod.rs"]
mod helpers;

use anyhow::anyhow;
use helpers::{master_notifier, RecordingBackend};
use knockknock::{Event, Notifier, ProcessRole, Status};
use serial_test::serial;
use std::panic::{self, AssertUnwindSafe};

#[test]
fn test_success_sends_started_then_succeeded() {
    let backend = RecordingBackend::new();
    let notifier = master_notifier(backend.clone());

    let value = notifier
        .run("train_model", || Ok::<_, anyhow::Error>(vec![("loss", 0.9)]))
        .unwrap();

    assert_eq!(value, vec![("loss", 0.9)]);
    assert_eq!(backend.events(), [Event::Started, Event::Succeeded]);
    let messages = backend.messages();
    assert_eq!(messages[0].call, "train_model");
    assert_eq!(messages[0].host, "test-host");
    match &messages[1].status {
        Status::Succeeded { value, .. } => assert!(value.contains("loss")),
        other => panic!("expected success, got {:?}", other),
    }
}

#[test]
fn test_error_sends_crash_and_is_returned_unchanged() {
    let backend = RecordingBackend::new();
    let notifier = master_notifier(backend.clone());

    let err = notifier
        .run("train_model", || -> anyhow::Result<()> { Err(anyhow!("bad data")) })
        .unwrap_err();

    assert_eq!(err.to_string(), "bad data");
    assert_eq!(backend.events(), [Event::Started, Event::Crashed]);
    match &backend.messages()[1].status {
        Status::Crashed { error, trace, .. } => {
            assert_eq!(error, "bad data");
            assert!(trace.contains("bad data"));
        }
        other => panic!("expected crash, got {:?}", other),
    }
}

#[test]
fn test_panic_is_reported_then_resumed() {
    let backend = RecordingBackend::new();
    let notifier = master_notifier(backend.clone());

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        notifier.call("train_model", || -> u32 { panic!("out of memory") })
    }));

    assert!(result.is_err());
    assert_eq!(backend.events(), [Event::Started, Event::Crashed]);
    match &backend.messages()[1].status {
        Status::Crashed { error, .. } => assert!(error.contains("out of memory")),
        other => panic!("expected crash, got {:?}", other),
    }
}

#[test]
fn test_replica_runs_work_without_notifying() {
    let backend = RecordingBackend::new();
    let notifier = Notifier::with_role(Box::new(backend.clone()), ProcessRole::from_rank(Some("3")));

    assert_eq!(notifier.call("train_model", || 42), 42);
    let err = notifier
        .run("train_model", || Err::<(), _>(anyhow!("bad data")))
        .unwrap_err();

    assert_eq!(err.to_string(), "bad data");
    assert!(backend.messages().is_empty());
}

#[test]
fn test_rank_zero_is_master_and_labels_host() {
    let backend = RecordingBackend::new();
    let notifier = Notifier::with_role(Box::new(backend.clone()), ProcessRole::from_rank(Some("0")))
        .with_host("gpu-01");

    notifier.call("train_model", || ());

    let messages = backend.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].host, "gpu-01 - RANK: 0");
}

#[test]
#[serial]
fn test_rank_is_read_from_environment() {
    std::env::set_var("RANK", "1");
    let replica = ProcessRole::detect();
    std::env::remove_var("RANK");
    let master = ProcessRole::detect();

    assert!(!replica.is_master());
    assert_eq!(replica.rank(), Some("1"));
    assert!(master.is_master());
    assert_eq!(master.rank(), None);
}

#[test]
fn test_failed_delivery_does_not_mask_outcome() {
    let backend = RecordingBackend::failing();
    let notifier = master_notifier(backend.clone());

    let value = notifier.run("train_model", || Ok::<_, anyhow::Error>("done")).unwrap();
    assert_eq!(value, "done");

    let err = notifier
        .run("train_model", || Err::<(), _>(anyhow!("bad data")))
        .unwrap_err();
    assert_eq!(err.to_string(), "bad data");

    // Every lifecycle step was still attempted.
    assert_eq!(
        backend.events(),
        [Event::Started, Event::Succeeded, Event::Started, Event::Crashed]
    );
}

#[test]
fn test_each_invocation_gets_fresh_messages() {
    let backend = RecordingBackend::new();
    let notifier = master_notifier(backend.clone());

    notifier.call("first", || 1);
    notifier.call("second", || 2);

    let calls: Vec<_> = backend.messages().iter().map(|m| m.call.clone()).collect();
    assert_eq!(calls, ["first", "first", "second", "second"]);
}
