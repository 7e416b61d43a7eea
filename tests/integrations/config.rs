#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::MockHttp;
use knockknock::config::{ConfiguredNotifier, SenderConfig};
use knockknock::{KnockError, ProcessRole};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_ini(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

#[test]
fn test_disabled_notifications_send_nothing() {
    let server = MockHttp::start();
    let file = write_ini(&format!(
        "[knockknock]\nsender = slack\nnotification = false\nwebhook_url = {}\n",
        server.url("/hook")
    ));

    let notifier = ConfiguredNotifier::from_file_with_role(file.path(), ProcessRole::master()).unwrap();
    assert!(!notifier.is_enabled());
    assert_eq!(notifier.call("train_model", || 7), 7);

    assert!(server.requests().is_empty());
}

#[test]
fn test_enabled_config_posts_to_webhook() {
    let server = MockHttp::start();
    let file = write_ini(&format!(
        "[knockknock]\nsender = slack\nwebhook_url = {}\nchannel = #ml\n",
        server.url("/hook")
    ));

    let notifier = ConfiguredNotifier::from_file_with_role(file.path(), ProcessRole::master()).unwrap();
    assert!(notifier.is_enabled());
    notifier.call("train_model", || "ok");

    let bodies = server.json_bodies();
    assert_eq!(bodies.len(), 2);
    assert!(bodies.iter().all(|body| body["channel"] == "#ml"));
}

#[test]
fn test_missing_file_runs_without_notifications() {
    let dir = tempfile::tempdir().unwrap();
    let notifier = ConfiguredNotifier::from_file(dir.path().join("knockknock.ini")).unwrap();

    assert!(!notifier.is_enabled());
    let result: Result<u8, String> = notifier.run("train_model", || Err("bad data".to_string()));
    assert_eq!(result, Err("bad data".to_string()));
}

#[test]
fn test_unknown_sender_fails_before_work_runs() {
    let file = write_ini("[knockknock]\nsender = carrier-pigeon\n");
    let err = ConfiguredNotifier::from_file(file.path()).err().unwrap();
    match err {
        KnockError::UnknownBackend { name, known } => {
            assert_eq!(name, "carrier-pigeon");
            assert!(known.contains("telegram"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_backend_parameter_is_reported() {
    let file = write_ini("[knockknock]\nsender = matrix\nhomeserver = https://matrix.example.org\n");
    let err = ConfiguredNotifier::from_file(file.path()).err().unwrap();
    assert!(matches!(
        err,
        KnockError::MissingParameter {
            backend: "matrix",
            key: "token"
        }
    ));
}

#[test]
fn test_toml_config_is_supported() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        "[knockknock]\nsender = \"discord\"\nwebhook_url = \"https://discord.example.com/hook\"\n"
    )
    .unwrap();

    let config = SenderConfig::load(file.path()).unwrap().unwrap();
    assert_eq!(config.sender, "discord");
    assert_eq!(config.params.get("webhook_url"), Some("https://discord.example.com/hook"));
}
