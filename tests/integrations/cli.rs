#[path = "../helpers/mod.rs"]
mod helpers;

use anyhow::Result;
use assert_cmd::prelude::*;
use helpers::MockHttp;
use predicates::prelude::*;
use std::process::Command;

fn knockknock_bin() -> Result<Command> {
    let mut cmd = Command::cargo_bin("knockknock")?;
    cmd.env_remove("RANK");
    Ok(cmd)
}

#[test]
fn test_no_sender_prints_help_and_fails() -> Result<()> {
    knockknock_bin()?
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Usage"));
    Ok(())
}

#[test]
fn test_missing_required_flag_is_usage_error() -> Result<()> {
    knockknock_bin()?
        .args(["slack", "--channel", "#ml", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--webhook-url"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_successful_command_notifies_start_and_success() -> Result<()> {
    let server = MockHttp::start();
    knockknock_bin()?
        .args(["--verbose", "slack", "--webhook-url"])
        .arg(server.url("/hook"))
        .args(["--channel", "#ml", "sh", "-c", "exit 0"])
        .assert()
        .success();

    let bodies = server.json_bodies();
    assert_eq!(bodies.len(), 2);
    assert!(bodies[0]["text"]
        .as_str()
        .unwrap()
        .contains("Main call: sh -c exit 0"));
    assert!(bodies[1]["text"].as_str().unwrap().contains("complete"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_child_exit_code_is_inherited_and_reported() -> Result<()> {
    let server = MockHttp::start();
    knockknock_bin()?
        .args(["discord", "--webhook-url"])
        .arg(server.url("/hook"))
        .args(["--", "sh", "-c", "exit 3"])
        .assert()
        .code(3);

    let bodies = server.json_bodies();
    assert_eq!(bodies.len(), 2);
    let crash = bodies[1]["content"].as_str().unwrap();
    assert!(crash.contains("crashed"));
    assert!(crash.contains("Main call: sh\n"));
    Ok(())
}

#[test]
fn test_unspawnable_command_exits_with_one() -> Result<()> {
    let server = MockHttp::start();
    knockknock_bin()?
        .args(["discord", "--webhook-url"])
        .arg(server.url("/hook"))
        .arg("knockknock-no-such-program-xyz")
        .assert()
        .code(1);

    assert_eq!(server.requests().len(), 2);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_replica_process_sends_nothing() -> Result<()> {
    let server = MockHttp::start();
    knockknock_bin()?
        .env("RANK", "2")
        .args(["discord", "--webhook-url"])
        .arg(server.url("/hook"))
        .args(["sh", "-c", "exit 0"])
        .assert()
        .success();

    assert!(server.requests().is_empty());
    Ok(())
}
