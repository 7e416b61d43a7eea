//! Local desktop notifications through the platform's own tooling.

use crate::core::{Backend, Message};
use crate::error::{DeliveryError, KnockError};
use crate::formatting::{headline, PlainTextFormatter, TextFormatter};
use crate::registry::{BackendConfig, BackendParams};
use std::process::Command;
use tracing::debug;

const NAME: &str = "desktop";
pub const DEFAULT_TITLE: &str = "knockknock";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopConfig {
    pub title: String,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl BackendConfig for DesktopConfig {
    fn from_params(params: &BackendParams) -> Result<Self, KnockError> {
        Ok(Self {
            title: params
                .optional("title")
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        })
    }

    fn into_backend(self) -> Result<Box<dyn Backend>, KnockError> {
        Ok(Box::new(DesktopBackend { config: self }))
    }
}

pub struct DesktopBackend {
    config: DesktopConfig,
}

impl Backend for DesktopBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        let summary = format!("{}: {}", self.config.title, headline(message.event()));
        let body = PlainTextFormatter.lines(message)[1..].join("\n");
        let mut command = notify_command(&summary, &body)?;
        debug!(program = ?command.get_program(), "Showing desktop notification");

        let status = command
            .status()
            .map_err(|e| DeliveryError::Desktop(format!("failed to start notifier: {}", e)))?;
        if !status.success() {
            return Err(DeliveryError::Desktop(format!("notifier exited with {}", status)));
        }
        Ok(())
    }
}

#[cfg(target_os = "linux")]
fn notify_command(summary: &str, body: &str) -> Result<Command, DeliveryError> {
    let mut command = Command::new("notify-send");
    command.args(["--app-name", DEFAULT_TITLE, summary, body]);
    Ok(command)
}

#[cfg(target_os = "macos")]
fn notify_command(summary: &str, body: &str) -> Result<Command, DeliveryError> {
    let script = format!(
        "display notification \"{}\" with title \"{}\"",
        applescript_escape(body),
        applescript_escape(summary)
    );
    let mut command = Command::new("osascript");
    command.args(["-e", &script]);
    Ok(command)
}

#[cfg(target_os = "windows")]
fn notify_command(summary: &str, body: &str) -> Result<Command, DeliveryError> {
    let script = format!(
        "Add-Type -AssemblyName System.Windows.Forms; \
         $n = New-Object System.Windows.Forms.NotifyIcon; \
         $n.Icon = [System.Drawing.SystemIcons]::Information; \
         $n.Visible = $true; \
         $n.ShowBalloonTip(10000, '{}', '{}', 'Info'); \
         Start-Sleep -Seconds 10; $n.Dispose()",
        powershell_escape(summary),
        powershell_escape(body)
    );
    let mut command = Command::new("powershell");
    command.args(["-NoProfile", "-Command", &script]);
    Ok(command)
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn notify_command(_summary: &str, _body: &str) -> Result<Command, DeliveryError> {
    Err(DeliveryError::Desktop(format!(
        "no notification subsystem available on {}",
        std::env::consts::OS
    )))
}

#[cfg(any(target_os = "macos", test))]
fn applescript_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(any(target_os = "windows", test))]
fn powershell_escape(text: &str) -> String {
    text.replace('\'', "''")
}
