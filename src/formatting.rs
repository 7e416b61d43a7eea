// src/formatting.rs

use crate::core::{Event, Message, Status};
use chrono::{DateTime, Local, TimeDelta};

/// strftime pattern used for every timestamp in a message.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Substituted when the work's return value cannot be rendered.
pub const UNRENDERABLE_VALUE: &str = "ERROR - Couldn't str the returned value.";

/// A trait for turning a lifecycle message into provider text.
pub trait TextFormatter: Send + Sync {
    /// Returns the message as individual lines, headline first.
    fn lines(&self, message: &Message) -> Vec<String>;

    fn format(&self, message: &Message) -> String {
        self.lines(message).join("\n")
    }
}

/// Plain text rendering used by most chat, bot and SMS backends.
pub struct PlainTextFormatter;

impl TextFormatter for PlainTextFormatter {
    fn lines(&self, message: &Message) -> Vec<String> {
        let mut lines = vec![
            headline(message.event()).to_string(),
            format!("Machine name: {}", message.host),
            format!("Main call: {}", message.call),
            format!("Starting date: {}", format_date(&message.started_at)),
        ];

        match &message.status {
            Status::Started => {}
            Status::Succeeded {
                ended_at,
                elapsed,
                value,
            } => {
                lines.push(format!("End date: {}", format_date(ended_at)));
                lines.push(format!("Training duration: {}", format_elapsed(*elapsed)));
                lines.push(format!("Main call returned value: {}", value));
            }
            Status::Crashed {
                crashed_at,
                elapsed,
                error,
                trace,
            } => {
                lines.push(format!("Crash date: {}", format_date(crashed_at)));
                lines.push(format!(
                    "Crashed training duration: {}\n\n",
                    format_elapsed(*elapsed)
                ));
                lines.push("Here's the error:".to_string());
                lines.push(format!("{}\n\n", error));
                lines.push("Traceback:".to_string());
                lines.push(trace.clone());
            }
        }
        lines
    }
}

/// Markdown rendering with bold labels, for RocketChat and Teams.
pub struct MarkdownFormatter;

impl TextFormatter for MarkdownFormatter {
    fn lines(&self, message: &Message) -> Vec<String> {
        let title = match message.event() {
            Event::Started => "Your training has **started** :clap:",
            Event::Succeeded => "Your training is **complete** :tada:",
            Event::Crashed => "Your training has **crashed** :skull_crossbones:",
        };
        let mut lines = vec![
            title.to_string(),
            format!("**Machine name:** {}", message.host),
            format!("**Main call:** {}", message.call),
            format!("**Starting date:** {}", format_date(&message.started_at)),
        ];

        match &message.status {
            Status::Started => {}
            Status::Succeeded {
                ended_at,
                elapsed,
                value,
            } => {
                lines.push(format!("**End date:** {}", format_date(ended_at)));
                lines.push(format!("**Training duration:** {}", format_elapsed(*elapsed)));
                lines.push(format!("**Main call returned value:** {}", value));
            }
            Status::Crashed {
                crashed_at,
                elapsed,
                error,
                trace,
            } => {
                lines.push(format!("**Crash date:** {}", format_date(crashed_at)));
                lines.push(format!(
                    "**Crashed training duration:** {}",
                    format_elapsed(*elapsed)
                ));
                lines.push("**Error message:**".to_string());
                lines.push(format!("\n{}\n", error));
                lines.push("**Traceback:**".to_string());
                lines.push(format!("\n```\n{}\n```\n", trace));
            }
        }
        lines
    }
}

/// First line of a plain text message.
pub fn headline(event: Event) -> &'static str {
    match event {
        Event::Started => "Your training has started 🎬",
        Event::Succeeded => "Your training is complete 🎉",
        Event::Crashed => "Your training has crashed ☠️",
    }
}

pub fn format_date(date: &DateTime<Local>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Renders a duration as `H:MM:SS[.ffffff]`, prefixed with `N day(s), `
/// past 24 hours. Negative durations (clock adjustments) clamp to zero.
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let total_micros = elapsed.num_microseconds().unwrap_or(i64::MAX).max(0);
    let micros = total_micros % 1_000_000;
    let total_secs = total_micros / 1_000_000;
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    let mut out = String::new();
    if days > 0 {
        let unit = if days == 1 { "day" } else { "days" };
        out.push_str(&format!("{} {}, ", days, unit));
    }
    out.push_str(&format!("{}:{:02}:{:02}", hours, minutes, seconds));
    if micros > 0 {
        out.push_str(&format!(".{:06}", micros));
    }
    out
}
