//! Child processes wrapped by the command-line entry point.

use crate::error::CommandError;
use std::process::Command;
use tracing::debug;

/// A command line to run as the notified unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildCommand {
    argv: Vec<String>,
    verbose: bool,
}

/// How a successful child process finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub args: Vec<String>,
    pub code: i32,
}

impl ChildCommand {
    pub fn new(argv: Vec<String>, verbose: bool) -> Result<Self, CommandError> {
        if argv.is_empty() {
            return Err(CommandError::Empty);
        }
        Ok(Self { argv, verbose })
    }

    /// Name shown in notifications: the whole command line when verbose,
    /// otherwise only the program.
    pub fn display_name(&self) -> String {
        if self.verbose {
            self.argv.join(" ")
        } else {
            self.argv[0].clone()
        }
    }

    /// Runs the child to completion with inherited stdio.
    ///
    /// A non-zero exit status is an error carrying the child's exit code.
    pub fn run(&self) -> Result<CommandOutcome, CommandError> {
        let (program, args) = self.argv.split_first().ok_or(CommandError::Empty)?;
        debug!(program, ?args, "Spawning child command");

        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|source| CommandError::Spawn {
                program: program.clone(),
                source,
            })?;

        if status.success() {
            Ok(CommandOutcome {
                args: self.argv.clone(),
                code: 0,
            })
        } else {
            Err(CommandError::Failed {
                command: self.argv.join(" "),
                code: status.code(),
            })
        }
    }
}
