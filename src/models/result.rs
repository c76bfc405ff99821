use std::{fmt, io};

use super::task::TaskStatus;

/// Exit code reported when the process could not be launched or reported no
/// exit code (terminated by a signal).
pub const LAUNCH_FAILURE_CODE: i32 = -1;

/// Captured outcome of one external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    /// Builds a result from raw process output; invalid UTF-8 is replaced,
    /// never rejected.
    pub fn from_parts(command: &str, stdout: &[u8], stderr: &[u8], code: Option<i32>) -> Self {
        Self {
            command: command.to_string(),
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
            exit_code: code.unwrap_or(LAUNCH_FAILURE_CODE),
        }
    }

    pub fn launch_failure(command: &str, error: &io::Error) -> Self {
        Self {
            command: command.to_string(),
            stdout: String::new(),
            stderr: format!("Error running command: {}", error),
            exit_code: LAUNCH_FAILURE_CODE,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn status(&self) -> TaskStatus {
        if self.success() {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        }
    }

    /// Plain text block handed to the output panel.
    pub fn render(&self) -> String {
        let mut text = format!("Command: {}\n\nOutput:\n{}\n", self.command, self.stdout);
        if !self.stderr.is_empty() {
            text.push_str(&format!("Errors:\n{}\n", self.stderr));
        }
        text.push_str(&format!("Exit Code: {}", self.exit_code));
        text
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
