use std::{
    any::Any,
    io,
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::Arc,
    thread,
};

use crossbeam_channel::Sender;
use log::{error, info, warn};

use crate::models::{
    message::Completion,
    result::CommandResult,
    task::{TaskToken, ViewId},
};

/// Runs one command line to completion, capturing both streams.
pub trait Launcher: Send + Sync {
    fn launch(&self, command: &str, cwd: &Path) -> io::Result<CommandResult>;
}

/// Hands the command line to a shell, inheriting the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellLauncher {
    program: String,
    args: Vec<String>,
}

impl ShellLauncher {
    /// Parses a shell invocation such as `bash -lc`; the command line is appended
    /// as the final argument.
    pub fn parse(invocation: &str) -> Option<Self> {
        let mut parts = invocation.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl Default for ShellLauncher {
    #[cfg(windows)]
    fn default() -> Self {
        Self {
            program: "cmd".to_string(),
            args: vec!["/C".to_string()],
        }
    }

    #[cfg(not(windows))]
    fn default() -> Self {
        Self {
            program: "sh".to_string(),
            args: vec!["-c".to_string()],
        }
    }
}

impl Launcher for ShellLauncher {
    fn launch(&self, command: &str, cwd: &Path) -> io::Result<CommandResult> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let output = child.wait_with_output()?;
        Ok(CommandResult::from_parts(
            command,
            &output.stdout,
            &output.stderr,
            output.status.code(),
        ))
    }
}

/// Runs `command`, folding launch and I/O failures (and a panicking launcher)
/// into a failed result.
pub fn execute(launcher: &dyn Launcher, command: &str, cwd: &Path) -> CommandResult {
    let launched = panic::catch_unwind(AssertUnwindSafe(|| launcher.launch(command, cwd)))
        .unwrap_or_else(|payload| {
            Err(io::Error::new(
                io::ErrorKind::Other,
                format!("launcher panicked: {}", panic_message(payload.as_ref())),
            ))
        });
    match launched {
        Ok(result) => result,
        Err(e) => {
            error!("Failed to run command '{}': {}", command, e);
            CommandResult::launch_failure(command, &e)
        }
    }
}

/// Spawns one worker thread per dispatched command.
#[derive(Clone)]
pub struct CommandRunner {
    launcher: Arc<dyn Launcher>,
    sender: Sender<Completion>,
}

impl CommandRunner {
    pub fn new(launcher: Arc<dyn Launcher>, sender: Sender<Completion>) -> Self {
        Self { launcher, sender }
    }

    /// Runs `command` in `cwd` off the calling thread. Exactly one
    /// [`Completion`] is posted back for every call.
    pub fn spawn(&self, view: ViewId, token: TaskToken, command: String, cwd: PathBuf) {
        info!("Starting '{}' in {} for view {}.", command, cwd.display(), view);
        let launcher = Arc::clone(&self.launcher);
        let sender = self.sender.clone();
        let fallback = command.clone();

        let spawned = thread::Builder::new()
            .name(format!("migration-worker-{}", view))
            .spawn(move || {
                let result = execute(launcher.as_ref(), &command, &cwd);
                post(&sender, Completion { view, token, result });
            });

        if let Err(e) = spawned {
            error!("Failed to spawn worker thread: {}", e);
            let result = CommandResult::launch_failure(&fallback, &e);
            post(&self.sender, Completion { view, token, result });
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

fn post(sender: &Sender<Completion>, completion: Completion) {
    let view = completion.view;
    if sender.send(completion).is_err() {
        warn!("Event loop gone, completion for view {} dropped.", view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::time::Duration;

    struct Unlaunchable;

    impl Launcher for Unlaunchable {
        fn launch(&self, _command: &str, _cwd: &Path) -> io::Result<CommandResult> {
            Err(io::Error::new(io::ErrorKind::NotFound, "rails: not found"))
        }
    }

    #[test]
    fn launch_errors_become_failed_results() {
        let result = execute(&Unlaunchable, "rails db:migrate", Path::new("."));
        assert!(!result.success());
        assert_eq!(result.stderr, "Error running command: rails: not found");
    }

    #[test]
    fn worker_posts_exactly_one_completion() {
        let (sender, receiver) = unbounded();
        let runner = CommandRunner::new(Arc::new(Unlaunchable), sender);
        runner.spawn(3, TaskToken(9), "rails db:migrate".to_string(), PathBuf::from("."));

        let completion = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(completion.view, 3);
        assert_eq!(completion.token, TaskToken(9));
        drop(runner);
        assert!(receiver.recv_timeout(Duration::from_millis(200)).is_err());
    }

    struct Exploding;

    impl Launcher for Exploding {
        fn launch(&self, _command: &str, _cwd: &Path) -> io::Result<CommandResult> {
            panic!("launcher blew up");
        }
    }

    #[test]
    fn panicking_launcher_still_posts_a_failed_completion() {
        let (sender, receiver) = unbounded();
        let runner = CommandRunner::new(Arc::new(Exploding), sender);
        runner.spawn(5, TaskToken(2), "rails db:migrate".to_string(), PathBuf::from("."));

        let completion = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(completion.token, TaskToken(2));
        assert!(!completion.result.success());
        assert_eq!(
            completion.result.stderr,
            "Error running command: launcher panicked: launcher blew up"
        );
    }

    #[test]
    fn shell_invocation_parsing() {
        let shell = ShellLauncher::parse("bash -lc").unwrap();
        assert_eq!(shell.program, "bash");
        assert_eq!(shell.args, ["-lc"]);
        assert_eq!(ShellLauncher::parse("   "), None);
    }

    #[cfg(unix)]
    #[test]
    fn shell_captures_output_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();

        let result = execute(
            &ShellLauncher::default(),
            "cat marker.txt; echo oops >&2; exit 3",
            dir.path(),
        );
        assert_eq!(result.stdout, "here");
        assert_eq!(result.stderr, "oops\n");
        assert_eq!(result.exit_code, 3);
    }

    #[cfg(unix)]
    #[test]
    fn missing_shell_is_a_failed_result() {
        let shell = ShellLauncher::parse("/nonexistent/shell -c").unwrap();
        let result = execute(&shell, "true", Path::new("."));
        assert_eq!(result.exit_code, crate::models::result::LAUNCH_FAILURE_CODE);
        assert!(result.stderr.starts_with("Error running command:"));
    }
}
