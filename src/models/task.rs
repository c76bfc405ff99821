use std::fmt;

/// Identity a task is keyed by: one per open view.
pub type ViewId = u64;

/// Distinguishes successive tasks dispatched for the same view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskToken(pub u64);

#[derive(Debug, Clone)]
pub struct Task {
    pub view: ViewId,
    pub token: TaskToken,
    pub command: String,
    pub status: TaskStatus,
    pub frame: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Idle,
    Running,
    Completed,
    Failed,
}

impl Task {
    pub fn new(view: ViewId, token: TaskToken, command: String) -> Self {
        Self {
            view,
            token,
            command,
            status: TaskStatus::Running,
            frame: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TaskStatus::Running
    }
}

impl fmt::Display for TaskToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TaskStatus::Idle => "Idle",
            TaskStatus::Running => "Running",
            TaskStatus::Completed => "Completed",
            TaskStatus::Failed => "Failed",
        };
        f.write_str(text)
    }
}
