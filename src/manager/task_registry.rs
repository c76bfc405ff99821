use std::collections::HashMap;

use log::{debug, info};

use crate::models::task::{Task, TaskStatus, TaskToken, ViewId};

/// How a completion relates to the registry entry for its view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    /// The completing task is the registered one; it is now terminal.
    Current,
    /// A newer task replaced it; the newer entry was left untouched.
    Superseded,
    /// The view was closed; nothing was recorded.
    Absent,
}

/// Per-view task table owned by the event loop.
///
/// Only the loop thread touches it, so no locking is involved. Workers report
/// through the loop channel instead of mutating entries directly.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<ViewId, Task>,
    next_token: u64,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a running task for `view`, replacing any previous one.
    pub fn begin(&mut self, view: ViewId, command: String) -> TaskToken {
        self.next_token += 1;
        let token = TaskToken(self.next_token);
        if let Some(previous) = self.tasks.insert(view, Task::new(view, token, command)) {
            info!(
                "Task {} for view {} superseded while {}.",
                previous.token, previous.view, previous.status
            );
        }
        token
    }

    /// True while `token` is the registered task for `view` and still running.
    pub fn is_live(&self, view: ViewId, token: TaskToken) -> bool {
        self.tasks
            .get(&view)
            .is_some_and(|task| task.token == token && task.is_running())
    }

    /// Advances the animation frame of a live task.
    pub fn advance(&mut self, view: ViewId, token: TaskToken, frames: usize) -> Option<&Task> {
        if !self.is_live(view, token) {
            return None;
        }
        let task = self.tasks.get_mut(&view)?;
        task.frame = (task.frame + 1) % frames;
        Some(&*task)
    }

    pub fn finish(&mut self, view: ViewId, token: TaskToken, status: TaskStatus) -> Finish {
        debug_assert!(status.is_terminal());
        match self.tasks.get_mut(&view) {
            Some(task) if task.token == token => {
                task.status = status;
                info!("Task status updated {}: {}", view, status);
                Finish::Current
            }
            Some(_) => {
                debug!("Stale completion for view {} ignored.", view);
                Finish::Superseded
            }
            None => {
                debug!("Completion for closed view {} dropped.", view);
                Finish::Absent
            }
        }
    }

    /// Drops the entry of a closed view; pending ticks then stop on their own.
    pub fn remove(&mut self, view: ViewId) -> Option<Task> {
        self.tasks.remove(&view)
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn get(&self, view: ViewId) -> Option<&Task> {
        self.tasks.get(&view)
    }

    pub fn status(&self, view: ViewId) -> TaskStatus {
        self.tasks
            .get(&view)
            .map(|task| task.status)
            .unwrap_or(TaskStatus::Idle)
    }

    pub fn running(&self) -> usize {
        self.tasks.values().filter(|task| task.is_running()).count()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_view_is_idle() {
        let registry = TaskRegistry::new();
        assert_eq!(registry.status(7), TaskStatus::Idle);
        assert!(registry.is_empty());
    }

    #[test]
    fn begin_then_finish_reaches_terminal_state() {
        let mut registry = TaskRegistry::new();
        let token = registry.begin(1, "rails db:migrate".to_string());
        assert_eq!(registry.status(1), TaskStatus::Running);
        assert!(registry.is_live(1, token));

        assert_eq!(registry.finish(1, token, TaskStatus::Failed), Finish::Current);
        assert_eq!(registry.status(1), TaskStatus::Failed);
        assert!(!registry.is_live(1, token));
        assert!(registry.advance(1, token, 10).is_none());
    }

    #[test]
    fn new_dispatch_supersedes_previous_task() {
        let mut registry = TaskRegistry::new();
        let first = registry.begin(1, "rails db:migrate".to_string());
        let second = registry.begin(1, "rails db:migrate:redo VERSION=20230101000000".to_string());

        assert_ne!(first, second);
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_live(1, first));
        assert!(registry.advance(1, first, 10).is_none());

        assert_eq!(registry.finish(1, first, TaskStatus::Completed), Finish::Superseded);
        assert!(registry.is_live(1, second));
    }

    #[test]
    fn finishing_after_removal_does_not_resurrect() {
        let mut registry = TaskRegistry::new();
        let token = registry.begin(4, "rails db:migrate".to_string());
        assert!(registry.remove(4).is_some());

        assert_eq!(registry.finish(4, token, TaskStatus::Completed), Finish::Absent);
        assert!(registry.get(4).is_none());
        assert_eq!(registry.status(4), TaskStatus::Idle);
    }

    #[test]
    fn frames_wrap_around() {
        let mut registry = TaskRegistry::new();
        let token = registry.begin(1, "rails db:migrate".to_string());
        let frames: Vec<usize> = (0..4)
            .filter_map(|_| registry.advance(1, token, 3).map(|task| task.frame))
            .collect();
        assert_eq!(frames, [1, 2, 0, 1]);
    }

    #[test]
    fn views_are_tracked_independently() {
        let mut registry = TaskRegistry::new();
        let a = registry.begin(1, "rails db:migrate".to_string());
        registry.begin(2, "rails db:migrate".to_string());
        registry.finish(1, a, TaskStatus::Completed);

        assert_eq!(registry.running(), 1);
        registry.clear();
        assert!(registry.is_empty());
    }
}
