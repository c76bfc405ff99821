use std::time::Duration;

use crate::{
    manager::task_registry::TaskRegistry,
    models::task::{TaskStatus, TaskToken, ViewId},
};

pub const FRAMES: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const DEFAULT_LABEL: &str = "Rails Migration";
pub const STATUS_KEY: &str = "rails_migration_boy";
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// Formats the status line of running and finished tasks.
///
/// The animator holds no timer of its own: each tick is scheduled by the
/// event loop and only reschedules when [`StatusAnimator::tick`] returns a
/// line, so a task that finished, was replaced, or lost its view stops
/// animating at its next tick.
#[derive(Debug, Clone)]
pub struct StatusAnimator {
    label: String,
    interval: Duration,
}

impl StatusAnimator {
    pub fn new(label: impl Into<String>, interval: Duration) -> Self {
        Self {
            label: label.into(),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn tick(&self, registry: &mut TaskRegistry, view: ViewId, token: TaskToken) -> Option<String> {
        let task = registry.advance(view, token, FRAMES.len())?;
        Some(self.running_status(&task.command, task.frame))
    }

    pub fn running_status(&self, command: &str, frame: usize) -> String {
        format!("{}: {} {}", self.label, command, FRAMES[frame % FRAMES.len()])
    }

    pub fn final_status(&self, command: &str, status: TaskStatus) -> String {
        format!("{}: {} - {}", self.label, command, status)
    }
}

impl Default for StatusAnimator {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL, DEFAULT_TICK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_cycle_through_glyphs() {
        let animator = StatusAnimator::default();
        let mut registry = TaskRegistry::new();
        let token = registry.begin(1, "rails db:migrate".to_string());

        let lines: Vec<String> = (0..11)
            .filter_map(|_| animator.tick(&mut registry, 1, token))
            .collect();

        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "Rails Migration: rails db:migrate ⠙");
        assert_eq!(lines[8], "Rails Migration: rails db:migrate ⠏");
        assert_eq!(lines[9], "Rails Migration: rails db:migrate ⠋");
    }

    #[test]
    fn tick_stops_once_task_is_terminal() {
        let animator = StatusAnimator::default();
        let mut registry = TaskRegistry::new();
        let token = registry.begin(1, "rails db:migrate".to_string());
        registry.finish(1, token, TaskStatus::Completed);

        assert_eq!(animator.tick(&mut registry, 1, token), None);
    }

    #[test]
    fn tick_stops_for_closed_or_replaced_task() {
        let animator = StatusAnimator::default();
        let mut registry = TaskRegistry::new();
        let old = registry.begin(1, "rails db:migrate".to_string());
        registry.begin(1, "rails db:migrate".to_string());
        assert_eq!(animator.tick(&mut registry, 1, old), None);

        let token = registry.begin(2, "rails db:migrate".to_string());
        registry.remove(2);
        assert_eq!(animator.tick(&mut registry, 2, token), None);
    }

    #[test]
    fn final_status_names_outcome() {
        let animator = StatusAnimator::new("Migrations", DEFAULT_TICK);
        assert_eq!(
            animator.final_status("rails db:migrate", TaskStatus::Failed),
            "Migrations: rails db:migrate - Failed"
        );
    }
}
