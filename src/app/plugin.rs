use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use log::{debug, info};

use super::{
    event_loop::{AnimatorTick, EventLoop, LoopEvent},
    host::Host,
};
use crate::{
    config::Config,
    error::{Error, Result},
    manager::task_registry::{Finish, TaskRegistry},
    migrations::{
        actions::{self, Action, Direction, MigrationCommand, MigrationLink},
        project,
    },
    models::{message::Completion, result::CommandResult, task::ViewId, view::View},
    status::animator::StatusAnimator,
    worker::worker::{CommandRunner, Launcher},
};

/// Ties the migration commands to a host: dispatch, spinner, output.
///
/// Everything here runs on the host's loop thread. Commands run on worker
/// threads spawned by [`CommandRunner`] and report back through the
/// [`EventLoop`] channel, which [`MigrationBoy::pump`] drains.
pub struct MigrationBoy<H: Host> {
    host: H,
    config: Config,
    registry: TaskRegistry,
    animator: StatusAnimator,
    runner: CommandRunner,
    events: EventLoop,
    in_flight: usize,
}

impl<H: Host> MigrationBoy<H> {
    pub fn new(host: H, config: Config, launcher: Arc<dyn Launcher>) -> Self {
        let events = EventLoop::new();
        let runner = CommandRunner::new(launcher, events.sender());
        let animator = StatusAnimator::new(config.label.clone(), config.tick_interval);
        Self {
            host,
            config,
            registry: TaskRegistry::new(),
            animator,
            runner,
            events,
            in_flight: 0,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight == 0 && self.events.pending_timers() == 0
    }

    pub fn enabled_actions(&self) -> Vec<Action> {
        let active = self.host.active_view();
        let folders = self.host.folders();
        Action::ALL
            .into_iter()
            .filter(|action| action.is_enabled(active.as_ref(), &folders))
            .collect()
    }

    pub fn run(&mut self, action: Action) -> Result<()> {
        match action {
            Action::MigrateAll => self.run_command(MigrationCommand::All),
            Action::Migrate(direction) => self.migrate_step(direction),
            Action::OpenLatest => self.open_latest(),
        }
    }

    /// Follows an inline link; it acts on the active view.
    pub fn follow_link(&mut self, href: &str) -> Result<()> {
        let link = MigrationLink::parse(href)?;
        self.migrate_step(link.direction)
    }

    /// Refreshes the inline links of a view that was loaded or focused.
    pub fn on_activated(&mut self, view: &View) {
        let links = actions::links_for(view);
        self.host.show_links(view.id, &links);
    }

    /// Drops every tracked task. Workers still running finish unobserved.
    pub fn shutdown(&mut self) {
        if !self.registry.is_empty() {
            info!(
                "Dropping {} task(s), {} still running.",
                self.registry.len(),
                self.registry.running()
            );
        }
        self.registry.clear();
    }

    /// Tears down the task of a closed view; its worker, if any, still runs
    /// to completion and its result is then dropped from the status line.
    pub fn on_close(&mut self, view: ViewId) {
        if let Some(task) = self.registry.remove(view) {
            info!("View {} closed with task '{}' {}.", view, task.command, task.status);
        }
        self.host.show_links(view, &[]);
    }

    fn migrate_step(&mut self, direction: Direction) -> Result<()> {
        let Some(view) = self.host.active_view() else {
            self.host.message_dialog(&Error::NoActiveView.to_string());
            return Err(Error::NoActiveView);
        };
        match MigrationCommand::step(direction, &view) {
            Ok(command) => self.run_command(command),
            Err(e) => {
                self.host.message_dialog(&e.to_string());
                Err(e)
            }
        }
    }

    fn run_command(&mut self, command: MigrationCommand) -> Result<()> {
        let Some(view) = self.host.active_view() else {
            self.host.message_dialog(&Error::NoActiveView.to_string());
            return Err(Error::NoActiveView);
        };
        let Some(root) = project::find_project_root(&self.host.folders()) else {
            self.host.show_output(&Error::NoProjectRoot.to_string());
            return Err(Error::NoProjectRoot);
        };

        let command = command.to_command_line(&self.config.rails);
        let token = self.registry.begin(view.id, command.clone());
        self.events.set_timeout(
            self.animator.interval(),
            AnimatorTick {
                view: view.id,
                token,
            },
        );
        self.in_flight += 1;
        self.runner.spawn(view.id, token, command, root);
        Ok(())
    }

    fn open_latest(&mut self) -> Result<()> {
        let found = project::find_project_root(&self.host.folders())
            .ok_or(Error::NoProjectRoot)
            .and_then(|root| project::list_migrations(&root))
            .and_then(|migrations| {
                project::latest_migration(&migrations)
                    .map(|latest| latest.path.clone())
                    .ok_or(Error::NoMigrations)
            });

        match found {
            Ok(path) => {
                info!("Opening latest migration {}.", path.display());
                self.host.open_file(&path);
                if let Some(view) = self.host.active_view() {
                    self.on_activated(&view);
                }
                Ok(())
            }
            Err(e) => {
                self.host.message_dialog(&e.to_string());
                Err(e)
            }
        }
    }

    /// Serves due ticks and arrived completions until `deadline`. Returns the
    /// results delivered during this call.
    pub fn pump(&mut self, deadline: Instant) -> Vec<CommandResult> {
        let mut finished = Vec::new();
        while let Some(event) = self.events.next_event(deadline) {
            finished.extend(self.handle_event(event));
        }
        finished
    }

    /// Drives the loop until every dispatched command has reported back and
    /// every animator has stopped.
    pub fn run_until_idle(&mut self) -> Vec<CommandResult> {
        let mut finished = Vec::new();
        while !self.is_idle() {
            let deadline = Instant::now() + self.animator.interval() + Duration::from_millis(50);
            if let Some(event) = self.events.next_event(deadline) {
                finished.extend(self.handle_event(event));
            }
        }
        finished
    }

    fn handle_event(&mut self, event: LoopEvent) -> Option<CommandResult> {
        match event {
            LoopEvent::Tick(tick) => {
                self.handle_tick(tick);
                None
            }
            LoopEvent::Completion(completion) => Some(self.handle_completion(completion)),
        }
    }

    fn handle_tick(&mut self, tick: AnimatorTick) {
        match self.animator.tick(&mut self.registry, tick.view, tick.token) {
            Some(status) => {
                self.host.set_status(tick.view, &self.config.status_key, &status);
                self.events.set_timeout(self.animator.interval(), tick);
            }
            None => debug!("Animator for view {} stopped.", tick.view),
        }
    }

    fn handle_completion(&mut self, completion: Completion) -> CommandResult {
        let Completion {
            view,
            token,
            result,
        } = completion;
        self.in_flight = self.in_flight.saturating_sub(1);
        info!(
            "'{}' finished for view {} with exit code {}.",
            result.command, view, result.exit_code
        );

        self.host.show_output(&result.render());

        let status = result.status();
        match self.registry.finish(view, token, status) {
            Finish::Current | Finish::Superseded => {
                let text = self.animator.final_status(&result.command, status);
                self.host.set_status(view, &self.config.status_key, &text);
            }
            Finish::Absent => {}
        }
        result
    }
}
