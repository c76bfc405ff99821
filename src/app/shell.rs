use std::{
    ops::ControlFlow,
    path::PathBuf,
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal,
};
use log::debug;

use super::{plugin::MigrationBoy, terminal::TerminalHost};
use crate::{error::Result, migrations::actions::Action, models::task::ViewId};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

const HELP: &str = "\
Commands:
  open [FILE]     open a file (or a scratch view) and focus it
  views           list open views
  switch ID       focus a view
  close [ID]      close a view (default: the active one)
  palette         list the commands available for the active view
  migrate         rails db:migrate
  up|down|redo    rails db:migrate:<step> for the active migration file
  latest          open the newest migration
  link HREF       follow an inline link, e.g. up:20230101000000
  status          task state of every view
  exit            quit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Open(Option<PathBuf>),
    Views,
    Switch(ViewId),
    Close(Option<ViewId>),
    Palette,
    Run(Action),
    Link(String),
    Status,
    Help,
    Exit,
}

pub fn run_shell(mut boy: MigrationBoy<TerminalHost>) -> Result<()> {
    println!("Rails migration shell started. Enter a command, `help`, or `exit` to quit.");
    terminal::enable_raw_mode()?;
    let outcome = shell_loop(&mut boy);
    terminal::disable_raw_mode()?;
    boy.shutdown();
    println!();
    outcome
}

fn shell_loop(boy: &mut MigrationBoy<TerminalHost>) -> Result<()> {
    let mut commands_history: Vec<String> = Vec::new();
    let mut history_index = 0;
    let mut input = String::new();

    loop {
        if boy.host_mut().take_dirty() {
            boy.host_mut().draw_prompt(&input)?;
        }

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind != KeyEventKind::Press {
                    continue;
                }
                match key_event.code {
                    KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                        boy.host_mut().print_block("^C");
                        return Ok(());
                    }
                    KeyCode::Enter => {
                        let line = std::mem::take(&mut input);
                        boy.host_mut().print_block(&format!(">>> {}", line));
                        if !line.trim().is_empty() {
                            commands_history.push(line.clone());
                        }
                        history_index = commands_history.len();

                        match parse_line(&line) {
                            Ok(Some(command)) => {
                                if execute(boy, command).is_break() {
                                    boy.host_mut().print_block("Exiting...");
                                    return Ok(());
                                }
                            }
                            Ok(None) => {}
                            Err(message) => boy.host_mut().print_block(&message),
                        }
                    }
                    KeyCode::Up => {
                        if history_index > 0 {
                            history_index -= 1;
                        }
                        if let Some(command) = commands_history.get(history_index) {
                            input = command.clone();
                        }
                    }
                    KeyCode::Down => {
                        if history_index < commands_history.len() {
                            history_index += 1;
                        }
                        input = commands_history
                            .get(history_index)
                            .cloned()
                            .unwrap_or_default();
                    }
                    KeyCode::Char(c) => input.push(c),
                    KeyCode::Backspace => {
                        input.pop();
                    }
                    _ => {}
                }
                boy.host_mut().mark_dirty();
            }
        }

        boy.pump(Instant::now());
    }
}

fn parse_line(line: &str) -> std::result::Result<Option<ShellCommand>, String> {
    let mut args = line.split_whitespace();
    let Some(command) = args.next() else {
        return Ok(None);
    };

    let parsed = match command {
        "open" => ShellCommand::Open(args.next().map(PathBuf::from)),
        "views" => ShellCommand::Views,
        "switch" => ShellCommand::Switch(parse_id(args.next())?),
        "close" => match args.next() {
            Some(id) => ShellCommand::Close(Some(parse_id(Some(id))?)),
            None => ShellCommand::Close(None),
        },
        "palette" => ShellCommand::Palette,
        "link" => match args.next() {
            Some(href) => ShellCommand::Link(href.to_string()),
            None => return Err("Link must be specified.".to_string()),
        },
        "status" => ShellCommand::Status,
        "help" => ShellCommand::Help,
        "exit" | "quit" => ShellCommand::Exit,
        other => match Action::from_name(other) {
            Some(action) => ShellCommand::Run(action),
            None => return Err(format!("Unknown command: {}. Type `help` for a list.", other)),
        },
    };
    Ok(Some(parsed))
}

fn parse_id(arg: Option<&str>) -> std::result::Result<ViewId, String> {
    let arg = arg.ok_or_else(|| "View ID must be specified.".to_string())?;
    arg.parse::<ViewId>()
        .map_err(|_| "Invalid view ID format.".to_string())
}

fn execute(boy: &mut MigrationBoy<TerminalHost>, command: ShellCommand) -> ControlFlow<()> {
    match command {
        ShellCommand::Open(file) => {
            let view = boy.host_mut().open(file);
            let label = describe(view.file.as_ref());
            boy.host_mut().print_block(&format!("Opened [{}] {}", view.id, label));
            boy.on_activated(&view);
        }
        ShellCommand::Views => {
            let active = boy.host().active_id();
            let lines: Vec<String> = boy
                .host()
                .views()
                .map(|view| {
                    let marker = if Some(view.id) == active { "*" } else { " " };
                    format!("{} [{}] {}", marker, view.id, describe(view.file.as_ref()))
                })
                .collect();
            let text = if lines.is_empty() {
                "No open views".to_string()
            } else {
                lines.join("\n")
            };
            boy.host_mut().print_block(&text);
        }
        ShellCommand::Switch(id) => match boy.host_mut().switch(id) {
            Some(view) => boy.on_activated(&view),
            None => boy.host_mut().print_block(&format!("View {} not found", id)),
        },
        ShellCommand::Close(id) => {
            let Some(id) = id.or_else(|| boy.host().active_id()) else {
                boy.host_mut().print_block("No open views");
                return ControlFlow::Continue(());
            };
            match boy.host_mut().close(id) {
                Some(_) => boy.on_close(id),
                None => boy.host_mut().print_block(&format!("View {} not found", id)),
            }
        }
        ShellCommand::Palette => {
            let lines: Vec<String> = boy
                .enabled_actions()
                .iter()
                .map(|action| format!("  {:<8} {}", action.name(), action.title()))
                .collect();
            boy.host_mut().print_block(&lines.join("\n"));
        }
        ShellCommand::Run(action) => {
            if let Err(e) = boy.run(action) {
                debug!("{} aborted: {}", action.title(), e);
            }
        }
        ShellCommand::Link(href) => {
            if let Err(e) = boy.follow_link(&href) {
                boy.host_mut().print_block(&e.to_string());
            }
        }
        ShellCommand::Status => {
            let lines: Vec<String> = boy
                .host()
                .views()
                .map(|view| {
                    let task = boy
                        .registry()
                        .get(view.id)
                        .map(|task| format!("{} ({})", task.status, task.command))
                        .unwrap_or_else(|| boy.registry().status(view.id).to_string());
                    format!("[{}] {}", view.id, task)
                })
                .collect();
            let text = if lines.is_empty() {
                "No open views".to_string()
            } else {
                lines.join("\n")
            };
            boy.host_mut().print_block(&text);
        }
        ShellCommand::Help => boy.host_mut().print_block(HELP),
        ShellCommand::Exit => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}

fn describe(file: Option<&PathBuf>) -> String {
    file.map(|path| path.display().to_string())
        .unwrap_or_else(|| "<scratch>".to_string())
}
