use anyhow::{Context, Result};
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

use super::format::{checkpoint_line, end_note, ref_lines};
use super::CommandContext;
use crate::browser::Browser;
use crate::state::{AppState, Loadable};

const HELP: &str = "\
Commands:
  server <url>            browse another server
  refs                    list refs (* marks the default)
  select <ref-or-hash>    show the history of a ref or checkpoint
  log                     show the current history again
  status                  show what the browser is doing
  help                    show this text
  quit                    leave";

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Server(String),
    Refs,
    Select(String),
    Log,
    Status,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

fn parse_command(line: &str) -> ReplCommand {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match (word, rest) {
        ("", _) => ReplCommand::Empty,
        ("server", url) if !url.is_empty() => ReplCommand::Server(url.to_string()),
        ("refs", "") => ReplCommand::Refs,
        ("select", target) if !target.is_empty() => ReplCommand::Select(target.to_string()),
        ("log", "") => ReplCommand::Log,
        ("status", "") => ReplCommand::Status,
        ("help", _) | ("?", _) => ReplCommand::Help,
        ("quit", _) | ("exit", _) => ReplCommand::Quit,
        _ => ReplCommand::Unknown(line.to_string()),
    }
}

fn status_lines(state: &AppState) -> Vec<String> {
    let server = state
        .server_url
        .as_ref()
        .map(|u| u.to_string())
        .unwrap_or_else(|| "(none)".to_string());
    let selected = match (state.selected_ref_name(), state.selected_hash.as_deref()) {
        (Some(name), Some(hash)) => format!("{} ({})", name, hash),
        (None, Some(hash)) => hash.to_string(),
        _ => "(nothing)".to_string(),
    };

    let mut lines = vec![
        format!("Server: {}", server),
        format!("Phase: {}", state.phase()),
        format!("Selected: {}", selected),
    ];
    if let Loadable::Failed(error) = &state.refs {
        lines.push(format!("Refs failed: {}", error));
    }
    if let Loadable::Failed(error) = &state.history {
        lines.push(format!("History failed: {}", error));
    }
    lines
}

fn refs_view(state: &AppState) -> Vec<String> {
    match &state.refs {
        Loadable::Ready(refs) if refs.is_empty() => vec!["No refs".to_string()],
        Loadable::Ready(refs) => ref_lines(refs, state.preferred_ref.as_deref()),
        Loadable::Loading => vec!["Loading refs…".to_string()],
        Loadable::Failed(error) => vec![format!("❌ Failed to load refs: {}", error)],
        Loadable::Idle => vec!["No server selected".to_string()],
    }
}

fn history_view(state: &AppState) -> Vec<String> {
    match &state.history {
        Loadable::Ready(history) => {
            let now = Utc::now();
            let mut lines: Vec<String> = history
                .checkpoints
                .iter()
                .map(|cp| checkpoint_line(cp, now))
                .collect();
            if history.is_empty() {
                lines.push("(no checkpoints)".to_string());
            }
            if let Some(note) = end_note(history) {
                lines.push(note);
            }
            lines
        }
        Loadable::Loading => vec!["Loading history…".to_string()],
        Loadable::Failed(error) => vec![format!("❌ Failed to load history: {}", error)],
        Loadable::Idle => vec!["Nothing selected".to_string()],
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

pub async fn run_browse(ctx: &CommandContext) -> Result<()> {
    let browser = Browser::new(
        ctx.client.clone(),
        ctx.walker(None),
        ctx.settings.default_ref.clone(),
    );

    browser
        .set_server(&ctx.settings.server_url)
        .with_context(|| format!("Cannot use server {}", ctx.settings.server_url))?;
    let state = browser.settled().await;
    print_lines(status_lines(&state));
    print_lines(history_view(&state));
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_command(&line) {
            ReplCommand::Server(url) => match browser.set_server(&url) {
                Ok(()) => {
                    let state = browser.settled().await;
                    print_lines(refs_view(&state));
                    print_lines(history_view(&state));
                }
                Err(e) => warn!("{}", e),
            },
            ReplCommand::Refs => print_lines(refs_view(&browser.snapshot())),
            ReplCommand::Select(target) => {
                browser.select(&target);
                print_lines(history_view(&browser.settled().await));
            }
            ReplCommand::Log => print_lines(history_view(&browser.snapshot())),
            ReplCommand::Status => print_lines(status_lines(&browser.snapshot())),
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Quit => break,
            ReplCommand::Empty => {}
            ReplCommand::Unknown(line) => {
                println!("Unknown command: {}. Type 'help' for commands.", line)
            }
        }
    }

    Ok(())
}
