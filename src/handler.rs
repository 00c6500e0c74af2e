use std::path::PathBuf;

use crate::app::App;
use crate::error::{AppError, Result};
use crate::format::{format_bytes, format_timestamp};
use crate::fs::clipboard::TransferAction;
use crate::fs::search::SearchDebouncer;
use crate::fs::sort::SortKey;

pub const HELP: &str = "\
commands:
  ls                      list the current folder
  cd <name> | up          enter a folder / go to the parent
  sort <name|size|date>   sort (same key again flips direction)
  select <name>           start or toggle multi-select
  select-all | clear      select everything / leave multi-select
  copy [name] | move [name]  stage an item or the selection
  paste | cancel          paste here / drop the clipboard
  mkdir <name>            create a folder
  rename <name> <new>     rename (quote names with spaces)
  rm [name]               delete an item or the selection
  search <query>          search the whole storage (empty query exits)
  info <name>             show details
  import <path>...        copy files from outside into this folder
  help | quit";

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Cd(String),
    Up,
    Sort(SortKey),
    Select(String),
    SelectAll,
    Clear,
    Stage(TransferAction, Option<String>),
    Paste,
    Cancel,
    Mkdir(String),
    Rename { from: String, to: String },
    Remove(Option<String>),
    Search(String),
    Info(String),
    Import(Vec<PathBuf>),
    Help,
    Quit,
}

/// Split a line into words, honouring double quotes.
fn split_args(line: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if in_quotes {
        return Err(AppError::InvalidCommand("unterminated quote".into()));
    }
    if has_token {
        args.push(current);
    }
    Ok(args)
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let args = split_args(rest)?;
    // Single-name commands accept unquoted names with spaces.
    let name = || -> Result<String> {
        if args.is_empty() {
            Err(AppError::InvalidCommand(format!("usage: {} <name>", word)))
        } else {
            Ok(args.join(" "))
        }
    };
    let optional_name = || (!args.is_empty()).then(|| args.join(" "));

    let command = match word {
        "ls" => Command::List,
        "cd" => match rest {
            ".." => Command::Up,
            _ => Command::Cd(name()?),
        },
        "up" => Command::Up,
        "sort" => Command::Sort(SortKey::parse(&name()?)),
        "select" => Command::Select(name()?),
        "select-all" => Command::SelectAll,
        "clear" => Command::Clear,
        "copy" => Command::Stage(TransferAction::Copy, optional_name()),
        "move" => Command::Stage(TransferAction::Move, optional_name()),
        "paste" => Command::Paste,
        "cancel" => Command::Cancel,
        "mkdir" => Command::Mkdir(name()?),
        "rename" => match args.as_slice() {
            [from, to] => Command::Rename {
                from: from.clone(),
                to: to.clone(),
            },
            _ => {
                return Err(AppError::InvalidCommand(
                    "usage: rename <name> <new-name>".into(),
                ))
            }
        },
        "rm" => Command::Remove(optional_name()),
        "search" => Command::Search(rest.to_string()),
        "info" => Command::Info(name()?),
        "import" => {
            if args.is_empty() {
                return Err(AppError::InvalidCommand("usage: import <path>...".into()));
            }
            Command::Import(args.iter().map(PathBuf::from).collect())
        }
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => {
            return Err(AppError::InvalidCommand(format!(
                "unknown command '{}' (try 'help')",
                other
            )))
        }
    };
    Ok(Some(command))
}

/// Run `command` against the session and return the lines to print.
///
/// With a debouncer, searches are scheduled and their results arrive later
/// as an event; without one they run inline.
pub async fn execute(
    app: &mut App,
    command: Command,
    debouncer: Option<&mut SearchDebouncer>,
) -> Result<Vec<String>> {
    let mut out = Vec::new();
    match command {
        Command::List => {
            app.refresh().await?;
            out.extend(render_listing(app));
        }
        Command::Cd(name) => {
            app.navigate_into(&name).await?;
            out.extend(render_listing(app));
        }
        Command::Up => {
            app.navigate_up().await?;
            out.extend(render_listing(app));
        }
        Command::Sort(key) => {
            app.set_sort(key);
            out.push(format!("sorted by {}", app.sort.label()));
            out.extend(render_listing(app));
        }
        Command::Select(name) => {
            app.select(&name)?;
            out.push(selection_summary(app));
        }
        Command::SelectAll => {
            app.select_all();
            out.push(selection_summary(app));
        }
        Command::Clear => {
            app.clear_selection();
            out.push("selection cleared".into());
        }
        Command::Stage(action, name) => match app.stage(action, name.as_deref())? {
            0 => out.push("nothing selected".into()),
            n => out.push(format!(
                "{} item(s) ready to {}; use 'paste' in the target folder",
                n,
                action.verb()
            )),
        },
        Command::Paste => {
            let report = app.paste().await?;
            out.push(format!(
                "{} {} item(s) into {}",
                past_tense(report.action),
                report.created.len(),
                app.folder_name()
            ));
            out.extend(render_listing(app));
        }
        Command::Cancel => {
            app.cancel_transfer();
            out.push("clipboard cleared".into());
        }
        Command::Mkdir(name) => {
            let path = app.create_folder(&name).await?;
            out.push(format!("created {}", path.display()));
        }
        Command::Rename { from, to } => {
            let path = app.rename(&from, &to).await?;
            out.push(format!("renamed to {}", path.display()));
        }
        Command::Remove(Some(name)) => {
            app.delete(&name).await?;
            out.push(format!("deleted {}", name));
        }
        Command::Remove(None) => match app.delete_selected().await? {
            0 => out.push("nothing selected".into()),
            n => out.push(format!("deleted {} item(s)", n)),
        },
        Command::Search(query) => match app.set_query(&query) {
            None => {
                if let Some(debouncer) = debouncer {
                    debouncer.cancel();
                }
                out.push("search closed".into());
                out.extend(render_listing(app));
            }
            Some(query) => match debouncer {
                Some(debouncer) => {
                    debouncer.schedule(app.storage.clone(), query.clone());
                    out.push(format!("searching for '{}'...", query));
                }
                None => {
                    let outcome = app.storage.search(&query).await;
                    let skipped = outcome.skipped_dirs;
                    app.apply_search(&query, outcome);
                    out.extend(render_search(app, skipped));
                }
            },
        },
        Command::Info(name) => {
            let d = app.details(&name)?;
            out.push(format!("name:     {}", d.name));
            out.push(format!("kind:     {}", d.kind));
            out.push(format!("size:     {}", d.size));
            out.push(format!("modified: {}", d.modified));
            out.push(format!("type:     {} ({})", d.category, d.mime_type));
            out.push(format!("path:     {}", d.path));
            out.push(format!("icon:     {} {}", d.icon, d.color));
        }
        Command::Import(paths) => {
            let report = app.import(&paths).await?;
            out.push(format!("imported {} file(s)", report.imported.len()));
            for name in report.skipped {
                out.push(format!("skipped {} (already exists)", name));
            }
        }
        Command::Help => out.extend(HELP.lines().map(str::to_string)),
        Command::Quit => app.quit(),
    }
    Ok(out)
}

fn past_tense(action: TransferAction) -> &'static str {
    match action {
        TransferAction::Copy => "copied",
        TransferAction::Move => "moved",
    }
}

fn selection_summary(app: &App) -> String {
    if app.selection.is_active() {
        format!(
            "{} selected ({})",
            app.selection.len(),
            format_bytes(app.selection.size(), 2)
        )
    } else {
        "selection cleared".into()
    }
}

/// One line per displayed entry, prefixed with a header.
pub fn render_listing(app: &App) -> Vec<String> {
    let entries = app.visible_entries();
    let mut lines = Vec::with_capacity(entries.len() + 3);
    lines.push(format!(
        "{}  [{} item(s), sort: {}]",
        app.folder_name(),
        entries.len(),
        app.sort.label()
    ));
    if entries.is_empty() {
        lines.push("  (empty)".into());
    }
    for entry in &entries {
        let mark = if app.selection.contains(&entry.path) { '*' } else { ' ' };
        if entry.is_directory {
            lines.push(format!(
                "{} {}/  {:>10}  {}",
                mark,
                entry.name,
                "-",
                format_timestamp(entry.modification_time)
            ));
        } else {
            lines.push(format!(
                "{} {}  {:>10}  {}",
                mark,
                entry.name,
                format_bytes(entry.size, 2),
                format_timestamp(entry.modification_time)
            ));
        }
    }
    if !app.clipboard.is_empty() {
        if let Some(action) = app.clipboard.action {
            lines.push(format!(
                "clipboard: {} item(s) to {}",
                app.clipboard.len(),
                action.verb()
            ));
        }
    }
    lines
}

/// Search results with their locations relative to the root.
pub fn render_search(app: &App, skipped_dirs: usize) -> Vec<String> {
    let entries = app.visible_entries();
    let mut lines = vec![format!(
        "{} result(s) for '{}'",
        entries.len(),
        app.search.query
    )];
    for entry in &entries {
        let relative = entry
            .path
            .strip_prefix(app.storage.root())
            .unwrap_or(&entry.path);
        let suffix = if entry.is_directory { "/" } else { "" };
        lines.push(format!("  {}{}", relative.display(), suffix));
    }
    if skipped_dirs > 0 {
        lines.push(format!("({} unreadable folder(s) skipped)", skipped_dirs));
    }
    lines
}
