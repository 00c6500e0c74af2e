use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use secure_files::app::{App, EntryDetails};
use secure_files::config::{AppConfig, GeneralConfig};
use secure_files::error::{self, AppError};
use secure_files::event::{Event, EventHandler};
use secure_files::fs::clipboard::{ClipboardState, TransferAction};
use secure_files::fs::entry::Entry;
use secure_files::fs::search::SearchDebouncer;
use secure_files::fs::sort::{sort_entries, SortDirection, SortKey};
use secure_files::fs::storage::Storage;
use secure_files::fs::watcher::DirWatcher;
use secure_files::handler;

/// A sandboxed file manager for a single storage folder.
#[derive(Parser, Debug)]
#[command(name = "sfm", version, about)]
struct Cli {
    /// Storage root (defaults to the configured root)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Explicit config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Disable filesystem watcher (auto-refresh)
    #[arg(long, global = true)]
    no_watcher: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List a folder
    Ls {
        #[arg(default_value = ".")]
        path: PathBuf,
        /// name, size or date
        #[arg(long)]
        sort: Option<String>,
        /// Descending order
        #[arg(long)]
        desc: bool,
    },
    /// Search every folder for names containing QUERY
    Search { query: String },
    /// Create a folder
    Mkdir { path: PathBuf },
    /// Rename an item in place
    Rename { path: PathBuf, new_name: String },
    /// Delete items
    Rm {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Copy items into a folder
    Cp {
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        #[arg(long, short = 't')]
        into: PathBuf,
    },
    /// Move items into a folder
    Mv {
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        #[arg(long, short = 't')]
        into: PathBuf,
    },
    /// Copy files from outside the storage root into a folder
    Import {
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        #[arg(long, short = 't', default_value = ".")]
        into: PathBuf,
    },
    /// Show details of an item
    Info { path: PathBuf },
    /// Interactive shell (default)
    Shell,
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();

    let overrides = AppConfig {
        general: GeneralConfig {
            root: cli.root.as_ref().map(|p| p.display().to_string()),
        },
        ..Default::default()
    };
    let (config, warnings) = AppConfig::load(cli.config.as_deref(), Some(&overrides));

    init_tracing(if cli.verbose { "debug" } else { config.log_level() });
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    let root = config.root();
    if cli.root.is_none() && config.general.root.is_none() && !root.exists() {
        std::fs::create_dir_all(&root)?;
        tracing::info!(root = %root.display(), "created default storage root");
    }
    let storage = Storage::open(&root)?
        .with_filter(config.name_filter())
        .with_max_duplicate_probes(config.max_duplicate_probes());
    tracing::debug!(root = %storage.root().display(), "storage opened");

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Ls { path, sort, desc } => {
            let mut sort_config = config.sort_config();
            if let Some(key) = sort {
                sort_config.key = SortKey::parse(&key);
            }
            if desc {
                sort_config.direction = SortDirection::Descending;
            }
            let entries = sort_entries(&storage.list_directory(&path).await?, sort_config);
            print_entries(&storage, &entries, cli.json)?;
        }
        Commands::Search { query } => {
            let outcome = storage.search(&query).await;
            print_entries(&storage, &outcome.entries, cli.json)?;
            if outcome.skipped_dirs > 0 {
                tracing::warn!(skipped = outcome.skipped_dirs, "unreadable folders skipped");
            }
        }
        Commands::Mkdir { path } => {
            let resolved = storage.resolve(&path)?;
            if storage.is_root(&resolved) {
                return Err(AppError::AlreadyExists(resolved));
            }
            let name = file_name(&resolved)?;
            let parent = storage.parent_of(&resolved);
            let created = storage.create_directory(&parent, &name).await?;
            println!("{}", created.display());
        }
        Commands::Rename { path, new_name } => {
            let entry = storage.entry_at(&path).await?;
            let renamed = storage.rename(&entry, &new_name).await?;
            println!("{}", renamed.display());
        }
        Commands::Rm { paths } => {
            if paths.len() == 1 {
                storage.delete_entry(&paths[0]).await?;
            } else {
                storage.delete_many(&paths).await?;
            }
        }
        Commands::Cp { sources, into } => {
            transfer(&storage, &sources, &into, TransferAction::Copy).await?;
        }
        Commands::Mv { sources, into } => {
            transfer(&storage, &sources, &into, TransferAction::Move).await?;
        }
        Commands::Import { sources, into } => {
            let report = storage.import_files(&sources, &into).await?;
            for path in &report.imported {
                println!("{}", path.display());
            }
            for name in &report.skipped {
                eprintln!("skipped {} (already exists)", name);
            }
        }
        Commands::Info { path } => {
            let details = EntryDetails::from_entry(&storage.entry_at(&path).await?);
            if cli.json {
                println!("{}", to_json(&details)?);
            } else {
                println!("{}\n  {}  {}  {}", details.name, details.kind, details.size, details.modified);
                println!("  {} ({})\n  {}", details.category, details.mime_type, details.path);
                println!("  {} {}", details.icon, details.color);
            }
        }
        Commands::Shell => {
            let watcher_enabled = config.watcher_enabled() && !cli.no_watcher;
            run_shell(storage, &config, watcher_enabled).await?;
        }
    }

    Ok(())
}

fn file_name(path: &Path) -> error::Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| AppError::InvalidPath(path.display().to_string()))
}

fn to_json<T: serde::Serialize>(value: &T) -> error::Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::Io(std::io::Error::other(e)))
}

fn print_entries(storage: &Storage, entries: &[Entry], json: bool) -> error::Result<()> {
    if json {
        println!("{}", to_json(&entries)?);
        return Ok(());
    }
    let mut stdout = std::io::stdout().lock();
    for entry in entries {
        let relative = entry.path.strip_prefix(storage.root()).unwrap_or(&entry.path);
        let suffix = if entry.is_directory { "/" } else { "" };
        writeln!(stdout, "{}{}", relative.display(), suffix)?;
    }
    Ok(())
}

async fn transfer(
    storage: &Storage,
    sources: &[PathBuf],
    into: &Path,
    action: TransferAction,
) -> error::Result<()> {
    let mut items = Vec::with_capacity(sources.len());
    for source in sources {
        items.push(storage.entry_at(source).await?);
    }
    let mut clipboard = ClipboardState::new();
    clipboard.stage(items, action);
    let report = storage.paste_transfer(&mut clipboard, into).await?;
    for path in &report.created {
        println!("{}", path.display());
    }
    Ok(())
}

async fn run_shell(storage: Storage, config: &AppConfig, watcher_enabled: bool) -> error::Result<()> {
    let mut app = App::new(storage, config.sort_config());
    let mut events = EventHandler::new();
    let event_tx = events.sender();
    let mut debouncer = SearchDebouncer::new(
        Duration::from_millis(config.search_debounce_ms()),
        event_tx.clone(),
    );

    let mut watcher = if watcher_enabled {
        match DirWatcher::new(
            Duration::from_millis(config.watcher_debounce_ms()),
            app.storage.filter().clone(),
            event_tx.clone(),
        ) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(error = %e, "watcher unavailable");
                None
            }
        }
    } else {
        None
    };

    if let Err(e) = app.refresh().await {
        eprintln!("error: {}", e);
    }
    print_lines(&handler::render_listing(&app));
    if let Some(w) = watcher.as_mut() {
        if let Err(e) = w.watch(&app.current_dir) {
            tracing::warn!(error = %e, "failed to watch directory");
        }
    }
    events.spawn_stdin_reader();
    prompt(&app);

    while let Some(event) = events.next().await {
        match event {
            Event::Line(line) => {
                match handler::parse_command(&line) {
                    Ok(None) => {}
                    Ok(Some(command)) => {
                        match handler::execute(&mut app, command, Some(&mut debouncer)).await {
                            Ok(lines) => print_lines(&lines),
                            Err(e) => {
                                tracing::debug!(error = %e, "command failed");
                                eprintln!("error: {}", e);
                            }
                        }
                    }
                    Err(e) => eprintln!("{}", e),
                }
                if app.should_quit {
                    break;
                }
                if let Some(w) = watcher.as_mut() {
                    if w.watched().as_deref() != Some(app.current_dir.as_path()) {
                        if let Err(e) = w.watch(&app.current_dir) {
                            tracing::warn!(error = %e, "failed to watch directory");
                        }
                    }
                }
                prompt(&app);
            }
            Event::SearchComplete {
                generation,
                query,
                outcome,
            } => {
                if !debouncer.is_current(generation) {
                    continue;
                }
                let skipped = outcome.skipped_dirs;
                if app.apply_search(&query, outcome) {
                    println!();
                    print_lines(&handler::render_search(&app, skipped));
                    prompt(&app);
                }
            }
            Event::FsChange(dir) => {
                if !app.is_current_dir(&dir) {
                    continue;
                }
                tracing::debug!(dir = %dir.display(), "directory changed on disk");
                if let Err(e) = app.refresh().await {
                    eprintln!("error: {}", e);
                }
            }
            Event::InputClosed => break,
        }
    }

    debouncer.cancel();
    Ok(())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

fn prompt(app: &App) {
    print!("{}> ", app.folder_name());
    let _ = std::io::stdout().flush();
}
