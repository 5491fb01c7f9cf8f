//! backup-desk - command line front end for the backup session layer.
//!
//! Each invocation restores the previous session, applies one command and
//! saves the result back before exiting.

mod backend;
mod config;
mod render;

use anyhow::Result;
use backup_session::{utils, BackupMode, Config, DisplayStrings, Session, SessionError, TabId};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::backend::LocalBackend;
use crate::config::{AppConfig, DeskConfig};
use crate::render::{HistoryRender, RecentView, TabsView};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the session configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List or change tabs
    Tabs {
        #[command(subcommand)]
        action: Option<TabsCommand>,
    },
    /// Open a work file in the active tab
    Open { path: String },
    /// Show the recent files, or remove one
    Recent {
        #[arg(long, value_name = "PATH")]
        remove: Option<String>,
    },
    /// Show the backup history of the active tab
    History {
        /// Filter by file name or memo; "" clears the filter
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Pin the write target directory of the active tab
    Target {
        dir: Option<String>,
        /// Go back to the inferred target
        #[arg(long, conflicts_with = "dir")]
        clear: bool,
    },
    /// Pin the generation of a listed backup as the write target
    Generation { file_path: String },
    /// Show or write the memo of a backup file
    Note { file_path: String, text: Option<String> },
    /// Set the backup root of the active tab
    BackupDir { dir: String },
    /// Set the backup mode and its options
    Mode {
        mode: BackupMode,
        #[arg(long)]
        compress: Option<String>,
        #[arg(long)]
        algo: Option<String>,
        #[arg(long)]
        format: Option<String>,
    },
    /// Show what a backup of the active tab would do
    Plan,
    /// Show what restoring the given backups would do
    RestorePlan { sources: Vec<String> },
    /// Show or change preferences
    Prefs {
        #[arg(long)]
        restore_previous_state: Option<bool>,
        #[arg(long)]
        always_on_top: Option<bool>,
        #[arg(long)]
        tray_mode: Option<bool>,
    },
}

#[derive(Subcommand, Debug)]
enum TabsCommand {
    List,
    Add,
    Remove { id: i64 },
    Switch { id: i64 },
    /// Move a tab to another tab's position
    Move { dragged: i64, target: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let desk = DeskConfig::from_env();

    // Load configuration
    let config_path = args.config.clone().or_else(|| desk.session_config.clone());
    let config = if let Some(path) = config_path {
        Config::from_file(&path)?
    } else {
        Config::default()
    };

    // Initialize logging
    let log_level = args
        .log_level
        .as_deref()
        .or(desk.log_level.as_deref())
        .unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    let mut preferences = AppConfig::load_or_create(&desk.config_dir)?;
    if let Command::Prefs {
        restore_previous_state,
        always_on_top,
        tray_mode,
    } = &args.command
    {
        update_preferences(&mut preferences, *restore_previous_state, *always_on_top, *tray_mode);
        preferences.save(&desk.config_dir)?;
        println!("{}", serde_json::to_string_pretty(&preferences)?);
        return Ok(());
    }

    tracing::debug!(
        "Starting backup-desk v{} (config dir: {})",
        env!("CARGO_PKG_VERSION"),
        desk.config_dir.display()
    );

    let backend = Arc::new(LocalBackend::new(desk.config_dir.clone(), preferences));
    let session = Session::new(backend, &config);
    session.load_recent_files().await;
    session.restore().await;

    let outcome = run(&session, &config, args.command).await;

    session.flush().await;
    session.save().await;

    match outcome {
        Ok(output) => {
            print!("{output}");
            Ok(())
        }
        Err(e) if e.is_user_input() => {
            eprintln!("{}", user_message(&e, &config));
            std::process::exit(2);
        }
        Err(e) => Err(e.into()),
    }
}

fn update_preferences(
    preferences: &mut AppConfig,
    restore_previous_state: Option<bool>,
    always_on_top: Option<bool>,
    tray_mode: Option<bool>,
) {
    if let Some(value) = restore_previous_state {
        preferences.restore_previous_state = value;
    }
    if let Some(value) = always_on_top {
        preferences.always_on_top = value;
    }
    if let Some(value) = tray_mode {
        preferences.tray_mode = value;
    }
}

fn user_message(error: &SessionError, config: &Config) -> String {
    match error {
        SessionError::NoFileSelected => config.strings.select_file_first.clone(),
        SessionError::NothingToRestore => config.strings.nothing_to_restore.clone(),
        other => other.to_string(),
    }
}

fn tabs_view(session: &Session, strings: &DisplayStrings) -> String {
    TabsView {
        tabs: &session.tabs(),
        strings,
    }
    .to_string()
}

fn history_view(session: &Session, strings: &DisplayStrings) -> String {
    HistoryRender {
        panel: &session.history(),
        strings,
    }
    .to_string()
}

async fn run(session: &Session, config: &Config, command: Command) -> backup_session::Result<String> {
    let strings = &config.strings;
    let output = match command {
        Command::Tabs { action } => {
            match action.unwrap_or(TabsCommand::List) {
                TabsCommand::List => {
                    if let Err(e) = session.refresh_work_file_size().await {
                        tracing::debug!("Work file size not refreshed: {}", e);
                    }
                }
                TabsCommand::Add => {
                    session.add_tab();
                }
                TabsCommand::Remove { id } => {
                    if !session.remove_tab(TabId(id)) {
                        tracing::warn!("Tab {} was not removed", id);
                    }
                }
                TabsCommand::Switch { id } => {
                    if !session.switch_tab(TabId(id)) {
                        return Err(SessionError::UnknownTab(TabId(id)));
                    }
                }
                TabsCommand::Move { dragged, target } => {
                    session.reorder(TabId(dragged), TabId(target));
                }
            }
            tabs_view(session, strings)
        }
        Command::Open { path } => {
            session.open_work_file(&path).await?;
            session.refresh_history().await;
            format!(
                "{}\n{}",
                strings.updated_work_file,
                history_view(session, strings)
            )
        }
        Command::Recent { remove } => {
            if let Some(path) = remove {
                session.remove_recent_file(&path);
            }
            RecentView {
                paths: &session.recent_files(),
                strings,
            }
            .to_string()
        }
        Command::History { query } => {
            if let Some(query) = query {
                session.set_search_query(&query);
            }
            session.refresh_history().await;
            history_view(session, strings)
        }
        Command::Target { dir, clear } => {
            let dir = if clear { String::new() } else { dir.unwrap_or_default() };
            session.select_target_dir(&dir).await;
            history_view(session, strings)
        }
        Command::Generation { file_path } => {
            session.refresh_history().await;
            if session.select_generation(&file_path).await.is_none() {
                tracing::info!("{} is not a selectable generation", file_path);
            }
            history_view(session, strings)
        }
        Command::Note { file_path, text } => match text {
            Some(text) => match session.write_note(&file_path, &text).await {
                Ok(_) => format!("{}\n", strings.memo_saved),
                Err(e) => {
                    eprintln!("{}", strings.memo_save_error);
                    return Err(e);
                }
            },
            None => format!("{}\n", session.read_note(&file_path).await),
        },
        Command::BackupDir { dir } => {
            session.set_backup_dir(&dir);
            tabs_view(session, strings)
        }
        Command::Mode {
            mode,
            compress,
            algo,
            format,
        } => {
            session.set_backup_mode(mode);
            if let Some(compress) = compress {
                session.set_compress_mode(&compress);
            }
            if let Some(algo) = algo {
                session.set_diff_algo(&algo);
            }
            if let Some(format) = format {
                session.set_archive_format(&format);
            }
            tabs_view(session, strings)
        }
        Command::Plan => {
            let plan = session.plan_backup().await?;
            format!("{}\n", serde_json::to_string_pretty(&plan)?)
        }
        Command::RestorePlan { sources } => {
            let plan = session.plan_restore(&sources)?;
            format!(
                "{}\n{}\n",
                strings.restore_confirm,
                serde_json::to_string_pretty(&plan)?
            )
        }
        // handled before the session is built
        Command::Prefs { .. } => String::new(),
    };
    Ok(output)
}
