//! conform: terminal review workspace for submittal conformance results.
//!
//! Entry point for the `conform` binary. Wires together the terminal lifecycle
//! (`tui`), unified event bus (`event`), background worker (`worker`), UI
//! (`ui`), theme system (`theme`), and the review engine and SQLite store
//! (`conform-core`).
//!
//! # Startup sequence
//!
//! 1. Parse flags and load `config.toml`. Both are read-only and safe before
//!    terminal init.
//! 2. Open the log file and install the tracing subscriber. Nothing may write
//!    to the terminal once raw mode is on.
//! 3. Open the repository and load the run, user directory, and saved
//!    comments and reviewers. `--list` prints and exits here.
//! 4. `install_panic_hook()`, `register_sigterm()`, then `init_tui()`.
//! 5. Create the event channel, `spawn_event_task()`, and spawn the worker.
//!
//! `restore_tui()` is called after the event loop exits (quit key, SIGTERM,
//! draw failure, or channel close). The panic hook covers unexpected panics.

mod app;
mod config;
mod event;
mod theme;
mod tui;
mod ui;
mod worker;

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use conform_core::db::SqliteRepository;
use conform_core::export::FAILURE_MESSAGE;
use conform_core::notify::Notice;
use conform_core::processing::COMPLETION_MESSAGE;
use conform_core::repository::{
    self, InMemoryRepository, ProjectRepository, ResultRepository, UserRepository,
};
use conform_core::seed::DEMO_RUN_ID;
use conform_core::session::Session;
use conform_core::workspace::ReviewWorkspace;
use conform_core::ReviewError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::{AppState, Mode};
use crate::config::Config;
use crate::event::{AppEvent, ChannelNotifier, EventHandler};
use crate::ui::keybindings::{handle_key, handle_mouse, KeyAction};
use crate::worker::{Worker, WorkerRequest};

#[derive(Debug, Parser)]
#[command(name = "conform", version, about = "Review submittal conformance results in the terminal")]
struct Cli {
    /// SQLite database file (overrides `database` in config.toml).
    #[arg(long, env = "CONFORM_DB")]
    db: Option<PathBuf>,
    /// Id of the user to sign in as (overrides `user` in config.toml).
    #[arg(long, env = "CONFORM_USER")]
    user: Option<String>,
    /// Open the latest run of this project.
    #[arg(long)]
    project: Option<String>,
    /// Open this run; takes precedence over --project.
    #[arg(long)]
    run: Option<String>,
    /// Play the analysis progress screen before showing results.
    #[arg(long)]
    simulate: bool,
    /// Use a seeded in-process store instead of the database.
    #[arg(long)]
    in_memory: bool,
    /// Print a listing and exit without opening the terminal UI.
    #[arg(long, value_enum)]
    list: Option<Listing>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Listing {
    Projects,
    Runs,
    /// User directory (admin only).
    Users,
    /// Material Index versions (admin only).
    MaterialIndex,
}

fn io_err(e: ReviewError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e)
}

/// Logs to `path`; the terminal belongs to the TUI.
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(path: &Path, level: &str) -> std::io::Result<()> {
    let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();
    let (config, config_warning) = config::load();

    let database = cli.db.clone().unwrap_or_else(|| config.database.clone());
    let data_dir = database
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&data_dir)?;
    init_tracing(&data_dir.join("conform.log"), &config.log_level)?;
    if let Some(warning) = config_warning {
        warn!("{warning}");
    }

    if cli.in_memory {
        info!("using in-memory store");
        run(InMemoryRepository::seeded(), cli, config).await
    } else {
        let repo = SqliteRepository::open(&database.to_string_lossy())
            .await
            .map_err(io_err)?;
        if repo.seed_if_empty().await.map_err(io_err)? {
            info!("empty database seeded with demonstration data");
        }
        run(repo, cli, config).await
    }
}

/// Picks the run to open: `--run`, else the newest run of `--project`, else the demo run.
async fn resolve_run<R: ProjectRepository>(repo: &R, cli: &Cli) -> conform_core::Result<String> {
    if let Some(run) = &cli.run {
        return Ok(run.clone());
    }
    if let Some(project) = &cli.project {
        let runs = repo.runs_for_project(project).await?;
        return runs
            .iter()
            .max_by_key(|r| r.version)
            .map(|r| r.id.clone())
            .ok_or_else(|| ReviewError::not_found("run for project", project.as_str()));
    }
    Ok(DEMO_RUN_ID.to_owned())
}

async fn print_listing<R>(repo: &R, session: &Session, listing: Listing) -> conform_core::Result<()>
where
    R: UserRepository + ProjectRepository,
{
    match listing {
        Listing::Projects => {
            for p in repo.list_projects().await? {
                println!("{}\t{}\t{}\t{}\t{:?}", p.id, p.job_id, p.name, p.location, p.status);
            }
        }
        Listing::Runs => {
            for p in repo.list_projects().await? {
                for r in repo.runs_for_project(&p.id).await? {
                    println!(
                        "{}\t{}\tv{}\t{}\t{}",
                        r.id,
                        r.project_id,
                        r.version,
                        r.status.label(),
                        ui::format_timestamp(r.created_at)
                    );
                }
            }
        }
        Listing::Users => {
            for u in repository::admin_users(repo, session).await? {
                println!("{}\t{}\t{}\t{:?}\t{:?}", u.id, u.display_name(), u.email, u.role, u.status);
            }
        }
        Listing::MaterialIndex => {
            for m in repository::admin_material_indexes(repo, session).await? {
                let active = if m.is_active { "active" } else { "" };
                println!("{}\tv{}\t{}\t{} items\t{active}", m.id, m.version_number, m.name, m.item_count);
            }
        }
    }
    Ok(())
}

async fn run<R>(repo: R, cli: Cli, config: Config) -> std::io::Result<()>
where
    R: ResultRepository + UserRepository + ProjectRepository,
{
    let user_id = cli.user.clone().unwrap_or_else(|| config.user.clone());
    let session = Session::new(repo.find_user(&user_id).await.map_err(io_err)?);
    info!(user = %session.user_id(), admin = session.is_admin(), "session started");

    if let Some(listing) = cli.list {
        return print_listing(&repo, &session, listing).await.map_err(io_err);
    }

    let run_id = resolve_run(&repo, &cli).await.map_err(io_err)?;
    let (run, results) = repo.load_run(&run_id).await.map_err(io_err)?;
    let directory = repo.list_users().await.map_err(io_err)?;
    let saved = repository::load_saved(&repo, &run_id).await.map_err(io_err)?;
    info!(run_id = %run_id, results = results.len(), comments = saved.comments.len(), "run loaded");

    let theme = theme::Theme::from_name(&config.theme);
    let mut state = AppState::default();

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm()?;
    let mut terminal = tui::init_tui()?;

    let handler = EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let mut rx = handler.rx;

    let notifier = ChannelNotifier::new(handler.tx.clone());
    let mut ws = ReviewWorkspace::new(run, results, directory, session, Box::new(notifier)).with_saved(saved);
    state.sync_focus(&mut ws);

    let worker = Worker::spawn(handler.tx.clone())?;
    if cli.simulate {
        state.mode = Mode::Processing;
        worker.send(WorkerRequest::Simulate { run_id: run_id.clone() });
    }

    // Exits only via `break` so `restore_tui()` is always reached.
    'event_loop: loop {
        tokio::select! {
            // Heartbeat: checks SIGTERM at least every 50ms on a quiet terminal.
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                let action = match maybe_event {
                    Some(AppEvent::Render) => {
                        if let Err(e) = terminal.draw(|frame| ui::render(frame, &mut state, &ws, &theme)) {
                            error!(error = %e, "draw failed");
                            break 'event_loop;
                        }
                        KeyAction::Continue
                    }
                    Some(AppEvent::Key(key)) => handle_key(key, &mut state, &mut ws),
                    Some(AppEvent::Mouse(mouse)) => handle_mouse(mouse, &mut state, &mut ws),
                    Some(AppEvent::Tick) => {
                        state.expire_notice(Instant::now());
                        KeyAction::Continue
                    }
                    Some(AppEvent::Notice(notice)) => {
                        state.push_notice(notice);
                        KeyAction::Continue
                    }
                    Some(AppEvent::Processing(stage)) => {
                        state.processing = Some(stage);
                        KeyAction::Continue
                    }
                    Some(AppEvent::ProcessingDone) => {
                        info!(run_id = %run_id, "processing complete");
                        state.processing = None;
                        state.mode = Mode::Normal;
                        state.push_notice(Notice::success(COMPLETION_MESSAGE));
                        KeyAction::Continue
                    }
                    Some(AppEvent::ExportDone { format, result }) => {
                        state.exporting = None;
                        match result {
                            Ok(path) => {
                                info!(path = %path.display(), %format, "report exported");
                                state.push_notice(Notice::success(format.success_message()));
                            }
                            Err(e) => {
                                warn!(error = %e, %format, "export failed");
                                state.push_notice(Notice::error(FAILURE_MESSAGE));
                            }
                        }
                        KeyAction::Continue
                    }
                    // ratatui picks up the new size from frame.area() on the next Render.
                    Some(AppEvent::Resize(_, _)) => KeyAction::Continue,
                    None => KeyAction::Quit,
                };

                match action {
                    KeyAction::Continue => {}
                    KeyAction::Quit => break 'event_loop,
                    KeyAction::Persist(mutation) => {
                        if let Err(e) = repository::persist(&repo, &run_id, &mutation).await {
                            error!(error = %e, "failed to save changes");
                            state.push_notice(Notice::error(format!("Failed to save changes: {e}")));
                        }
                    }
                    KeyAction::Export(format) => worker.send(WorkerRequest::Export {
                        format,
                        run_id: run_id.clone(),
                        results: ws.results().to_vec(),
                        dir: config.export_dir.clone(),
                    }),
                }

                // Also check after every event so quit latency is one event cycle.
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    // Cancels any pending processing stage before the terminal is released.
    drop(worker);
    tui::restore_tui()?;
    info!("session ended");
    Ok(())
}
