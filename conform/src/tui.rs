//! Terminal lifecycle management for conform.
//!
//! **Why stdout?**
//! conform has no second process sharing the terminal, and `--list` already
//! prints plain rows to stdout before any of this runs. The review UI takes
//! over the same stream once raw mode is on. From then on the only other
//! writer is tracing, which `main.rs` points at `conform.log` next to the
//! database, so log lines never land on top of the panels.
//!
//! Ordering matters: [`install_panic_hook`] and [`register_sigterm`] run before
//! [`init_tui`], and [`restore_tui`] runs exactly once after the event loop
//! exits, after the background worker has been dropped.

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, size, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use signal_hook::consts::SIGTERM;
use signal_hook::flag::register;
use std::io::{stdout, BufWriter, Stdout};
use std::panic;
use std::sync::{atomic::AtomicBool, Arc};
use tracing::{debug, error};

/// The terminal conform draws the review panels on.
///
/// `BufWriter` batches escape sequences into fewer write(2) syscalls. A full
/// redraw of the items list, details pane and comment threads is one flush.
pub type Tui = Terminal<CrosstermBackend<BufWriter<Stdout>>>;

/// Switches the terminal into review mode.
///
/// Enables raw mode, enters the alternate screen, and turns on mouse capture
/// so panel clicks and wheel scrolling reach `handle_mouse`. Call
/// [`restore_tui`] on every exit path.
///
/// # Errors
///
/// Returns `Err` if `enable_raw_mode`, `execute!`, or `Terminal::new` fails.
pub fn init_tui() -> std::io::Result<Tui> {
    let mut out = BufWriter::new(stdout());
    enable_raw_mode()?;
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    if let Ok((cols, rows)) = size() {
        debug!(cols, rows, "terminal initialised");
    }
    Terminal::new(CrosstermBackend::new(out))
}

/// Puts the terminal back the way the shell left it.
///
/// Disables raw mode, leaves the alternate screen, and releases mouse
/// capture. Safe to call more than once: the panic hook may run it after the
/// normal exit path already has. ratatui 0.30 does not restore anything on
/// `Drop`, so nothing else will.
///
/// # Errors
///
/// Returns `Err` if `disable_raw_mode` or `execute!` fails. The panic hook
/// ignores the error; there is nothing better to do at that point.
pub fn restore_tui() -> std::io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    debug!("terminal restored");
    Ok(())
}

/// Installs a panic hook that restores the terminal and records the panic.
///
/// Must be called **before** [`init_tui`]. The panic goes to `conform.log`
/// first, next to the session's saved-change records. The previous hook still
/// runs afterwards, so the usual message reaches the restored screen instead
/// of vanishing into the alternate buffer.
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        error!(panic = %panic_info, "conform panicked");
        let _ = restore_tui();
        original_hook(panic_info);
    }));
}

/// Registers a SIGTERM handler that flips an `AtomicBool`.
///
/// The event loop polls the flag on its 50ms heartbeat and after every event,
/// then leaves through the same path as `q`: the worker is dropped (cancelling
/// any simulated processing) and the terminal restored. Comment drafts are not
/// saved on SIGTERM; only mutations already persisted survive.
///
/// # Errors
///
/// Returns `Err` if the OS refuses to register the handler. `main` treats that
/// as a startup failure before the terminal is touched.
pub fn register_sigterm() -> std::io::Result<Arc<AtomicBool>> {
    let term = Arc::new(AtomicBool::new(false));
    // The handler only performs an atomic store, which is async-signal-safe.
    register(SIGTERM, Arc::clone(&term))?;
    Ok(term)
}
