//! UI rendering module for conform.
//!
//! `render()` is the single entry point called by the event loop's
//! `terminal.draw()` closure. Layout arithmetic and the header and status bars
//! live in `layout.rs`; each panel and every modal dialog has its own module.

mod comments;
mod details;
mod dialogs;
mod items;
mod layout;
pub mod help;
pub mod keybindings;

use chrono::DateTime;
use conform_core::workspace::ReviewWorkspace;
use ratatui::{Frame, style::Style, widgets::Block};

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use layout::{compute_layout, inner_rect, render_header, render_status_bar};

/// Renders one complete frame: header, three panels, status bar, and any open dialog.
///
/// Viewport heights and panel rects are written back into `state` so the next
/// keypress can compute page distances and mouse hit-tests.
pub fn render(frame: &mut Frame, state: &mut AppState, ws: &ReviewWorkspace, theme: &Theme) {
    let [header, items_area, details_area, comments_area, status_bar] = compute_layout(frame, state);

    state.items_viewport_height = inner_rect(items_area).height;
    state.details_viewport_height = inner_rect(details_area).height;
    state.comments_viewport_height = inner_rect(comments_area).height;
    state.panel_rects = [items_area, details_area, comments_area];

    frame.render_widget(Block::new().style(Style::default().bg(theme.background)), frame.area());
    render_header(frame, header, ws, theme);
    if items_area.width > 0 {
        items::render_items(frame, items_area, state, ws, theme);
    }
    if details_area.width > 0 {
        details::render_details(frame, details_area, state, ws, theme);
    }
    if comments_area.width > 0 {
        comments::render_comments(frame, comments_area, state, ws, theme);
    }
    render_status_bar(frame, status_bar, state, ws, theme);

    // Modals draw last so they sit on top of the panels.
    match state.mode {
        Mode::StatusPicker => dialogs::render_status_picker(frame, state, theme),
        Mode::Approve => dialogs::render_approve(frame, state, ws, theme),
        Mode::AssignReviewers => dialogs::render_assign(frame, state, ws, theme),
        Mode::Citations => dialogs::render_citations(frame, state, ws, theme),
        Mode::ExportMenu => dialogs::render_export_menu(frame, state, theme),
        Mode::Processing => dialogs::render_processing(frame, state, ws, theme),
        Mode::ConfirmQuit => dialogs::render_confirm_quit(frame, theme),
        Mode::HelpOverlay => help::render_help_overlay(frame, theme, state.help_scroll),
        Mode::Normal | Mode::Compose | Mode::Search => {}
    }
}

/// `"Jan 26, 2024 10:30"` in UTC.
pub(crate) fn format_timestamp(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.format("%b %-d, %Y %H:%M").to_string())
        .unwrap_or_else(|| secs.to_string())
}
