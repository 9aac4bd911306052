//! Keybinding dispatcher for conform.
//!
//! Translates raw crossterm `KeyEvent`s into `AppState` and `ReviewWorkspace`
//! changes and returns a `KeyAction` telling the event loop what to do next.
//! The dispatcher branches first on `state.mode` so every dialog has an
//! isolated handler function.

use conform_core::export::ExportFormat;
use conform_core::filter::cycle_option;
use conform_core::mentions;
use conform_core::notify::Notice;
use conform_core::status;
use conform_core::types::{ApprovalReason, OverallStatus};
use conform_core::workspace::{Mutation, ReviewWorkspace};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;

use crate::app::{
    ApproveDialog, ApproveField, AppState, AssignDialog, ComposeTarget, Draft, Mode, PanelFocus,
    StatusPicker,
};

/// Control-flow signal returned from the key dispatcher.
#[derive(Debug)]
pub enum KeyAction {
    /// Continue the event loop normally.
    Continue,
    /// Exit cleanly.
    Quit,
    /// The workspace changed; write these records through the repository.
    Persist(Mutation),
    /// Hand an export of the current run to the background worker.
    Export(ExportFormat),
}

/// Dispatches a key event to the handler matching the current mode.
pub fn handle_key(key: KeyEvent, state: &mut AppState, ws: &mut ReviewWorkspace) -> KeyAction {
    match state.mode {
        Mode::Normal => handle_normal(key, state, ws),
        Mode::Compose => handle_compose(key, state, ws),
        Mode::Search => handle_search(key, state, ws),
        Mode::StatusPicker => handle_status_picker(key, state, ws),
        Mode::Approve => handle_approve(key, state, ws),
        Mode::AssignReviewers => handle_assign(key, state, ws),
        Mode::Citations => handle_citations(key, state),
        Mode::ExportMenu => handle_export_menu(key, state),
        Mode::Processing => handle_processing(key),
        Mode::HelpOverlay => handle_help(key, state),
        Mode::ConfirmQuit => handle_confirm_quit(key, state),
    }
}

/// Turns the outcome of a workspace operation into a `KeyAction`.
///
/// Errors become error notices; the event loop keeps running. A change can
/// move items in or out of the filtered view, so the highlight and the
/// workspace focus are re-synced before persisting.
fn settle(state: &mut AppState, ws: &mut ReviewWorkspace, outcome: conform_core::Result<Mutation>) -> KeyAction {
    match outcome {
        Ok(mutation) if mutation.is_empty() => KeyAction::Continue,
        Ok(mutation) => {
            state.sync_focus(ws);
            KeyAction::Persist(mutation)
        }
        Err(e) => {
            state.push_notice(Notice::error(e.to_string()));
            KeyAction::Continue
        }
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState, ws: &mut ReviewWorkspace) -> KeyAction {
    if let Some(action) = handle_scroll_key(key, state, ws) {
        return action;
    }
    if let Some(action) = handle_filter_key(key, state, ws) {
        return action;
    }

    match key.code {
        KeyCode::Char('H') | KeyCode::BackTab => {
            state.focus = state.focus.prev();
        }
        KeyCode::Char('L') | KeyCode::Tab => {
            state.focus = state.focus.next();
        }

        // Selection
        KeyCode::Char(' ') => {
            if let Some(id) = state.selected_id(ws) {
                ws.toggle_select(&id);
            }
        }
        KeyCode::Char('a') => ws.toggle_select_all(),
        KeyCode::Char('x') => ws.clear_selection(),

        // Review actions on the focused item
        KeyCode::Char('s') => open_status_picker(state, ws),
        KeyCode::Char('A') => open_approve(state, ws),
        KeyCode::Char('B') => open_batch_approve(state, ws),
        KeyCode::Char('c') => start_comment(state, ws),
        KeyCode::Char('r') => start_reply(state, ws),
        KeyCode::Char('p') | KeyCode::Enter => open_citations(state, ws),

        KeyCode::Char('R') => {
            state.assign = Some(AssignDialog::default());
            state.mode = Mode::AssignReviewers;
        }
        KeyCode::Char('e') => {
            state.export_cursor = 0;
            state.mode = Mode::ExportMenu;
        }
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
        }
        KeyCode::Char('q') | KeyCode::Esc => {
            if state.has_unsaved_comment() {
                state.mode = Mode::ConfirmQuit;
            } else {
                return KeyAction::Quit;
            }
        }
        _ => {}
    }
    KeyAction::Continue
}

/// Handles j / k / g / G and the Ctrl half-page combos.
///
/// Returns `None` when the key should fall through to the rest of the Normal
/// handler.
fn handle_scroll_key(key: KeyEvent, state: &mut AppState, ws: &mut ReviewWorkspace) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('d') if ctrl => state.half_page_down(ws),
        KeyCode::Char('u') if ctrl => state.half_page_up(ws),
        KeyCode::Char('j') | KeyCode::Down => state.scroll_down(1, ws),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_up(1, ws),
        KeyCode::Char('g') | KeyCode::Home => state.scroll_top(ws),
        KeyCode::Char('G') | KeyCode::End => state.scroll_bottom(ws),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

/// Status toggles, division and system-type cycling, search, and reset.
fn handle_filter_key(key: KeyEvent, state: &mut AppState, ws: &mut ReviewWorkspace) -> Option<KeyAction> {
    match key.code {
        KeyCode::Char('1') => ws.filters_mut().toggle_status(OverallStatus::PreApproved),
        KeyCode::Char('2') => ws.filters_mut().toggle_status(OverallStatus::ReviewRequired),
        KeyCode::Char('3') => ws.filters_mut().toggle_status(OverallStatus::ActionMandatory),
        KeyCode::Char('d') => {
            let next = cycle_option(&ws.filters().division, &ws.divisions());
            ws.filters_mut().division = next;
        }
        KeyCode::Char('t') => {
            let next = cycle_option(&ws.filters().system_type, &ws.system_types());
            ws.filters_mut().system_type = next;
        }
        KeyCode::Char('0') => ws.filters_mut().clear(),
        KeyCode::Char('/') => {
            state.mode = Mode::Search;
            return Some(KeyAction::Continue);
        }
        _ => return None,
    }
    state.sync_focus(ws);
    Some(KeyAction::Continue)
}

fn open_status_picker(state: &mut AppState, ws: &ReviewWorkspace) {
    let Some(result) = ws.focused() else {
        return;
    };
    state.status_picker = Some(StatusPicker {
        item_id: result.id.clone(),
        current: result.overall_status,
        options: status::allowed_transitions(result.overall_status),
        cursor: 0,
    });
    state.mode = Mode::StatusPicker;
}

fn open_approve(state: &mut AppState, ws: &ReviewWorkspace) {
    let Some(result) = ws.focused() else {
        return;
    };
    if result.is_discrepancy_approved() {
        state.push_notice(Notice::info("Discrepancy already approved"));
        return;
    }
    if !result.overall_status.needs_review() {
        state.push_notice(Notice::warning("Only items needing review can be approved"));
        return;
    }
    state.approve = Some(ApproveDialog {
        item_id: Some(result.id.clone()),
        ..ApproveDialog::default()
    });
    state.mode = Mode::Approve;
}

fn open_batch_approve(state: &mut AppState, ws: &ReviewWorkspace) {
    if ws.selection().is_empty() {
        state.push_notice(Notice::warning("Select items to approve first"));
        return;
    }
    let batch_count = ws.batch_approvable_count();
    if batch_count == 0 {
        state.push_notice(Notice::info("No selected items need approval"));
        return;
    }
    state.approve = Some(ApproveDialog {
        item_id: None,
        batch_count,
        ..ApproveDialog::default()
    });
    state.mode = Mode::Approve;
}

/// Opens the composer for a new root comment, resuming an existing draft
/// for the same item.
fn start_comment(state: &mut AppState, ws: &ReviewWorkspace) {
    let Some(item_id) = ws.focused().map(|r| r.id.clone()) else {
        return;
    };
    let resumable = state
        .draft
        .as_ref()
        .is_some_and(|d| d.item_id == item_id && d.target == ComposeTarget::Comment);
    if !resumable {
        state.draft = Some(Draft { item_id, target: ComposeTarget::Comment, text: String::new() });
    }
    state.focus = PanelFocus::Comments;
    state.mode = Mode::Compose;
}

/// Opens the composer as a reply to the highlighted root comment.
fn start_reply(state: &mut AppState, ws: &ReviewWorkspace) {
    let Some(item_id) = ws.focused().map(|r| r.id.clone()) else {
        return;
    };
    let threads = ws.thread(&item_id);
    let Some(thread) = threads.get(state.comment_cursor) else {
        state.push_notice(Notice::info("No comment to reply to"));
        return;
    };
    if thread.root.is_system {
        state.push_notice(Notice::warning("System comments cannot be replied to"));
        return;
    }
    let target = ComposeTarget::Reply {
        parent_id: thread.root.id.clone(),
        author: thread.root.author_name.clone(),
    };
    state.draft = Some(Draft { item_id, target, text: String::new() });
    state.focus = PanelFocus::Comments;
    state.mode = Mode::Compose;
}

/// Opens the citation pager on the first cited page of the focused item.
fn open_citations(state: &mut AppState, ws: &ReviewWorkspace) {
    let Some(item_id) = ws.focused().map(|r| r.id.clone()) else {
        return;
    };
    let first_page = ws
        .citations(&item_id)
        .ok()
        .and_then(|c| c.iter().map(|c| c.page_number).min())
        .unwrap_or(1);
    match ws.open_citations(&item_id, first_page) {
        Ok(pager) => {
            state.pager = Some(pager);
            state.mode = Mode::Citations;
        }
        Err(e) => state.push_notice(Notice::error(e.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Compose mode
// ---------------------------------------------------------------------------

/// Edits the comment draft.
///
/// `Enter` sends, `Alt-Enter` inserts a newline, `Tab` completes a pending
/// `@mention`, and `Esc` leaves the draft in place and returns to Normal.
fn handle_compose(key: KeyEvent, state: &mut AppState, ws: &mut ReviewWorkspace) -> KeyAction {
    let Some(draft) = state.draft.as_mut() else {
        state.mode = Mode::Normal;
        return KeyAction::Continue;
    };
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::Esc => state.mode = Mode::Normal,
        KeyCode::Enter if alt => draft.text.push('\n'),
        KeyCode::Enter => return send_draft(state, ws),
        KeyCode::Tab => {
            if let Some(query) = mentions::mention_query(&draft.text) {
                if let Some(user) = mentions::suggestions(ws.directory(), &query).first() {
                    draft.text = mentions::complete_mention(&draft.text, user);
                }
            }
        }
        KeyCode::Char('u') if ctrl => draft.text.clear(),
        KeyCode::Backspace => {
            draft.text.pop();
        }
        KeyCode::Char(c) if !ctrl => draft.text.push(c),
        _ => {}
    }
    KeyAction::Continue
}

fn send_draft(state: &mut AppState, ws: &mut ReviewWorkspace) -> KeyAction {
    let Some(draft) = state.draft.as_ref() else {
        return KeyAction::Continue;
    };
    let parent = match &draft.target {
        ComposeTarget::Comment => None,
        ComposeTarget::Reply { parent_id, .. } => Some(parent_id.as_str()),
    };
    match ws.add_comment(&draft.item_id, &draft.text, parent) {
        Ok(mutation) => {
            state.draft = None;
            state.mode = Mode::Normal;
            KeyAction::Persist(mutation)
        }
        Err(e) => {
            state.push_notice(Notice::error(e.to_string()));
            KeyAction::Continue
        }
    }
}

// ---------------------------------------------------------------------------
// Search mode
// ---------------------------------------------------------------------------

/// Edits the free-text search; the item list re-filters on every keystroke.
///
/// `Enter` keeps the query, `Esc` clears it.
fn handle_search(key: KeyEvent, state: &mut AppState, ws: &mut ReviewWorkspace) -> KeyAction {
    match key.code {
        KeyCode::Enter => state.mode = Mode::Normal,
        KeyCode::Esc => {
            ws.filters_mut().search_query.clear();
            state.mode = Mode::Normal;
        }
        KeyCode::Backspace => {
            ws.filters_mut().search_query.pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            ws.filters_mut().search_query.push(c);
        }
        _ => return KeyAction::Continue,
    }
    state.sync_focus(ws);
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Dialogs
// ---------------------------------------------------------------------------

fn handle_status_picker(key: KeyEvent, state: &mut AppState, ws: &mut ReviewWorkspace) -> KeyAction {
    let Some(picker) = state.status_picker.as_mut() else {
        state.mode = Mode::Normal;
        return KeyAction::Continue;
    };
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            picker.cursor = (picker.cursor + 1).min(picker.options.len().saturating_sub(1));
        }
        KeyCode::Char('k') | KeyCode::Up => picker.cursor = picker.cursor.saturating_sub(1),
        KeyCode::Enter => {
            let Some(next) = picker.options.get(picker.cursor).copied() else {
                return KeyAction::Continue;
            };
            let (item_id, current) = (picker.item_id.clone(), picker.current);
            state.close_dialogs();
            let outcome = ws.change_status(&item_id, next, current);
            return settle(state, ws, outcome);
        }
        KeyCode::Esc | KeyCode::Char('q') => state.close_dialogs(),
        _ => {}
    }
    KeyAction::Continue
}

/// Approval dialog: `Tab` moves between the reason list and the comment
/// field, `Enter` on a reason picks it, `Enter` on the comment submits.
fn handle_approve(key: KeyEvent, state: &mut AppState, ws: &mut ReviewWorkspace) -> KeyAction {
    let Some(dialog) = state.approve.as_mut() else {
        state.mode = Mode::Normal;
        return KeyAction::Continue;
    };
    match (dialog.field, key.code) {
        (_, KeyCode::Esc) => state.close_dialogs(),
        (_, KeyCode::Tab | KeyCode::BackTab) => {
            dialog.field = match dialog.field {
                ApproveField::Reason => ApproveField::Comment,
                ApproveField::Comment => ApproveField::Reason,
            };
        }
        (ApproveField::Reason, KeyCode::Char('j') | KeyCode::Down) => {
            dialog.cursor = (dialog.cursor + 1).min(ApprovalReason::ALL.len() - 1);
        }
        (ApproveField::Reason, KeyCode::Char('k') | KeyCode::Up) => {
            dialog.cursor = dialog.cursor.saturating_sub(1);
        }
        (ApproveField::Reason, KeyCode::Char(' ') | KeyCode::Enter) => {
            dialog.reason = ApprovalReason::ALL.get(dialog.cursor).copied();
            dialog.error = None;
            dialog.field = ApproveField::Comment;
        }
        (ApproveField::Comment, KeyCode::Enter) => return submit_approval(state, ws),
        (ApproveField::Comment, KeyCode::Backspace) => {
            dialog.comment.pop();
        }
        (ApproveField::Comment, KeyCode::Char(c)) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            dialog.comment.push(c);
        }
        _ => {}
    }
    KeyAction::Continue
}

fn submit_approval(state: &mut AppState, ws: &mut ReviewWorkspace) -> KeyAction {
    let Some(dialog) = state.approve.as_mut() else {
        return KeyAction::Continue;
    };
    // Same message the reason parser reports for a missing value.
    let Some(reason) = dialog.reason else {
        dialog.error = Some("Please select a reason for approval".to_owned());
        dialog.field = ApproveField::Reason;
        return KeyAction::Continue;
    };
    let comment = std::mem::take(&mut dialog.comment);
    let item_id = dialog.item_id.clone();
    state.close_dialogs();

    let outcome = match item_id {
        Some(id) => ws.approve(&id, reason, &comment),
        None => ws.batch_approve(reason, &comment),
    };
    settle(state, ws, outcome)
}

/// Reviewer assignment dialog.
///
/// Typing filters the available users; `Up`/`Down` move; `Enter` ticks a user
/// (or removes the highlighted reviewer on the assigned side); `Tab` switches
/// sides; `Ctrl-s` assigns every ticked user.
fn handle_assign(key: KeyEvent, state: &mut AppState, ws: &mut ReviewWorkspace) -> KeyAction {
    let Some(dialog) = state.assign.as_mut() else {
        state.mode = Mode::Normal;
        return KeyAction::Continue;
    };
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let len = if dialog.on_assigned {
        ws.reviewers().len()
    } else {
        ws.available_reviewers(&dialog.query).len()
    };

    match key.code {
        KeyCode::Esc => state.close_dialogs(),
        KeyCode::Tab | KeyCode::BackTab => {
            dialog.on_assigned = !dialog.on_assigned;
            dialog.cursor = 0;
        }
        KeyCode::Down => dialog.cursor = (dialog.cursor + 1).min(len.saturating_sub(1)),
        KeyCode::Up => dialog.cursor = dialog.cursor.saturating_sub(1),
        KeyCode::Char('s') if ctrl => {
            let picked = std::mem::take(&mut dialog.picked);
            if picked.is_empty() {
                return KeyAction::Continue;
            }
            state.close_dialogs();
            let outcome = ws.assign_reviewers(&picked);
            return settle(state, ws, outcome);
        }
        KeyCode::Enter if dialog.on_assigned => {
            let Some(id) = ws.reviewers().get(dialog.cursor).map(|r| r.id.clone()) else {
                return KeyAction::Continue;
            };
            dialog.cursor = dialog.cursor.min(len.saturating_sub(2));
            let outcome = ws.remove_reviewer(&id);
            return settle(state, ws, outcome);
        }
        KeyCode::Enter => {
            let available = ws.available_reviewers(&dialog.query);
            if let Some(user) = available.get(dialog.cursor) {
                match dialog.picked.iter().position(|id| id == &user.id) {
                    Some(pos) => {
                        dialog.picked.remove(pos);
                    }
                    None => dialog.picked.push(user.id.clone()),
                }
            }
        }
        KeyCode::Backspace if !dialog.on_assigned => {
            dialog.query.pop();
            dialog.cursor = 0;
        }
        KeyCode::Char(c) if !dialog.on_assigned && !ctrl => {
            dialog.query.push(c);
            dialog.cursor = 0;
        }
        _ => {}
    }
    KeyAction::Continue
}

/// Citation pager: `h`/`l` page by page, `n`/`N` jump between cited pages.
fn handle_citations(key: KeyEvent, state: &mut AppState) -> KeyAction {
    let Some(pager) = state.pager.as_mut() else {
        state.mode = Mode::Normal;
        return KeyAction::Continue;
    };
    match key.code {
        KeyCode::Char('l') | KeyCode::Right => pager.next_page(),
        KeyCode::Char('h') | KeyCode::Left => pager.prev_page(),
        KeyCode::Char('n') => pager.next_cited(),
        KeyCode::Char('N') => pager.prev_cited(),
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('p') => state.close_dialogs(),
        _ => {}
    }
    KeyAction::Continue
}

fn handle_export_menu(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            state.export_cursor = (state.export_cursor + 1).min(ExportFormat::ALL.len() - 1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.export_cursor = state.export_cursor.saturating_sub(1);
        }
        KeyCode::Enter => {
            state.mode = Mode::Normal;
            if state.exporting.is_some() {
                state.push_notice(Notice::info("An export is already running"));
                return KeyAction::Continue;
            }
            if let Some(format) = ExportFormat::ALL.get(state.export_cursor).copied() {
                state.exporting = Some(format);
                return KeyAction::Export(format);
            }
        }
        KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

/// While the analysis runs only quitting is possible.
fn handle_processing(key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char('q') => KeyAction::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        _ => KeyAction::Continue,
    }
}

// ---------------------------------------------------------------------------
// HelpOverlay / ConfirmQuit
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            state.help_scroll = state.help_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.help_scroll = state.help_scroll.saturating_sub(1);
        }
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('G') => state.help_scroll = u16::MAX,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

/// `y` quits and drops the draft; `n` or `Esc` goes back.
fn handle_confirm_quit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => KeyAction::Quit,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Handles a mouse event: click-to-focus and scroll-wheel.
///
/// The wheel scrolls the focused panel by 3 lines, or the help overlay when it
/// is open. Other dialogs ignore the mouse.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState, ws: &mut ReviewWorkspace) -> KeyAction {
    match (state.mode, mouse.kind) {
        (Mode::HelpOverlay, MouseEventKind::ScrollUp) => {
            state.help_scroll = state.help_scroll.saturating_sub(3);
        }
        (Mode::HelpOverlay, MouseEventKind::ScrollDown) => {
            state.help_scroll = state.help_scroll.saturating_add(3);
        }
        (Mode::Normal, MouseEventKind::Down(MouseButton::Left)) => {
            handle_mouse_click(mouse.column, mouse.row, state, ws);
        }
        (Mode::Normal, MouseEventKind::ScrollUp) => state.scroll_up(3, ws),
        (Mode::Normal, MouseEventKind::ScrollDown) => state.scroll_down(3, ws),
        _ => {}
    }
    KeyAction::Continue
}

/// Sets panel focus from the clicked position; a click on an item row also
/// selects that item.
fn handle_mouse_click(col: u16, row: u16, state: &mut AppState, ws: &mut ReviewWorkspace) {
    let pos = Position { x: col, y: row };
    let [items, details, comments] = state.panel_rects;

    if items.contains(pos) {
        state.focus = PanelFocus::Items;
        // One border row above the list.
        let offset = row.saturating_sub(items.y + 1) as usize;
        let index = state.items.offset() + offset;
        if row > items.y && index < ws.filtered().len() {
            state.items.select(Some(index));
            state.sync_focus(ws);
        }
    } else if details.contains(pos) {
        state.focus = PanelFocus::Details;
    } else if comments.contains(pos) {
        state.focus = PanelFocus::Comments;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conform_core::notify::NullNotifier;
    use conform_core::seed;
    use conform_core::session::Session;

    fn setup() -> (AppState, ReviewWorkspace) {
        let users = seed::demo_users();
        let session = Session::new(users[1].clone());
        let mut ws = ReviewWorkspace::new(
            seed::demo_run(),
            seed::demo_results(),
            users,
            session,
            Box::new(NullNotifier),
        );
        let mut state = AppState::default();
        state.sync_focus(&mut ws);
        (state, ws)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(text: &str, state: &mut AppState, ws: &mut ReviewWorkspace) {
        for c in text.chars() {
            handle_key(press(KeyCode::Char(c)), state, ws);
        }
    }

    #[test]
    fn status_picker_changes_the_focused_item() {
        let (mut state, mut ws) = setup();
        handle_key(press(KeyCode::Char('s')), &mut state, &mut ws);
        assert_eq!(state.mode, Mode::StatusPicker);

        // Pre-Approved offers Review Required first.
        let action = handle_key(press(KeyCode::Enter), &mut state, &mut ws);
        assert!(matches!(action, KeyAction::Persist(ref m) if m.results.len() == 1));
        assert_eq!(state.mode, Mode::Normal);
        assert_eq!(
            ws.result("result-1").map(|r| r.overall_status),
            Some(OverallStatus::ReviewRequired)
        );
    }

    #[test]
    fn approval_requires_a_reason() {
        let (mut state, mut ws) = setup();
        for _ in 0..4 {
            handle_key(press(KeyCode::Char('j')), &mut state, &mut ws);
        }
        assert_eq!(ws.focused().map(|r| r.id.as_str()), Some("result-5"));

        handle_key(press(KeyCode::Char('A')), &mut state, &mut ws);
        handle_key(press(KeyCode::Tab), &mut state, &mut ws);
        handle_key(press(KeyCode::Enter), &mut state, &mut ws);
        let error = state.approve.as_ref().and_then(|d| d.error.clone());
        assert_eq!(error.as_deref(), Some("Please select a reason for approval"));
        assert_eq!(state.mode, Mode::Approve);

        handle_key(press(KeyCode::Enter), &mut state, &mut ws);
        type_text("matches basis of design", &mut state, &mut ws);
        let action = handle_key(press(KeyCode::Enter), &mut state, &mut ws);
        assert!(matches!(action, KeyAction::Persist(_)));
        let discrepancy = ws.result("result-5").and_then(|r| r.discrepancy.clone()).unwrap();
        assert_eq!(discrepancy.reason, Some(ApprovalReason::Equivalent));
        assert_eq!(discrepancy.comment.as_deref(), Some("matches basis of design"));
    }

    #[test]
    fn pre_approved_items_cannot_be_approved() {
        let (mut state, mut ws) = setup();
        handle_key(press(KeyCode::Char('A')), &mut state, &mut ws);
        assert_eq!(state.mode, Mode::Normal);
        assert!(state.notice.is_some());
    }

    #[test]
    fn comments_are_sent_and_drafts_guard_quit() {
        let (mut state, mut ws) = setup();
        handle_key(press(KeyCode::Char('c')), &mut state, &mut ws);
        type_text("Checked against @Mi", &mut state, &mut ws);
        handle_key(press(KeyCode::Tab), &mut state, &mut ws);
        assert_eq!(
            state.draft.as_ref().map(|d| d.text.as_str()),
            Some("Checked against @Mike Johnson ")
        );

        handle_key(press(KeyCode::Esc), &mut state, &mut ws);
        assert!(matches!(handle_key(press(KeyCode::Char('q')), &mut state, &mut ws), KeyAction::Continue));
        assert_eq!(state.mode, Mode::ConfirmQuit);
        handle_key(press(KeyCode::Char('n')), &mut state, &mut ws);

        handle_key(press(KeyCode::Char('c')), &mut state, &mut ws);
        let action = handle_key(press(KeyCode::Enter), &mut state, &mut ws);
        match action {
            KeyAction::Persist(m) => assert_eq!(m.comments[0].1.mentions, vec!["user-3".to_owned()]),
            other => panic!("unexpected action: {other:?}"),
        }
        assert!(state.draft.is_none());
        assert!(matches!(handle_key(press(KeyCode::Char('q')), &mut state, &mut ws), KeyAction::Quit));
    }

    #[test]
    fn replies_to_system_comments_are_refused() {
        let (mut state, mut ws) = setup();
        handle_key(press(KeyCode::Char('s')), &mut state, &mut ws);
        handle_key(press(KeyCode::Enter), &mut state, &mut ws);
        handle_key(press(KeyCode::Char('r')), &mut state, &mut ws);
        assert_eq!(state.mode, Mode::Normal);
        assert!(state.draft.is_none());
    }

    #[test]
    fn filters_and_batch_approval() {
        let (mut state, mut ws) = setup();
        handle_key(press(KeyCode::Char('2')), &mut state, &mut ws);
        handle_key(press(KeyCode::Char('3')), &mut state, &mut ws);
        assert_eq!(ws.filtered().len(), 4);
        assert_eq!(ws.focused().map(|r| r.id.as_str()), Some("result-3"));

        handle_key(press(KeyCode::Char('a')), &mut state, &mut ws);
        handle_key(press(KeyCode::Char('B')), &mut state, &mut ws);
        assert_eq!(state.approve.as_ref().map(|d| d.batch_count), Some(4));

        handle_key(press(KeyCode::Char('j')), &mut state, &mut ws);
        handle_key(press(KeyCode::Enter), &mut state, &mut ws);
        let action = handle_key(press(KeyCode::Enter), &mut state, &mut ws);
        assert!(matches!(action, KeyAction::Persist(ref m) if m.results.len() == 4));
        assert!(ws.selection().is_empty());

        handle_key(press(KeyCode::Char('0')), &mut state, &mut ws);
        assert_eq!(ws.filtered().len(), 10);
    }

    #[test]
    fn status_change_out_of_the_view_moves_focus_with_the_highlight() {
        let (mut state, mut ws) = setup();
        handle_key(press(KeyCode::Char('2')), &mut state, &mut ws);
        assert_eq!(ws.focused().map(|r| r.id.as_str()), Some("result-3"));

        handle_key(press(KeyCode::Char('s')), &mut state, &mut ws);
        let action = handle_key(press(KeyCode::Enter), &mut state, &mut ws);
        assert!(matches!(action, KeyAction::Persist(_)));
        assert!(ws.filtered().iter().all(|r| r.id != "result-3"));

        let highlighted = state.selected_id(&ws);
        assert!(highlighted.is_some());
        assert_eq!(highlighted.as_deref(), ws.focused().map(|r| r.id.as_str()));

        handle_key(press(KeyCode::Char('s')), &mut state, &mut ws);
        let target = state.status_picker.as_ref().map(|p| p.item_id.clone());
        assert_eq!(target, highlighted);
    }

    #[test]
    fn empty_view_clears_the_focus() {
        let (mut state, mut ws) = setup();
        handle_key(press(KeyCode::Char('/')), &mut state, &mut ws);
        type_text("no such material", &mut state, &mut ws);
        handle_key(press(KeyCode::Enter), &mut state, &mut ws);
        assert!(ws.filtered().is_empty());
        assert!(ws.focused().is_none());

        handle_key(press(KeyCode::Char('s')), &mut state, &mut ws);
        handle_key(press(KeyCode::Char('c')), &mut state, &mut ws);
        assert_eq!(state.mode, Mode::Normal);
        assert!(state.status_picker.is_none());
        assert!(state.draft.is_none());
    }

    #[test]
    fn batch_approval_needs_an_eligible_selection() {
        let (mut state, mut ws) = setup();
        handle_key(press(KeyCode::Char(' ')), &mut state, &mut ws);
        assert_eq!(ws.selection().len(), 1);

        handle_key(press(KeyCode::Char('B')), &mut state, &mut ws);
        assert_eq!(state.mode, Mode::Normal);
        assert!(state.approve.is_none());
        assert_eq!(ws.selection().len(), 1);
        assert!(state.notice.is_some());
    }

    #[test]
    fn approval_comment_ignores_control_keys() {
        let (mut state, mut ws) = setup();
        for _ in 0..4 {
            handle_key(press(KeyCode::Char('j')), &mut state, &mut ws);
        }
        handle_key(press(KeyCode::Char('A')), &mut state, &mut ws);
        handle_key(press(KeyCode::Tab), &mut state, &mut ws);
        type_text("ok", &mut state, &mut ws);
        handle_key(KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL), &mut state, &mut ws);
        assert_eq!(state.approve.as_ref().map(|d| d.comment.as_str()), Some("ok"));
    }

    #[test]
    fn search_narrows_and_escape_clears() {
        let (mut state, mut ws) = setup();
        handle_key(press(KeyCode::Char('/')), &mut state, &mut ws);
        type_text("fire", &mut state, &mut ws);
        assert_eq!(ws.filtered().len(), 2);
        handle_key(press(KeyCode::Esc), &mut state, &mut ws);
        assert!(ws.filters().search_query.is_empty());
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn reviewers_are_picked_and_assigned() {
        let (mut state, mut ws) = setup();
        handle_key(press(KeyCode::Char('R')), &mut state, &mut ws);
        type_text("mike", &mut state, &mut ws);
        handle_key(press(KeyCode::Enter), &mut state, &mut ws);
        let save = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        let action = handle_key(save, &mut state, &mut ws);
        assert!(matches!(action, KeyAction::Persist(ref m) if m.reviewers.is_some()));
        assert_eq!(ws.reviewers().len(), 1);
        assert_eq!(ws.reviewers()[0].id, "user-3");
    }

    #[test]
    fn export_menu_hands_off_the_format() {
        let (mut state, mut ws) = setup();
        handle_key(press(KeyCode::Char('e')), &mut state, &mut ws);
        let action = handle_key(press(KeyCode::Enter), &mut state, &mut ws);
        assert!(matches!(action, KeyAction::Export(ExportFormat::Csv)));
        assert_eq!(state.exporting, Some(ExportFormat::Csv));
    }
}
