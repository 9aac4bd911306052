//! Central application state for conform.
//!
//! This module owns all mutable UI state: the current mode, which panel has focus,
//! list selection, per-panel scroll offsets, open dialogs, the comment draft,
//! and the latest notice. Review data itself lives in
//! [`conform_core::workspace::ReviewWorkspace`]; `AppState` only remembers
//! where the user is looking. No ratatui rendering logic lives here.

use std::time::{Duration, Instant};

use conform_core::citation::CitationPager;
use conform_core::export::ExportFormat;
use conform_core::notify::Notice;
use conform_core::processing::ProcessingStage;
use conform_core::types::{ApprovalReason, OverallStatus};
use conform_core::workspace::ReviewWorkspace;
use ratatui::layout::Rect;
use ratatui::widgets::ListState;

/// How long a notice stays in the status bar.
pub const NOTICE_TTL: Duration = Duration::from_secs(4);

/// Input mode controlling which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Navigation and single-key commands (default).
    #[default]
    Normal,
    /// Typing a comment or reply.
    Compose,
    /// Typing the free-text search filter.
    Search,
    StatusPicker,
    /// Discrepancy approval dialog, single item or batch.
    Approve,
    AssignReviewers,
    /// Page-by-page citation viewer for the focused item.
    Citations,
    ExportMenu,
    /// Simulated analysis in progress; the workspace is read-only.
    Processing,
    HelpOverlay,
    /// Quit-confirmation dialog shown when a comment draft exists.
    ConfirmQuit,
}

/// Which panel currently has keyboard focus.
///
/// Cycle order: `Items` → `Details` → `Comments` → `Items`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    #[default]
    Items,
    Details,
    Comments,
}

impl PanelFocus {
    pub fn prev(self) -> Self {
        match self {
            PanelFocus::Items => PanelFocus::Comments,
            PanelFocus::Details => PanelFocus::Items,
            PanelFocus::Comments => PanelFocus::Details,
        }
    }

    pub fn next(self) -> Self {
        match self {
            PanelFocus::Items => PanelFocus::Details,
            PanelFocus::Details => PanelFocus::Comments,
            PanelFocus::Comments => PanelFocus::Items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeTarget {
    Comment,
    Reply { parent_id: String, author: String },
}

/// The comment being typed. Kept across mode switches until sent.
#[derive(Debug, Clone)]
pub struct Draft {
    pub item_id: String,
    pub target: ComposeTarget,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct StatusPicker {
    pub item_id: String,
    pub current: OverallStatus,
    pub options: &'static [OverallStatus],
    pub cursor: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ApproveField {
    #[default]
    Reason,
    Comment,
}

#[derive(Debug, Clone, Default)]
pub struct ApproveDialog {
    /// `None` approves every eligible selected item.
    pub item_id: Option<String>,
    /// Number of items a batch approval will touch.
    pub batch_count: usize,
    /// Chosen reason; `None` until the user picks one.
    pub reason: Option<ApprovalReason>,
    pub cursor: usize,
    pub comment: String,
    pub field: ApproveField,
    /// Inline validation message.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AssignDialog {
    pub query: String,
    pub cursor: usize,
    /// User ids ticked for assignment.
    pub picked: Vec<String>,
    /// True while the cursor is on the assigned-reviewers list.
    pub on_assigned: bool,
}

/// All mutable UI state passed through every render cycle.
pub struct AppState {
    pub mode: Mode,
    pub focus: PanelFocus,

    /// Selection over the filtered item list.
    pub items: ListState,
    pub details_scroll: u16,
    pub comments_scroll: u16,
    /// Index of the highlighted root comment in the focused item's threads.
    pub comment_cursor: usize,

    /// Inner heights cached after each render for page scrolling.
    pub items_viewport_height: u16,
    pub details_viewport_height: u16,
    pub comments_viewport_height: u16,
    /// Outer rects of the three panels, cached for click-to-focus.
    pub panel_rects: [Rect; 3],

    pub draft: Option<Draft>,
    pub status_picker: Option<StatusPicker>,
    pub approve: Option<ApproveDialog>,
    pub assign: Option<AssignDialog>,
    pub pager: Option<CitationPager>,
    pub export_cursor: usize,
    /// Format of the export currently running on the worker.
    pub exporting: Option<ExportFormat>,

    pub notice: Option<(Notice, Instant)>,
    pub processing: Option<ProcessingStage>,
    pub help_scroll: u16,
}

impl Default for AppState {
    fn default() -> Self {
        let mut items = ListState::default();
        items.select(Some(0));
        Self {
            mode: Mode::default(),
            focus: PanelFocus::default(),
            items,
            details_scroll: 0,
            comments_scroll: 0,
            comment_cursor: 0,
            items_viewport_height: 0,
            details_viewport_height: 0,
            comments_viewport_height: 0,
            panel_rects: [Rect::default(); 3],
            draft: None,
            status_picker: None,
            approve: None,
            assign: None,
            pager: None,
            export_cursor: 0,
            exporting: None,
            notice: None,
            processing: None,
            help_scroll: 0,
        }
    }
}

impl AppState {
    /// True when a non-blank comment draft would be lost on quit.
    pub fn has_unsaved_comment(&self) -> bool {
        self.draft.as_ref().is_some_and(|d| !d.text.trim().is_empty())
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notice = Some((notice, Instant::now()));
    }

    /// Drops the notice once it has been shown for [`NOTICE_TTL`].
    pub fn expire_notice(&mut self, now: Instant) {
        if self
            .notice
            .as_ref()
            .is_some_and(|(_, shown)| now.duration_since(*shown) >= NOTICE_TTL)
        {
            self.notice = None;
        }
    }

    /// Id of the highlighted item in the filtered list.
    pub fn selected_id(&self, ws: &ReviewWorkspace) -> Option<String> {
        let index = self.items.selected()?;
        ws.filtered().get(index).map(|r| r.id.clone())
    }

    /// Clamps the list selection to the filtered view and focuses that item
    /// in the workspace. Resets per-item scroll when the item changes.
    pub fn sync_focus(&mut self, ws: &mut ReviewWorkspace) {
        let len = ws.filtered().len();
        if len == 0 {
            self.items.select(None);
            if ws.focused().is_some() {
                ws.clear_focus();
                self.details_scroll = 0;
                self.comments_scroll = 0;
                self.comment_cursor = 0;
            }
            return;
        }
        let index = self.items.selected().unwrap_or(0).min(len - 1);
        self.items.select(Some(index));

        let Some(id) = self.selected_id(ws) else {
            return;
        };
        let changed = ws.focused().map(|r| r.id.as_str()) != Some(id.as_str());
        if changed && ws.focus(&id).is_ok() {
            self.details_scroll = 0;
            self.comments_scroll = 0;
            self.comment_cursor = 0;
        }
    }

    /// Moves the focused panel down by `lines` rows.
    pub fn scroll_down(&mut self, lines: u16, ws: &mut ReviewWorkspace) {
        match self.focus {
            PanelFocus::Items => {
                self.items.scroll_down_by(lines);
                self.sync_focus(ws);
            }
            PanelFocus::Details => {
                self.details_scroll = self.details_scroll.saturating_add(lines);
            }
            PanelFocus::Comments => {
                let roots = self.focused_root_count(ws);
                self.comment_cursor = (self.comment_cursor + lines as usize).min(roots.saturating_sub(1));
                self.comments_scroll = self.comments_scroll.saturating_add(lines);
            }
        }
    }

    /// Moves the focused panel up by `lines` rows.
    pub fn scroll_up(&mut self, lines: u16, ws: &mut ReviewWorkspace) {
        match self.focus {
            PanelFocus::Items => {
                self.items.scroll_up_by(lines);
                self.sync_focus(ws);
            }
            PanelFocus::Details => {
                self.details_scroll = self.details_scroll.saturating_sub(lines);
            }
            PanelFocus::Comments => {
                self.comment_cursor = self.comment_cursor.saturating_sub(lines as usize);
                self.comments_scroll = self.comments_scroll.saturating_sub(lines);
            }
        }
    }

    pub fn scroll_top(&mut self, ws: &mut ReviewWorkspace) {
        match self.focus {
            PanelFocus::Items => {
                self.items.select_first();
                self.sync_focus(ws);
            }
            PanelFocus::Details => self.details_scroll = 0,
            PanelFocus::Comments => {
                self.comment_cursor = 0;
                self.comments_scroll = 0;
            }
        }
    }

    pub fn scroll_bottom(&mut self, ws: &mut ReviewWorkspace) {
        match self.focus {
            PanelFocus::Items => {
                self.items.select_last();
                self.sync_focus(ws);
            }
            PanelFocus::Details => self.details_scroll = u16::MAX,
            PanelFocus::Comments => {
                self.comment_cursor = self.focused_root_count(ws).saturating_sub(1);
                self.comments_scroll = u16::MAX;
            }
        }
    }

    /// Scrolls the focused panel by half its visible height.
    ///
    /// Uses the viewport height cached from the previous render; scrolls by 1
    /// on the first frame.
    pub fn half_page_down(&mut self, ws: &mut ReviewWorkspace) {
        let half = self.viewport_height() / 2;
        self.scroll_down(half.max(1), ws);
    }

    pub fn half_page_up(&mut self, ws: &mut ReviewWorkspace) {
        let half = self.viewport_height() / 2;
        self.scroll_up(half.max(1), ws);
    }

    fn viewport_height(&self) -> u16 {
        match self.focus {
            PanelFocus::Items => self.items_viewport_height,
            PanelFocus::Details => self.details_viewport_height,
            PanelFocus::Comments => self.comments_viewport_height,
        }
    }

    fn focused_root_count(&self, ws: &ReviewWorkspace) -> usize {
        ws.focused().map(|r| ws.thread(&r.id).len()).unwrap_or(0)
    }

    /// Closes every dialog and returns to Normal mode. The draft is kept.
    pub fn close_dialogs(&mut self) {
        self.status_picker = None;
        self.approve = None;
        self.assign = None;
        self.pager = None;
        self.mode = Mode::Normal;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conform_core::filter::ConformanceFilters;
    use conform_core::notify::NullNotifier;
    use conform_core::seed;
    use conform_core::session::Session;

    fn workspace() -> ReviewWorkspace {
        let users = seed::demo_users();
        let session = Session::new(users[0].clone());
        ReviewWorkspace::new(seed::demo_run(), seed::demo_results(), users, session, Box::new(NullNotifier))
    }

    #[test]
    fn focus_cycles_both_ways() {
        assert_eq!(PanelFocus::Items.next().next().next(), PanelFocus::Items);
        assert_eq!(PanelFocus::Items.prev(), PanelFocus::Comments);
    }

    #[test]
    fn selection_follows_the_filtered_view() {
        let mut ws = workspace();
        let mut state = AppState::default();
        state.sync_focus(&mut ws);
        assert_eq!(ws.focused().map(|r| r.id.as_str()), Some("result-1"));

        state.scroll_down(9, &mut ws);
        assert_eq!(state.selected_id(&ws).as_deref(), Some("result-10"));

        *ws.filters_mut() = ConformanceFilters {
            status: vec![OverallStatus::ActionMandatory],
            ..ConformanceFilters::default()
        };
        state.sync_focus(&mut ws);
        assert_eq!(state.items.selected(), Some(0));
        assert_eq!(ws.focused().map(|r| r.id.as_str()), Some("result-5"));

        ws.filters_mut().search_query = "no such material".into();
        state.sync_focus(&mut ws);
        assert_eq!(state.items.selected(), None);
    }

    #[test]
    fn notices_expire() {
        let mut state = AppState::default();
        state.push_notice(Notice::info("hello"));
        let shown = state.notice.as_ref().map(|(_, at)| *at).unwrap();
        state.expire_notice(shown + Duration::from_secs(1));
        assert!(state.notice.is_some());
        state.expire_notice(shown + NOTICE_TTL);
        assert!(state.notice.is_none());
    }

    #[test]
    fn blank_draft_is_not_unsaved() {
        let mut state = AppState::default();
        assert!(!state.has_unsaved_comment());
        state.draft = Some(Draft {
            item_id: "result-1".into(),
            target: ComposeTarget::Comment,
            text: "  ".into(),
        });
        assert!(!state.has_unsaved_comment());
        if let Some(d) = state.draft.as_mut() {
            d.text.push_str("ok");
        }
        assert!(state.has_unsaved_comment());
    }
}
