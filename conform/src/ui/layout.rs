//! Responsive layout engine for conform.
//!
//! Pure layout arithmetic plus the two one-row bars (header and status). No
//! mutable application state lives here; everything is recomputed inside
//! `terminal.draw()` so each frame reflects the current terminal size.
//!
//! # Panel geometry
//!
//! At `>= 120` columns the items, details, and comments panels sit side by side
//! (35 / 40 / 25). Narrower terminals show only the focused panel at full width.
//!
//! `Spacing::Overlap(1)` combined with `Block::merge_borders(MergeStrategy::Fuzzy)`
//! makes adjacent panel borders share a single column.

use conform_core::filter::{self, ConformanceFilters};
use conform_core::types::OverallStatus;
use conform_core::workspace::ReviewWorkspace;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use crate::app::{AppState, Mode, PanelFocus};
use crate::theme::Theme;

/// Returns `[header, items, details, comments, status_bar]` for the current frame.
///
/// Collapsed panels come back as zero-width rects and are skipped by the renderer.
pub fn compute_layout(frame: &Frame, state: &AppState) -> [Rect; 5] {
    let [header, main_area, status_bar] = frame.area().layout(&Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ]));

    let [items, details, comments] = if frame.area().width >= 120 {
        main_area.layout(
            &Layout::horizontal([
                Constraint::Percentage(35),
                Constraint::Percentage(40),
                Constraint::Percentage(25),
            ])
            .spacing(Spacing::Overlap(1)),
        )
    } else {
        let collapsed = Rect { width: 0, ..main_area };
        match state.focus {
            PanelFocus::Items => [main_area, collapsed, collapsed],
            PanelFocus::Details => [collapsed, main_area, collapsed],
            PanelFocus::Comments => [collapsed, collapsed, main_area],
        }
    };

    [header, items, details, comments, status_bar]
}

/// Inner `Rect` of a panel after removing its 1-cell border.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Builds a bordered `Block` for a panel.
///
/// Focused panels get a thick border in `border_active`. `MergeStrategy::Fuzzy`
/// is required because `Exact` produces wrong junctions when mixing `Thick` and
/// `Plain` borders.
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

/// Run identity, summary counts, and the active filters.
pub fn render_header(frame: &mut Frame, area: Rect, ws: &ReviewWorkspace, theme: &Theme) {
    let run = ws.run();
    let summary = ws.summary();
    let mut spans = vec![
        Span::styled(" conform ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            " {} v{} · {} · MI v{}   ",
            run.id,
            run.version,
            run.status.label(),
            run.material_index_version
        )),
    ];
    for status in OverallStatus::ALL {
        spans.push(Span::styled("● ", Style::default().fg(theme.status(status))));
        spans.push(Span::raw(format!("{} {}  ", summary.get(status), status.label())));
    }
    spans.push(Span::styled(
        filter_summary(ws.filters()),
        Style::default().fg(theme.muted),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// `"Filters: Review Required · Division 21 - Fire Suppression · \"pump\""`,
/// or empty when none are set.
pub fn filter_summary(filters: &ConformanceFilters) -> String {
    if !filters.has_active_filters() {
        return String::new();
    }
    let mut parts = Vec::new();
    if !filters.status.is_empty() {
        let labels: Vec<&str> = filters.status.iter().map(|s| s.label()).collect();
        parts.push(labels.join(", "));
    }
    for value in [&filters.division, &filters.system_type] {
        if !value.is_empty() && value != filter::ANY {
            parts.push(value.clone());
        }
    }
    if !filters.search_query.is_empty() {
        parts.push(format!("\"{}\"", filters.search_query));
    }
    format!("Filters: {}", parts.join(" · "))
}

fn mode_label(mode: Mode) -> &'static str {
    match mode {
        Mode::Normal | Mode::HelpOverlay | Mode::ConfirmQuit => " NORMAL ",
        Mode::Compose => " COMMENT ",
        Mode::Search => " SEARCH ",
        Mode::StatusPicker => " STATUS ",
        Mode::Approve => " APPROVE ",
        Mode::AssignReviewers => " REVIEWERS ",
        Mode::Citations => " CITATIONS ",
        Mode::ExportMenu => " EXPORT ",
        Mode::Processing => " PROCESSING ",
    }
}

/// Renders the 1-row status bar: mode, selection, reviewers, and the latest notice.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, ws: &ReviewWorkspace, theme: &Theme) {
    let mode_fg = match state.mode {
        Mode::Normal | Mode::HelpOverlay | Mode::ConfirmQuit | Mode::Citations => theme.status_mode_normal,
        _ => theme.status_mode_insert,
    };
    let mut spans = vec![
        Span::styled(mode_label(state.mode), Style::default().fg(mode_fg).add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {} ", ws.session().display_name())),
    ];

    if state.mode == Mode::Search {
        spans.push(Span::raw(format!(" /{}", ws.filters().search_query)));
    }
    if !ws.selection().is_empty() {
        spans.push(Span::raw(format!(" │ {} selected", ws.selection().len())));
    }
    let reviewers = ws.reviewers();
    if !reviewers.is_empty() {
        let names: Vec<&str> = reviewers.iter().map(|r| r.name.as_str()).collect();
        spans.push(Span::raw(format!(" │ Reviewers: {}", names.join(", "))));
    }
    if let Some(format) = state.exporting {
        spans.push(Span::styled(
            format!(" │ Exporting {format}..."),
            Style::default().fg(theme.notice_info),
        ));
    }
    if let Some((notice, _)) = &state.notice {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            notice.message.clone(),
            Style::default().fg(theme.notice(notice.level)).add_modifier(Modifier::BOLD),
        ));
    }
    if state.mode == Mode::Normal && state.notice.is_none() {
        spans.push(Span::styled("  ? help", Style::default().fg(theme.muted)));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_summary_lists_active_dimensions() {
        let mut filters = ConformanceFilters::default();
        assert_eq!(filter_summary(&filters), "");
        filters.toggle_status(OverallStatus::ReviewRequired);
        filters.division = "Division 23 - HVAC".into();
        filters.system_type = filter::ANY.into();
        filters.search_query = "fan".into();
        assert_eq!(
            filter_summary(&filters),
            "Filters: Review Required · Division 23 - HVAC · \"fan\""
        );
    }
}
