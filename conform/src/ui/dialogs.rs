//! Modal dialogs drawn over the panels.
//!
//! Each renderer erases its area with `Clear` before drawing, inside the same
//! `terminal.draw()` closure as the panels.

use conform_core::citation::CitationSource;
use conform_core::export::ExportFormat;
use conform_core::types::ApprovalReason;
use conform_core::workspace::ReviewWorkspace;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Gauge, Paragraph, Wrap},
};

use crate::app::{AppState, ApproveField};
use crate::theme::Theme;

/// Clears and returns a centred rect of at most `width` x `height` cells.
fn popup(frame: &mut Frame, width: u16, height: u16) -> Rect {
    let area = frame
        .area()
        .centered(Constraint::Length(width), Constraint::Length(height));
    frame.render_widget(Clear, area);
    area
}

fn dialog_block<'a>(title: impl Into<Line<'a>>, hint: &'a str, theme: &Theme) -> Block<'a> {
    Block::bordered()
        .title(title)
        .title_bottom(Line::styled(hint, Style::default().fg(theme.muted)))
        .border_style(Style::default().fg(theme.border_active))
}

/// `"▸ "` on the cursor row when `active`, two spaces otherwise.
fn cursor(is_cursor: bool, active: bool) -> &'static str {
    if is_cursor && active { "▸ " } else { "  " }
}

pub fn render_status_picker(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let Some(picker) = &state.status_picker else {
        return;
    };
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Current: ", Style::default().fg(theme.muted)),
            Span::styled(format!("● {}", picker.current), Style::default().fg(theme.status(picker.current))),
        ]),
        Line::default(),
    ];
    for (i, status) in picker.options.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::raw(cursor(i == picker.cursor, true)),
            Span::styled("● ", Style::default().fg(theme.status(*status))),
            Span::raw(status.label()),
        ]));
    }

    let area = popup(frame, 40, lines.len() as u16 + 2);
    frame.render_widget(
        Paragraph::new(lines).block(dialog_block(" Change Status ", " Enter apply · Esc cancel ", theme)),
        area,
    );
}

pub fn render_approve(frame: &mut Frame, state: &AppState, ws: &ReviewWorkspace, theme: &Theme) {
    let Some(dialog) = &state.approve else {
        return;
    };
    let (title, subject) = match &dialog.item_id {
        Some(id) => (
            " Approve Discrepancy ".to_owned(),
            ws.result(id).map(|r| r.material_description.clone()).unwrap_or_default(),
        ),
        None => (
            " Batch Approve ".to_owned(),
            format!("{} selected items need approval", dialog.batch_count),
        ),
    };

    let on_reason = dialog.field == ApproveField::Reason;
    let mut lines = vec![
        Line::styled(subject, Style::default().add_modifier(Modifier::BOLD)),
        Line::default(),
        Line::styled("Reason for approval *", Style::default().fg(theme.muted)),
    ];
    for (i, reason) in ApprovalReason::ALL.iter().enumerate() {
        let radio = if dialog.reason == Some(*reason) { "(•) " } else { "( ) " };
        lines.push(Line::raw(format!("{}{radio}{}", cursor(i == dialog.cursor, on_reason), reason.label())));
    }
    lines.push(Line::default());
    lines.push(Line::styled("Comment (optional)", Style::default().fg(theme.muted)));
    let caret = if on_reason { "" } else { "█" };
    lines.push(Line::raw(format!("  {}{caret}", dialog.comment)));
    if let Some(error) = &dialog.error {
        lines.push(Line::default());
        lines.push(Line::styled(error.clone(), Style::default().fg(theme.notice_error)));
    }

    let area = popup(frame, 64, lines.len() as u16 + 2);
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(dialog_block(title, " Tab field · Enter pick/approve · Esc cancel ", theme)),
        area,
    );
}

pub fn render_assign(frame: &mut Frame, state: &AppState, ws: &ReviewWorkspace, theme: &Theme) {
    let Some(dialog) = &state.assign else {
        return;
    };
    let area = popup(frame, 72, 16);
    let block = dialog_block(
        " Assign Reviewers ",
        " Enter tick/remove · Ctrl-s assign · Tab switch · Esc close ",
        theme,
    );
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [search, lists] = inner.layout(&Layout::vertical([Constraint::Length(2), Constraint::Fill(1)]));
    let caret = if dialog.on_assigned { "" } else { "█" };
    frame.render_widget(Paragraph::new(format!("Search: {}{caret}", dialog.query)), search);

    let [left, right] = lists.layout(&Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]));

    let available: Vec<Line> = ws
        .available_reviewers(&dialog.query)
        .iter()
        .enumerate()
        .map(|(i, user)| {
            let tick = if dialog.picked.contains(&user.id) { "[x] " } else { "[ ] " };
            Line::raw(format!(
                "{}{tick}{} ({})",
                cursor(i == dialog.cursor, !dialog.on_assigned),
                user.display_name(),
                user.initials()
            ))
        })
        .collect();
    let available = if available.is_empty() {
        vec![Line::styled("  No matching users", Style::default().fg(theme.muted))]
    } else {
        available
    };
    frame.render_widget(Paragraph::new(available).block(Block::new().title("Available")), left);

    let assigned: Vec<Line> = ws
        .reviewers()
        .iter()
        .enumerate()
        .map(|(i, r)| Line::raw(format!("{}{}", cursor(i == dialog.cursor, dialog.on_assigned), r.name)))
        .collect();
    let assigned = if assigned.is_empty() {
        vec![Line::styled("  None assigned", Style::default().fg(theme.muted))]
    } else {
        assigned
    };
    frame.render_widget(Paragraph::new(assigned).block(Block::new().title("Assigned")), right);
}

fn source_label(source: CitationSource) -> &'static str {
    match source {
        CitationSource::Spec => "Spec",
        CitationSource::Material => "Material Index",
    }
}

pub fn render_citations(frame: &mut Frame, state: &AppState, ws: &ReviewWorkspace, theme: &Theme) {
    let Some(pager) = &state.pager else {
        return;
    };
    let subject = ws.focused().map(|r| r.material_description.clone()).unwrap_or_default();

    let mut cited: Vec<u32> = pager.citations().iter().map(|c| c.page_number).collect();
    cited.sort_unstable();
    cited.dedup();
    let mut pages = vec![Span::styled("Cited pages: ", Style::default().fg(theme.muted))];
    for page in cited {
        let style = if page == pager.page() {
            Style::default().fg(theme.highlight).add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default()
        };
        pages.push(Span::styled(format!(" {page} "), style));
    }

    let mut lines = vec![
        Line::styled(subject, Style::default().add_modifier(Modifier::BOLD)),
        Line::from(pages),
        Line::default(),
    ];
    let on_page = pager.on_current_page();
    if on_page.is_empty() {
        lines.push(Line::styled("No citations on this page", Style::default().fg(theme.muted)));
    }
    for citation in on_page {
        lines.push(Line::from(vec![
            Span::styled("● ", Style::default().fg(theme.citation(citation.status))),
            Span::styled(source_label(citation.source), Style::default().fg(theme.muted)),
        ]));
        lines.push(Line::raw(format!("  \"{}\"", citation.text)));
        lines.push(Line::default());
    }

    let width = frame.area().width.saturating_sub(8).min(90);
    let height = frame.area().height.saturating_sub(6).min(24);
    let area = popup(frame, width, height);
    let title = format!(" Citations · page {} of {} ", pager.page(), pager.last_page());
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(dialog_block(title, " h/l page · n/N cited page · Esc close ", theme)),
        area,
    );
}

fn export_label(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Csv => "Export as CSV",
        ExportFormat::Xlsx => "Export as Excel",
        ExportFormat::Pdf => "Export as PDF",
    }
}

pub fn render_export_menu(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let lines: Vec<Line> = ExportFormat::ALL
        .iter()
        .enumerate()
        .map(|(i, format)| Line::raw(format!("{}{}", cursor(i == state.export_cursor, true), export_label(*format))))
        .collect();
    let area = popup(frame, 36, lines.len() as u16 + 2);
    frame.render_widget(
        Paragraph::new(lines).block(dialog_block(" Export Report ", " Enter export · Esc ", theme)),
        area,
    );
}

/// Progress gauge for the simulated analysis.
pub fn render_processing(frame: &mut Frame, state: &AppState, ws: &ReviewWorkspace, theme: &Theme) {
    let area = popup(frame, 64, 7);
    let block = dialog_block(
        format!(" Processing {} ", ws.run().id),
        " q quit ",
        theme,
    );
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (progress, status) = state
        .processing
        .map(|stage| (stage.progress, stage.status))
        .unwrap_or((0, "Starting analysis..."));
    let [label, gauge] = inner.layout(&Layout::vertical([Constraint::Length(2), Constraint::Length(1)]));
    frame.render_widget(Paragraph::new(status), label);
    frame.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(theme.highlight))
            .percent(u16::from(progress.min(100))),
        gauge,
    );
}

pub fn render_confirm_quit(frame: &mut Frame, theme: &Theme) {
    let area = popup(frame, 48, 5);
    frame.render_widget(
        Paragraph::new(vec![
            Line::raw("You have an unsent comment."),
            Line::raw("Quit and discard it? (y/n)"),
        ])
        .block(dialog_block(" Quit ", "", theme).border_style(Style::default().fg(theme.notice_warning))),
        area,
    );
}
