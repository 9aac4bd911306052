//! Details panel: everything known about the focused result.

use conform_core::types::{ConfidenceBand, ConformanceResult, Evidence};
use conform_core::workspace::ReviewWorkspace;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::format_timestamp;
use crate::ui::layout::panel_block;

pub fn render_details(frame: &mut Frame, area: Rect, state: &mut AppState, ws: &ReviewWorkspace, theme: &Theme) {
    let block = panel_block(" Details ", state.focus == PanelFocus::Details, theme);
    let lines = match ws.focused() {
        Some(result) => detail_lines(result, theme),
        None => vec![Line::styled("  Select an item", Style::default().fg(theme.muted))],
    };

    // Keeps `G` from scrolling past the end.
    let max_scroll = u16::try_from(lines.len().saturating_sub(1)).unwrap_or(u16::MAX);
    state.details_scroll = state.details_scroll.min(max_scroll);

    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((state.details_scroll, 0)),
        area,
    );
}

fn heading(text: &str) -> Line<'static> {
    Line::styled(text.to_owned(), Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED))
}

fn field(label: &str, value: String, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(theme.muted)),
        Span::raw(value),
    ])
}

fn detail_lines(result: &ConformanceResult, theme: &Theme) -> Vec<Line<'static>> {
    let band = match result.confidence_band() {
        ConfidenceBand::High => "high",
        ConfidenceBand::Medium => "medium",
        ConfidenceBand::Low => "low",
    };
    let mut lines = vec![
        Line::styled(
            result.material_description.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::default(),
        field("Spec Section", result.spec_section.clone(), theme),
        field("Division", result.division.clone(), theme),
        field("System", result.system_type.clone(), theme),
        Line::from(vec![
            Span::styled("Status: ", Style::default().fg(theme.muted)),
            Span::styled(
                format!("● {}", result.overall_status),
                Style::default().fg(theme.status(result.overall_status)),
            ),
        ]),
        field("Confidence", format!("{}% ({band})", result.confidence_score), theme),
    ];

    match &result.discrepancy {
        Some(d) if d.approved => {
            let by = d.approved_by.clone().unwrap_or_default();
            let at = d.approved_at.map(format_timestamp).unwrap_or_default();
            lines.push(Line::styled(
                format!("✓ Discrepancy approved by {by} on {at}"),
                Style::default().fg(theme.evidence_match),
            ));
            if let Some(reason) = d.reason {
                lines.push(field("Reason", reason.label().to_owned(), theme));
            }
            if let Some(comment) = &d.comment {
                lines.push(field("Comment", comment.clone(), theme));
            }
        }
        _ if result.overall_status.needs_review() => {
            lines.push(Line::styled(
                "Discrepancy awaiting approval (A)",
                Style::default().fg(theme.status(result.overall_status)),
            ));
        }
        _ => {}
    }

    if let Some(assignment) = &result.review_assignment {
        lines.push(field(
            "Assigned to",
            format!("{} by {}", assignment.reviewer_name, assignment.assigned_by),
            theme,
        ));
    }

    lines.push(Line::default());
    lines.push(heading("Project Specification Evidence"));
    push_evidence(&mut lines, &result.project_spec_evidence, theme);
    lines.push(Line::default());
    lines.push(heading("Material Index Evidence"));
    push_evidence(&mut lines, &result.material_index_evidence, theme);

    lines.push(Line::default());
    lines.push(heading("Review History"));
    if result.review_history.is_empty() {
        lines.push(Line::styled("  No review activity yet", Style::default().fg(theme.muted)));
    }
    for entry in &result.review_history {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}  ", format_timestamp(entry.timestamp)), Style::default().fg(theme.muted)),
            Span::raw(format!("{} {}", entry.user_name, entry.action.as_str())),
        ]));
        if let Some(comment) = &entry.comment {
            lines.push(Line::raw(format!("    {comment}")));
        }
    }
    lines
}

fn push_evidence(lines: &mut Vec<Line<'static>>, evidence: &[Evidence], theme: &Theme) {
    if evidence.is_empty() {
        lines.push(Line::styled("  None", Style::default().fg(theme.muted)));
    }
    for ev in evidence {
        let pages: Vec<String> = ev.page_references.iter().map(u32::to_string).collect();
        lines.push(Line::from(vec![
            Span::styled(format!("● {}", ev.status.label()), Style::default().fg(theme.evidence(ev.status))),
            Span::styled(format!("  p. {}", pages.join(", ")), Style::default().fg(theme.muted)),
        ]));
        lines.push(Line::raw(format!("  {}", ev.explanation)));
        for chunk in &ev.chunks {
            lines.push(Line::styled(
                format!("  > {chunk}"),
                Style::default().add_modifier(Modifier::ITALIC),
            ));
        }
    }
}
