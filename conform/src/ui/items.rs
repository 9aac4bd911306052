//! Items panel: the filtered result list with selection checkboxes.

use conform_core::workspace::ReviewWorkspace;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
};

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

/// Renders one row per filtered result:
/// `[x] ● 23 64 16  Centrifugal Chiller...  98%  2c`.
pub fn render_items(frame: &mut Frame, area: Rect, state: &mut AppState, ws: &ReviewWorkspace, theme: &Theme) {
    let filtered = ws.filtered();
    let title = format!(" Items {}/{} ", filtered.len(), ws.results().len());
    let block = panel_block(title, state.focus == PanelFocus::Items, theme);

    if filtered.is_empty() {
        frame.render_widget(block, area);
        frame.render_widget(
            Paragraph::new("  No items match the current filters (0 clears)")
                .style(Style::default().fg(theme.muted)),
            inner_rect(area),
        );
        return;
    }

    let rows: Vec<ListItem> = filtered
        .iter()
        .map(|result| {
            let checked = if ws.selection().contains(&result.id) { "[x] " } else { "[ ] " };
            let mut spans = vec![
                Span::styled(checked, Style::default().fg(theme.highlight)),
                Span::styled("● ", Style::default().fg(theme.status(result.overall_status))),
                Span::styled(format!("{}  ", result.spec_section), Style::default().fg(theme.muted)),
                Span::raw(result.material_description.clone()),
                Span::styled(format!("  {}%", result.confidence_score), Style::default().fg(theme.muted)),
            ];
            if result.is_discrepancy_approved() {
                spans.push(Span::styled(" ✓", Style::default().fg(theme.evidence_match)));
            }
            let comments = ws.comment_count(&result.id);
            if comments > 0 {
                spans.push(Span::styled(format!("  {comments}c"), Style::default().fg(theme.muted)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(rows)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("▌");
    frame.render_stateful_widget(list, area, &mut state.items);
}
