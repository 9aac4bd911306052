//! Help overlay renderer for conform.
//!
//! Draws a centred modal over the panel layout, using `Clear` to erase the
//! background first, inside the same `terminal.draw()` closure as everything else.

use ratatui::{
    Frame,
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

/// Renders the keybinding reference, scrolled by `help_scroll` rows.
///
/// Skipped on terminals narrower than 60 columns.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));
    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help · j/k scroll, ? or Esc to dismiss ")
        .border_style(Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn section(title: &'static str) -> Line<'static> {
    Line::styled(title, Style::default().add_modifier(Modifier::BOLD))
}

fn build_help_text() -> Text<'static> {
    Text::from(vec![
        section("Navigation"),
        Line::from("  j / k         Next / previous item (or scroll the focused panel)"),
        Line::from("  g / G         Jump to top / bottom"),
        Line::from("  Ctrl-d / u    Half page down / up"),
        Line::from("  H / L, Tab    Move panel focus"),
        Line::from(""),
        section("Filters"),
        Line::from("  1 / 2 / 3     Toggle Pre-Approved / Review Required / Action Mandatory"),
        Line::from("  d             Cycle division"),
        Line::from("  t             Cycle system type"),
        Line::from("  /             Search description and spec section"),
        Line::from("  0             Clear all filters"),
        Line::from(""),
        section("Review"),
        Line::from("  Space         Select / deselect item"),
        Line::from("  a             Select all visible / clear"),
        Line::from("  x             Clear selection"),
        Line::from("  s             Change status"),
        Line::from("  A             Approve discrepancy"),
        Line::from("  B             Batch approve selected items"),
        Line::from("  p / Enter     View citations by page"),
        Line::from("  R             Assign reviewers"),
        Line::from("  e             Export report"),
        Line::from(""),
        section("Comments"),
        Line::from("  c             Write a comment (resumes a kept draft)"),
        Line::from("  r             Reply to the highlighted comment"),
        Line::from("  @name, Tab    Mention and complete a user"),
        Line::from("  Enter         Send · Alt-Enter newline · Esc keep draft"),
        Line::from(""),
        section("General"),
        Line::from("  ?             Open / close this help overlay"),
        Line::from("  q / Esc       Quit (confirms if a comment draft exists)"),
    ])
}
