//! Comments panel: threaded discussion on the focused item, plus the composer.

use conform_core::comments::Thread;
use conform_core::mentions;
use conform_core::types::ItemComment;
use conform_core::workspace::ReviewWorkspace;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Wrap},
};

use crate::app::{AppState, ComposeTarget, Draft, Mode, PanelFocus};
use crate::theme::Theme;
use crate::ui::format_timestamp;
use crate::ui::layout::{inner_rect, panel_block};

pub fn render_comments(frame: &mut Frame, area: Rect, state: &mut AppState, ws: &ReviewWorkspace, theme: &Theme) {
    let focused = ws.focused();
    let count = focused.map(|r| ws.comment_count(&r.id)).unwrap_or(0);
    let block = panel_block(format!(" Comments ({count}) "), state.focus == PanelFocus::Comments, theme);
    frame.render_widget(block, area);
    let inner = inner_rect(area);

    let Some(result) = focused else {
        return;
    };
    let draft = state.draft.as_ref().filter(|d| d.item_id == result.id);
    let composer_height = if draft.is_some() { 6 } else { 0 };
    let [threads_area, composer_area] = inner.layout(&Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(composer_height),
    ]));

    let threads = ws.thread(&result.id);
    let highlight = (state.focus == PanelFocus::Comments).then_some(state.comment_cursor);
    let lines = if threads.is_empty() {
        vec![Line::styled("  No comments yet (c to add)", Style::default().fg(theme.muted))]
    } else {
        thread_lines(&threads, highlight, theme)
    };
    let max_scroll = u16::try_from(lines.len().saturating_sub(1)).unwrap_or(u16::MAX);
    state.comments_scroll = state.comments_scroll.min(max_scroll);
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((state.comments_scroll, 0)),
        threads_area,
    );

    if let Some(draft) = draft {
        render_composer(frame, composer_area, draft, state.mode == Mode::Compose, ws, theme);
    }
}

fn comment_header(comment: &ItemComment, prefix: &str, theme: &Theme) -> Line<'static> {
    let mut spans = vec![
        Span::raw(prefix.to_owned()),
        Span::styled(comment.author_name.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(format!(" · {}", format_timestamp(comment.timestamp)), Style::default().fg(theme.muted)),
    ];
    if let Some(status) = comment.status_at_time {
        spans.push(Span::styled(format!(" · {status}"), Style::default().fg(theme.status(status))));
    }
    Line::from(spans)
}

fn thread_lines(threads: &[Thread<'_>], highlight: Option<usize>, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, thread) in threads.iter().enumerate() {
        let marker = if highlight == Some(i) { "▸ " } else { "  " };
        let mut header = comment_header(thread.root, marker, theme);
        if highlight == Some(i) {
            header = header.style(Style::default().fg(theme.highlight));
        }
        lines.push(header);

        let body_style = if thread.root.is_system {
            Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC)
        } else {
            Style::default()
        };
        for text in thread.root.text.lines() {
            lines.push(Line::styled(format!("  {text}"), body_style));
        }

        for reply in &thread.replies {
            lines.push(comment_header(reply, "    ↳ ", theme));
            for text in reply.text.lines() {
                lines.push(Line::raw(format!("      {text}")));
            }
        }
        lines.push(Line::default());
    }
    lines
}

/// The draft box, with mention suggestions while an `@name` is being typed.
fn render_composer(
    frame: &mut Frame,
    area: Rect,
    draft: &Draft,
    editing: bool,
    ws: &ReviewWorkspace,
    theme: &Theme,
) {
    let title = match &draft.target {
        ComposeTarget::Comment => " New comment ".to_owned(),
        ComposeTarget::Reply { author, .. } => format!(" Reply to {author} "),
    };
    let hint = if editing { " Enter send · Esc keep draft " } else { " c to resume " };
    let border = if editing { theme.status_mode_insert } else { theme.border_inactive };
    let block = Block::bordered()
        .title(title)
        .title_bottom(Line::styled(hint, Style::default().fg(theme.muted)))
        .border_style(Style::default().fg(border));

    let mut lines: Vec<Line> = draft.text.lines().map(|l| Line::raw(l.to_owned())).collect();
    if draft.text.is_empty() || draft.text.ends_with('\n') {
        lines.push(Line::default());
    }
    if editing {
        if let Some(last) = lines.last_mut() {
            last.push_span(Span::styled("█", Style::default().fg(theme.status_mode_insert)));
        }
        if let Some(query) = mentions::mention_query(&draft.text) {
            let names: Vec<String> = mentions::suggestions(ws.directory(), &query)
                .iter()
                .map(|u| u.display_name())
                .collect();
            if !names.is_empty() {
                lines.push(Line::styled(
                    format!("Tab: @{}", names.join("  @")),
                    Style::default().fg(theme.muted),
                ));
            }
        }
    }

    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}
