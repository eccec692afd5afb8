use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use std::time::Instant;

use crate::app::{App, FocusPane, InputMode};
use crate::render::{AnalysisView, ConfidenceLevel, CONFIDENCE_PLACEHOLDER, SUMMARY_PLACEHOLDER};
use crate::state::{Action, ChatRole, TextInput, REVEAL_FRAMES};
use crate::theme::Palette;

const CURSOR: char = '█';

/// Number of terminal rows `lines` take when wrapped to `width`
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum();
    rows.min(usize::from(u16::MAX)) as u16
}

/// Input text with a block cursor drawn at the edit position
fn with_cursor(input: &TextInput, editing: bool) -> String {
    if !editing {
        return input.text().to_string();
    }
    let mut text = String::with_capacity(input.text().len() + CURSOR.len_utf8());
    for (i, c) in input.text().chars().enumerate() {
        if i == input.cursor() {
            text.push(CURSOR);
        }
        text.push(c);
    }
    if input.cursor() >= input.text().chars().count() {
        text.push(CURSOR);
    }
    text
}

fn ellipsis(frame: u8) -> &'static str {
    match frame {
        0 => ".",
        1 => "..",
        _ => "...",
    }
}

fn pane_block(app: &App, pane: FocusPane, title: String) -> Block<'static> {
    let palette = app.theme.palette();
    let focused = app.focus == pane;
    let border = if focused && app.input_mode == InputMode::Editing {
        Style::default().fg(palette.highlight)
    } else if focused {
        Style::default().fg(palette.accent)
    } else {
        Style::default().fg(palette.border)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let palette = app.theme.palette();

    frame.render_widget(
        Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)),
        area,
    );

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [form_area, side_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(body_area);

    let [title_area, type_area, notes_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(3),
    ])
    .areas(form_area);

    let [results_area, chat_area] = Layout::vertical([
        Constraint::Percentage(60),
        Constraint::Percentage(40),
    ])
    .areas(side_area);

    render_title(app, frame, title_area);
    render_meeting_type(app, frame, type_area);
    render_notes(app, frame, notes_area);
    render_results(app, frame, results_area);
    render_chat(app, frame, chat_area);
    render_footer(app, frame, footer_area);

    // Render popups (in order of priority)
    if let Some(message) = app.alert.clone() {
        render_alert(app, frame, area, &message);
    } else if app.audio_prompt.is_some() {
        render_audio_prompt(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let palette = app.theme.palette();

    let mut spans = vec![
        Span::styled(" AI Meeting Analyzer ", Style::default().fg(palette.accent).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(palette.muted),
        ),
        Span::raw("  "),
        Span::styled(format!("[{}]", app.theme.as_str()), Style::default().fg(palette.muted)),
    ];
    if app.listening.is_some() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(" ● REC ", Style::default().bg(Color::Red).fg(Color::White).bold()));
    }
    if let Some(status) = &app.status {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::Green)));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(palette.border));
    frame.render_widget(header, area);
}

fn render_title(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.focus == FocusPane::Title && app.input_mode == InputMode::Editing;
    let palette = app.theme.palette();
    let text = if app.draft.title.text().is_empty() && !editing {
        Span::styled("Untitled Meeting", Style::default().fg(palette.muted))
    } else {
        Span::raw(with_cursor(&app.draft.title, editing))
    };
    let block = pane_block(app, FocusPane::Title, " Meeting Title (optional) ".to_string());
    frame.render_widget(Paragraph::new(Line::from(text)).block(block), area);
}

fn render_meeting_type(app: &App, frame: &mut Frame, area: Rect) {
    let palette = app.theme.palette();
    let current = app.draft.meeting_type(&app.meeting_types).unwrap_or("-");
    let line = Line::from(vec![
        Span::styled("◀ ", Style::default().fg(palette.muted)),
        Span::styled(current.to_string(), Style::default().fg(palette.accent).bold()),
        Span::styled(" ▶", Style::default().fg(palette.muted)),
    ]);
    let block = pane_block(app, FocusPane::MeetingType, " Meeting Type ".to_string());
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_notes(app: &App, frame: &mut Frame, area: Rect) {
    let palette = app.theme.palette();
    let editing = app.focus == FocusPane::Notes
        && app.input_mode == InputMode::Editing
        && app.listening.is_none();

    let title = if app.in_flight.is_busy(Action::Transcribe) {
        format!(" Meeting Notes - Transcribing{} ", ellipsis(app.animation_frame))
    } else if app.listening.is_some() {
        " Meeting Notes - Listening ".to_string()
    } else {
        " Meeting Notes ".to_string()
    };
    let block = pane_block(app, FocusPane::Notes, title);
    let inner = block.inner(area);

    let lines: Vec<Line> = if app.draft.notes.text().is_empty() && !editing {
        vec![Line::styled(
            "Paste your meeting notes or transcript here...",
            Style::default().fg(palette.muted),
        )]
    } else {
        with_cursor(&app.draft.notes, editing)
            .split('\n')
            .map(|l| Line::raw(l.to_string()))
            .collect()
    };

    // Keep the end of the notes in view
    let total = wrapped_height(&lines, inner.width);
    let scroll = total.saturating_sub(inner.height);

    let notes = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(notes, area);
}

fn section(lines: &mut Vec<Line<'static>>, heading: &str, items: &[String], palette: &Palette) {
    lines.push(Line::default());
    lines.push(Line::styled(
        heading.to_string(),
        Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
    ));
    for item in items {
        lines.push(Line::from(vec![Span::raw("  • "), Span::raw(item.clone())]));
    }
}

fn confidence_color(level: ConfidenceLevel) -> Color {
    match level {
        ConfidenceLevel::High => Color::Green,
        ConfidenceLevel::Medium => Color::Yellow,
        ConfidenceLevel::Low => Color::Red,
    }
}

/// Result card lines. Sections appear one per reveal frame.
fn result_lines(view: Option<&AnalysisView>, reveal: u8, palette: &Palette) -> Vec<Line<'static>> {
    let Some(view) = view else {
        return vec![
            Line::styled(SUMMARY_PLACEHOLDER, Style::default().fg(palette.muted)),
            Line::default(),
            Line::styled(CONFIDENCE_PLACEHOLDER, Style::default().fg(palette.muted)),
        ];
    };

    let mut lines = vec![
        Line::styled(view.title.clone(), Style::default().fg(palette.fg).bold()),
        Line::default(),
        Line::styled("Summary", Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)),
        Line::raw(view.summary.clone()),
    ];
    let sections = [
        ("Key Points", &view.key_points),
        ("Decisions", &view.decisions),
        ("Action Items", &view.action_items),
    ];
    for (heading, items) in sections.iter().take(usize::from(reveal)) {
        section(&mut lines, heading, items, palette);
    }
    if reveal >= REVEAL_FRAMES {
        lines.push(Line::default());
        lines.push(Line::styled(
            view.confidence_text.clone(),
            Style::default().fg(confidence_color(view.confidence_level)).bold(),
        ));
    }
    lines
}

fn render_results(app: &mut App, frame: &mut Frame, area: Rect) {
    let palette = app.theme.palette();
    let title = if app.in_flight.is_busy(Action::Analyze) {
        format!(" Results - Analyzing{} ", ellipsis(app.animation_frame))
    } else if app.in_flight.is_busy(Action::ExportPdf) {
        format!(" Results - Exporting PDF{} ", ellipsis(app.animation_frame))
    } else {
        " Results ".to_string()
    };
    let block = pane_block(app, FocusPane::Results, title);
    let inner = block.inner(area);

    let view = if app.results.visible { app.results.view.as_ref() } else { None };
    let lines = result_lines(view, app.results.reveal, &palette);

    let max_scroll = wrapped_height(&lines, inner.width).saturating_sub(inner.height);
    app.results_scroll = app.results_scroll.min(max_scroll);

    let results = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.results_scroll, 0));
    frame.render_widget(results, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let palette = app.theme.palette();
    let [history_area, input_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(3),
    ])
    .areas(area);

    let block = pane_block(app, FocusPane::Chat, " Ask About This Meeting ".to_string());
    let inner = block.inner(history_area);

    let mut lines: Vec<Line> = Vec::new();
    for msg in app.chat.messages() {
        let (label, style) = match msg.role {
            ChatRole::User => ("You:", Style::default().fg(palette.accent).bold()),
            ChatRole::Ai => ("AI:", Style::default().fg(Color::Green).bold()),
        };
        lines.push(Line::styled(label, style));
        if msg.pending {
            lines.push(Line::styled(
                format!("Thinking{}", ellipsis(app.animation_frame)),
                Style::default().fg(palette.muted).italic(),
            ));
        } else {
            for text_line in msg.text.lines() {
                lines.push(Line::raw(text_line.to_string()));
            }
        }
        lines.push(Line::default());
    }
    if lines.is_empty() {
        lines.push(Line::styled(
            "Ask questions like \"What decisions were made?\"",
            Style::default().fg(palette.muted),
        ));
    }

    // u16::MAX from the app means "follow the latest message"
    let max_scroll = wrapped_height(&lines, inner.width).saturating_sub(inner.height);
    app.chat_scroll = app.chat_scroll.min(max_scroll);

    let history = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(history, history_area);

    let editing = app.focus == FocusPane::Chat && app.input_mode == InputMode::Editing;
    let input = Paragraph::new(with_cursor(&app.chat_input, editing)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if editing { palette.highlight } else { palette.border }))
            .title(" Question (Enter to send) "),
    );
    frame.render_widget(input, input_area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " EDIT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = vec![Span::styled(mode_text, mode_style)];
    match app.input_mode {
        InputMode::Editing => {
            let enter = match app.focus {
                FocusPane::Chat => " send ",
                FocusPane::Notes => " newline ",
                _ => " done ",
            };
            hints.extend(vec![
                Span::styled(" Esc ", key_style),
                Span::styled(" normal ", label_style),
                Span::styled(" Enter ", key_style),
                Span::styled(enter, label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" next ", label_style),
            ]);
        }
        InputMode::Normal => {
            let copy_label = format!(" {} ", app.copy_feedback.label(Instant::now()).to_lowercase());
            let mut actions = vec![
                (" a ", " analyze ".to_string()),
                (" u ", " audio ".to_string()),
            ];
            if app.speech_available() {
                let mic = if app.listening.is_some() { " stop mic " } else { " mic " };
                actions.push((" m ", mic.to_string()));
            }
            actions.extend(vec![
                (" c ", copy_label),
                (" s ", " save txt ".to_string()),
                (" p ", " save pdf ".to_string()),
                (" / ", " chat ".to_string()),
                (" x ", " clear ".to_string()),
                (" X ", " clear chat ".to_string()),
                (" t ", " theme ".to_string()),
                (" Tab ", " focus ".to_string()),
                (" q ", " quit ".to_string()),
            ]);
            for (key, label) in actions {
                hints.push(Span::styled(key, key_style));
                hints.push(Span::styled(label, label_style));
            }
        }
    }

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height);
    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    Rect::new(popup_x, popup_y, popup_width, popup_height)
}

fn render_alert(app: &App, frame: &mut Frame, area: Rect, message: &str) {
    let palette = app.theme.palette();
    let popup = popup_area(area, 50, 5);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Alert ");
    let body = vec![
        Line::raw(message.to_string()),
        Line::styled("Press any key to continue", Style::default().fg(palette.muted)),
    ];
    frame.render_widget(
        Paragraph::new(body).block(block).wrap(Wrap { trim: true }),
        popup,
    );
}

fn render_audio_prompt(app: &App, frame: &mut Frame, area: Rect) {
    let palette = app.theme.palette();
    let popup = popup_area(area, 70, 6);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.highlight))
        .title(" Transcribe Audio ");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let instructions = Paragraph::new("Path to an audio file (mp3, wav, m4a, ogg). Enter to upload, Esc to cancel.")
        .style(Style::default().fg(palette.muted))
        .wrap(Wrap { trim: true });
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 2.min(inner.height)));

    if inner.height > 3 {
        let input_area = Rect::new(inner.x, inner.y + 3, inner.width, 1);
        let text = app
            .audio_prompt
            .as_ref()
            .map(|input| with_cursor(input, true))
            .unwrap_or_default();
        frame.render_widget(Paragraph::new(text).style(Style::default().fg(palette.accent)), input_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AnalysisResult;
    use crate::render::analysis_view;
    use crate::theme::Theme;

    fn texts(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_with_cursor_positions() {
        let mut input = TextInput::default();
        input.set("abc");
        assert_eq!(with_cursor(&input, false), "abc");
        assert_eq!(with_cursor(&input, true), "abc█");
        input.home();
        input.right();
        assert_eq!(with_cursor(&input, true), "a█bc");
    }

    #[test]
    fn test_wrapped_height() {
        let lines = vec![Line::raw("1234567890"), Line::raw(""), Line::raw("12345")];
        assert_eq!(wrapped_height(&lines, 5), 2 + 1 + 1);
        assert_eq!(wrapped_height(&lines, 0), 10 + 1 + 5);
    }

    #[test]
    fn test_result_lines_one_bullet_per_item() {
        let result = AnalysisResult {
            meeting_title: "Q3 Budget Sync".into(),
            summary: "...".into(),
            key_points: vec!["Reduce spend".into()],
            decisions: Vec::new(),
            action_items: vec!["Follow up with finance".into()],
            confidence: 75.0,
        };
        let view = analysis_view(&result);
        let lines = texts(&result_lines(Some(&view), REVEAL_FRAMES, &Theme::Dark.palette()));

        let bullets: Vec<&String> = lines.iter().filter(|l| l.starts_with("  • ")).collect();
        assert_eq!(bullets, vec!["  • Reduce spend", "  • Follow up with finance"]);

        let decisions = lines.iter().position(|l| l == "Decisions").unwrap();
        assert_eq!(lines[decisions + 1], "");
        assert_eq!(lines.last().unwrap(), "Confidence: 75%");
    }

    #[test]
    fn test_result_lines_reveal_in_steps() {
        let view = analysis_view(&AnalysisResult::default());
        let palette = Theme::Light.palette();
        let first = texts(&result_lines(Some(&view), 0, &palette));
        assert!(!first.iter().any(|l| l == "Key Points"));
        let all = texts(&result_lines(Some(&view), REVEAL_FRAMES, &palette));
        assert!(all.iter().any(|l| l == "Action Items"));
    }

    #[test]
    fn test_placeholder_when_hidden() {
        let lines = texts(&result_lines(None, 0, &Theme::Light.palette()));
        assert_eq!(lines[0], SUMMARY_PLACEHOLDER);
        assert_eq!(lines[2], CONFIDENCE_PLACEHOLDER);
    }
}
