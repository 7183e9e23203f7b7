use std::time::Instant;

use foodfinder_core::{CardBoard, NoticePhase, RecommendationCard, TranscriptEntry};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, FocusPane, InputMode, PromptKind};

const CHAT_PLACEHOLDER: &str = "Hỏi về món ăn hoặc gửi ảnh để tìm quán...";
const CARDS_PLACEHOLDER: &str = "Chưa có gợi ý nào. Hãy hỏi về món ăn bạn muốn tìm!";
const NOTICE_WIDTH: u16 = 48;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [chat_column, cards_area] = Layout::horizontal([
        Constraint::Percentage(60),
        Constraint::Percentage(40),
    ])
    .areas(body_area);

    let staged_height = if app.orchestrator.staging().is_staged() { 1 } else { 0 };
    let [chat_area, staged_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(staged_height),
        Constraint::Length(3),
    ])
    .areas(chat_column);

    render_chat(app, frame, chat_area);
    if staged_height > 0 {
        render_staged(app, frame, staged_area);
    }
    render_input(app, frame, input_area);
    render_cards(app, frame, cards_area);
    render_footer(app, frame, footer_area);

    render_notices(app, frame, body_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = if app.orchestrator.is_busy() {
        Span::styled(" [đang xử lý] ", Style::default().fg(Color::Yellow))
    } else {
        Span::raw("")
    };

    let title = Line::from(vec![
        Span::styled(" FoodFinder ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            app.orchestrator.backend().base_url().to_string(),
            Style::default().fg(Color::Gray),
        ),
        status,
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " INSERT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let keys: &[(&str, &str)] = match (app.input_mode, app.focus) {
        (InputMode::Editing, _) => &[(" Enter ", " gửi "), (" Esc ", " thoát nhập ")],
        (InputMode::Normal, FocusPane::Chat) => &[
            (" i ", " nhập "),
            (" o ", " chọn ảnh "),
            (" x ", " bỏ ảnh "),
            (" j/k ", " cuộn "),
            (" Tab ", " quán "),
            (" q ", " thoát "),
        ],
        (InputMode::Normal, FocusPane::Cards) => &[
            (" j/k ", " chọn "),
            (" m ", " vị trí "),
            (" r ", " chỉ đường "),
            (" f ", " yêu thích "),
            (" Tab ", " chat "),
            (" q ", " thoát "),
        ],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in keys {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let focused = app.focus == FocusPane::Chat;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Trò chuyện ");

    let entries = app.chat.transcript.entries();
    let text = if entries.is_empty() {
        Text::from(Span::styled(
            CHAT_PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();
        for entry in entries {
            lines.extend(entry_lines(entry, app.animation_frame));
            lines.push(Line::default());
        }
        Text::from(lines)
    };

    let chat = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn entry_lines(entry: &TranscriptEntry, animation_frame: u8) -> Vec<Line<'static>> {
    let user_label = || {
        Line::from(Span::styled(
            "Bạn:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
    };
    let bot_label = || {
        Line::from(Span::styled(
            "Bot:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))
    };

    match entry {
        TranscriptEntry::UserText(text) => {
            let mut lines = vec![user_label()];
            lines.extend(text.lines().map(|l| Line::from(l.to_string())));
            lines
        }
        TranscriptEntry::UserImage { preview } => vec![
            user_label(),
            Line::from(Span::styled(
                format!("[ảnh] {}", preview),
                Style::default().fg(Color::Magenta),
            )),
        ],
        TranscriptEntry::BotText(text) => {
            let mut lines = vec![bot_label()];
            lines.extend(text.lines().map(|l| Line::from(l.to_string())));
            lines
        }
        TranscriptEntry::Pending => {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((animation_frame as usize) + 1);
            vec![
                bot_label(),
                Line::from(Span::styled(
                    format!("Đang trả lời{}", dots),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )),
            ]
        }
    }
}

fn render_staged(app: &App, frame: &mut Frame, area: Rect) {
    let Some(staged) = app.orchestrator.staging().peek() else {
        return;
    };
    let line = Line::from(vec![
        Span::styled(" Ảnh đính kèm: ", Style::default().fg(Color::Magenta).bold()),
        Span::raw(staged.preview.label.clone()),
        Span::styled("  (x để bỏ)", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = match (editing, app.prompt) {
        (true, PromptKind::Message) => Color::Yellow,
        (true, _) => Color::Magenta,
        (false, _) => Color::DarkGray,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(app.prompt.title());

    // Calculate visible portion of input with horizontal scrolling
    let editor = app.active_input();
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = editor.cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = editor
        .text
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    // Show cursor when editing
    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_cards(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Cards;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Quán gợi ý ");

    let cards = match &app.chat.cards {
        CardBoard::Placeholder => {
            let placeholder = Paragraph::new(Span::styled(
                CARDS_PLACEHOLDER,
                Style::default().fg(Color::DarkGray),
            ))
            .block(block)
            .wrap(Wrap { trim: true });
            frame.render_widget(placeholder, area);
            return;
        }
        CardBoard::Cards(cards) => cards,
    };

    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = cards.iter().map(|card| card_item(card, width)).collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.card_state);
}

fn card_item(card: &RecommendationCard, width: usize) -> ListItem<'static> {
    let muted = Style::default().fg(Color::Gray);
    let distance = if card.distance_km == foodfinder_core::card::UNKNOWN {
        card.distance_km.clone()
    } else {
        format!("{} km", card.distance_km)
    };

    let mut lines = vec![
        Line::from(Span::styled(
            card.name.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::raw(format!("★ {}", card.rating)),
            Span::styled(format!("  ₫ {}", card.budget), muted),
            Span::styled(format!("  {}", distance), muted),
        ]),
        Line::from(Span::styled(card.address.clone(), muted)),
    ];
    if card.description != foodfinder_core::card::UNKNOWN {
        let description: String = card.description.chars().take(width.max(8)).collect();
        lines.push(Line::from(Span::styled(
            description,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }
    lines.push(Line::default());

    ListItem::new(lines)
}

/// Notices stack in the top-right corner; the ones on their way out are dimmed.
fn render_notices(app: &App, frame: &mut Frame, area: Rect) {
    let now = Instant::now();
    let width = NOTICE_WIDTH.min(area.width);
    let mut y = area.y;

    for notice in app.chat.notices.iter() {
        let style = match app.chat.notices.phase(notice, now) {
            NoticePhase::Visible => Style::default().fg(Color::White).bg(Color::Blue),
            NoticePhase::Leaving => Style::default().fg(Color::Gray).bg(Color::DarkGray),
            NoticePhase::Expired => continue,
        };
        if y + 3 > area.y + area.height {
            break;
        }

        let rect = Rect::new(area.x + area.width - width, y, width, 3);
        let widget = Paragraph::new(notice.text.clone())
            .style(style)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(Clear, rect);
        frame.render_widget(widget, rect);
        y += 3;
    }
}
