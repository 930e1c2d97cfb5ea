use afiyalink_core::{RequestState, Sender};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode, Screen};

/// Render **bold** segments of an agent reply; everything else is literal
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut parts = text.split("**").peekable();
    let mut bold = false;

    while let Some(part) = parts.next() {
        // An unmatched trailing ** stays literal
        let unclosed = bold && parts.peek().is_none();
        if unclosed {
            spans.push(Span::raw(format!("**{}", part)));
        } else if !part.is_empty() {
            let span = if bold {
                Span::styled(part.to_string(), Style::default().add_modifier(Modifier::BOLD))
            } else {
                Span::raw(part.to_string())
            };
            spans.push(span);
        }
        bold = !bold;
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, log_area, status_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_log(app, frame, log_area);
    render_status(app, frame, status_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let tab = |label: &'static str, active: bool| {
        if active {
            Span::styled(label, Style::default().fg(Color::Black).bg(Color::Cyan).bold())
        } else {
            Span::styled(label, Style::default().fg(Color::White))
        }
    };

    let title = Line::from(vec![
        Span::styled(" AfiyaLink ", Style::default().fg(Color::Cyan).bold()),
        tab(" Chatbot ", app.screen == Screen::Chat),
        Span::raw(" "),
        tab(" Medical Translator ", app.screen == Screen::Translate),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_log(app: &mut App, frame: &mut Frame, area: Rect) {
    app.log_area = Some(area);
    app.log_height = area.height.saturating_sub(2);
    app.log_width = area.width.saturating_sub(2);

    let title = match app.screen {
        Screen::Chat => " Health assistant ".to_string(),
        Screen::Translate => format!(
            " {} → {} ",
            app.translator.source().name,
            app.translator.target().name
        ),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let loading = app.is_loading();
    let text = if app.messages().is_empty() && !loading {
        let hint = match app.screen {
            Screen::Chat => "Describe your symptoms or ask a health question...",
            Screen::Translate => "Enter text to translate...",
        };
        Text::from(Span::styled(hint, Style::default().fg(Color::DarkGray)))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in app.messages() {
            match msg.sender() {
                Sender::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                    for line in msg.text().lines() {
                        lines.push(Line::from(line.to_string()));
                    }
                }
                Sender::Agent => {
                    lines.push(Line::from(Span::styled(
                        "AfiyaLink:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )));
                    for line in msg.text().lines() {
                        lines.push(parse_markdown_line(line));
                    }
                }
            }
            lines.push(Line::default());
        }

        if loading {
            lines.push(Line::from(Span::styled(
                "AfiyaLink:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: ".", "..", "..."
            let dots = ".".repeat(app.animation_frame as usize + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let log = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.log_scroll, 0));
    frame.render_widget(log, area);
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let outcome = match app.screen {
        Screen::Chat => app.chat.session().and_then(|s| s.last_outcome()),
        Screen::Translate => app
            .translator
            .coordinator()
            .session()
            .and_then(|s| s.last_outcome()),
    };

    let line = if let Some(status) = &app.status {
        Line::from(Span::styled(format!(" {}", status), Style::default().fg(Color::Yellow)))
    } else {
        match outcome {
            Some(RequestState::Failed) => Line::from(Span::styled(
                " Last request failed, details in the log file",
                Style::default().fg(Color::Red),
            )),
            _ => Line::default(),
        }
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn input_title(app: &App) -> String {
    match app.screen {
        Screen::Chat => " Message ".to_string(),
        Screen::Translate => format!(" Text in {} ", app.translator.source().name),
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = match app.input_mode {
        InputMode::Editing => Color::Yellow,
        InputMode::Normal => Color::DarkGray,
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(input_title(app));

    // Horizontal scroll keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width > 0 && app.cursor >= inner_width {
        app.cursor - inner_width + 1
    } else {
        0
    };
    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if app.input_mode == InputMode::Editing {
        let cursor_x = (app.cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
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

    let mut hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
        InputMode::Normal => vec![
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" n ", key_style),
            Span::styled(" new ", label_style),
        ],
    };
    if app.input_mode == InputMode::Normal && app.screen == Screen::Translate {
        hints.extend(vec![
            Span::styled(" s ", key_style),
            Span::styled(" swap ", label_style),
            Span::styled(" [ ] ", key_style),
            Span::styled(" from ", label_style),
            Span::styled(" { } ", key_style),
            Span::styled(" to ", label_style),
        ]);
    }
    hints.extend(vec![
        Span::styled(" Tab ", key_style),
        Span::styled(" screen ", label_style),
    ]);
    if app.input_mode == InputMode::Normal {
        hints.extend(vec![
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ]);
    }

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
