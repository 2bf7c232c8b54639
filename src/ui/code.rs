use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::App;

pub fn draw_code_tab(f: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = match app.snippet() {
        Some(snippet) => snippet
            .lines()
            .map(|line| {
                let style = if line.starts_with("//") || line.starts_with('#') {
                    Style::default().fg(Color::DarkGray)
                } else if line.starts_with("cast ") {
                    Style::default().fg(Color::LightGreen)
                } else {
                    Style::default().fg(Color::White)
                };
                Line::from(Span::styled(line.to_string(), style))
            })
            .collect(),
        None => vec![Line::from("Load a contract to generate a snippet.")],
    };

    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .title("Code  (y copy · x export)")
                .borders(Borders::ALL),
        )
        .scroll((app.code_scroll, 0));
    f.render_widget(paragraph, area);
}
