use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap};
use ratatui::Frame;

pub mod code;
pub mod forms;
pub mod layout;

use crate::app::{
    short_addr, App, ContractSource, InputMode, StatusLevel, Tab, TxState, WalletState,
};
use crate::config;

pub fn draw(f: &mut Frame, app: &App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    draw_tab_bar(f, areas.tabs, app);
    match app.current_tab {
        Tab::Read => forms::draw_read_panel(f, areas.main, app),
        Tab::Write => forms::draw_write_panel(f, areas.main, app),
        Tab::Code => code::draw_code_tab(f, areas.main, app),
    }
    draw_status_line(f, areas.status_line, app);
    draw_command_line(f, areas.command_line, app);

    if app.help_open {
        draw_help_popup(f, areas.size);
    }
    if app.settings.open {
        draw_settings_popup(f, areas.size, app);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let network = app
        .contract
        .as_ref()
        .map(|contract| &contract.network)
        .unwrap_or(&app.network);
    let contract = app
        .contract
        .as_ref()
        .map(|contract| contract.address.to_checksum(None))
        .unwrap_or_else(|| "--".to_string());

    let mut spans = vec![
        Span::styled(
            "Callpad",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("Network", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(" {} ", network.name)),
        Span::styled("Contract", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(" {contract}")),
    ];
    if app.lookup.is_some() {
        spans.push(Span::styled(
            "  loading…",
            Style::default().fg(Color::Yellow),
        ));
    }
    let left = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    let wallet = match &app.wallet {
        WalletState::Disconnected => Span::styled(
            "disconnected (c to connect)",
            Style::default().fg(Color::DarkGray),
        ),
        WalletState::Connecting { .. } => {
            Span::styled("connecting…", Style::default().fg(Color::Yellow))
        }
        WalletState::Connected(session) => Span::styled(
            format!("{} · chain {}", short_addr(&session.account), session.chain_id),
            Style::default().fg(Color::LightGreen),
        ),
    };
    let right = Paragraph::new(Line::from(vec![
        Span::styled("Wallet ", Style::default().fg(Color::DarkGray)),
        wallet,
    ]))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Left);

    f.render_widget(left, chunks[0]);
    f.render_widget(right, chunks[1]);
}

fn draw_tab_bar(f: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .map(|tab| {
            let count = match tab {
                Tab::Read => format!(" ({})", app.read_forms.len()),
                Tab::Write => format!(" ({})", app.write_forms.len()),
                Tab::Code => String::new(),
            };
            Line::from(vec![
                Span::styled(
                    format!("{}:", tab.shortcut()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(format!("{}{count}", tab.title())),
            ])
        })
        .collect();

    let selected = Tab::ALL
        .iter()
        .position(|tab| *tab == app.current_tab)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .divider(" │ ");

    f.render_widget(tabs, area);
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled("Tab ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}  ", app.current_tab.title())),
    ];
    if let Some(contract) = app.contract.as_ref() {
        let source = match &contract.source {
            ContractSource::Lookup { from_cache: true } => "cache".to_string(),
            ContractSource::Lookup { from_cache: false } => "explorer".to_string(),
            ContractSource::File(path) => path.display().to_string(),
        };
        spans.push(Span::styled("ABI ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::raw(format!(
            "{} entries ({source})  ",
            contract.interface.len()
        )));
        if !contract.hidden.is_empty() {
            spans.push(Span::styled("Hidden ", Style::default().fg(Color::DarkGray)));
            spans.push(Span::raw(format!("{}  ", contract.hidden.len())));
        }
    }
    let pending = app
        .tx_log
        .iter()
        .filter(|record| record.state == TxState::Pending)
        .count();
    if !app.tx_log.is_empty() {
        spans.push(Span::styled("Txs ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::raw(format!("{} ({pending} pending)", app.tx_log.len())));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

/// Get command hint for autocompletion
fn command_hint(input: &str) -> Option<&'static str> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    let commands = [
        ("load", "load <address> [network]"),
        ("reload", "Fetch the interface again, bypassing the cache"),
        ("network", "network [name|chain id]"),
        ("open", "open <abi.json> [address]"),
        ("connect", "Connect the wallet"),
        ("export", "export [code|txs|abi]"),
        ("copy", "Copy the snippet"),
        ("settings", "Choose displayed entries"),
        ("help", "Show keys"),
        ("quit", "Quit"),
    ];

    for (cmd, desc) in commands {
        if cmd.starts_with(&input) {
            return Some(desc);
        }
    }
    None
}

fn draw_command_line(f: &mut Frame, area: Rect, app: &App) {
    let content = match app.input_mode {
        InputMode::Command => {
            let hint = command_hint(&app.command.input);
            let hint_text = hint.unwrap_or("load <address> · network <name> · connect");
            Line::from(vec![
                Span::styled(": ", Style::default().fg(Color::Yellow)),
                Span::raw(&app.command.input),
                Span::styled(
                    format!("  {}", hint_text),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        }
        InputMode::Form | InputMode::Normal => {
            if let Some((text, level)) = app.status_text() {
                let color = match level {
                    StatusLevel::Info => Color::LightGreen,
                    StatusLevel::Warn => Color::LightYellow,
                    StatusLevel::Error => Color::LightRed,
                };
                Line::from(vec![
                    Span::styled("msg: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(text, Style::default().fg(color)),
                ])
            } else {
                action_hints(app)
            }
        }
    };

    let paragraph = Paragraph::new(content).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

fn action_hints(app: &App) -> Line<'static> {
    let hints: &[(&str, &str)] = match (app.input_mode, app.current_tab) {
        (InputMode::Form, _) => &[
            ("Tab", "next field"),
            ("Enter", "submit"),
            ("Esc", "done"),
        ],
        (_, Tab::Code) => &[
            ("j/k", "scroll"),
            ("y", "copy"),
            ("x", "export"),
            (":", "command"),
        ],
        _ => &[
            ("j/k", "select"),
            ("Enter", "open/edit"),
            ("Space", "collapse"),
            ("c", "connect"),
            ("s", "settings"),
            (":", "command"),
            ("?", "help"),
        ],
    };

    let mut spans = Vec::new();
    for (key, label) in hints {
        spans.push(Span::styled(
            (*key).to_string(),
            Style::default().fg(Color::Yellow),
        ));
        spans.push(Span::styled(
            format!(" {label}  "),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = layout::centered_rect(64, 70, area);
    f.render_widget(Clear, popup_area);

    let config_path = config::config_path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(unknown)".to_string());

    let lines = vec![
        Line::from("Navigation"),
        Line::from("  1 / 2 / 3  Read / Write / Code"),
        Line::from("  Tab        Next tab"),
        Line::from("  j / k      Move selection"),
        Line::from("  Space      Expand / collapse form"),
        Line::from("  Enter      Edit fields, then submit"),
        Line::from("  Esc        Leave form / close"),
        Line::from(""),
        Line::from("Actions"),
        Line::from("  c          Connect wallet"),
        Line::from("  r          Reload interface"),
        Line::from("  s          Settings (displayed entries)"),
        Line::from("  y          Copy snippet"),
        Line::from("  x          Export snippet"),
        Line::from("  :          Command"),
        Line::from("  ?          Toggle help"),
        Line::from("  q          Quit"),
        Line::from(""),
        Line::from("Commands"),
        Line::from("  :load 0x<40-hex-address> [network]"),
        Line::from("  :network sepolia"),
        Line::from("  :open ./Token.json 0x<address>"),
        Line::from("  :export code | txs | abi"),
        Line::from(""),
        Line::from(format!("Config: {config_path}")),
    ];

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}

fn draw_settings_popup(f: &mut Frame, area: Rect, app: &App) {
    let popup_area = layout::centered_rect(70, 76, area);
    f.render_widget(Clear, popup_area);

    let entries = app.settings_entries();
    let read_count = app
        .contract
        .as_ref()
        .map(|contract| contract.partitions.read.len())
        .unwrap_or(0);

    let mut lines = vec![
        Line::from(Span::styled(
            "Displayed entries",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Space toggle · j/k move · Esc apply",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
    ];

    let mut cursor_line = 0usize;
    for (idx, entry) in entries.iter().enumerate() {
        if idx == 0 && read_count > 0 {
            lines.push(Line::from(Span::styled(
                "Read",
                Style::default().fg(Color::DarkGray),
            )));
        }
        if idx == read_count {
            lines.push(Line::from(Span::styled(
                "Write",
                Style::default().fg(Color::DarkGray),
            )));
        }
        if idx == app.settings.cursor {
            cursor_line = lines.len();
        }
        let checked = !app.settings.hidden.contains(&entry.signature);
        let marker = if idx == app.settings.cursor { ">" } else { " " };
        let style = if idx == app.settings.cursor {
            Style::default().fg(Color::LightCyan)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!(
                "{marker} [{}] {}",
                if checked { "x" } else { " " },
                entry.signature
            ),
            style,
        )));
    }
    if entries.is_empty() {
        lines.push(Line::from("No callable entries"));
    }

    let height = popup_area.height.saturating_sub(2) as usize;
    let scroll = cursor_line.saturating_sub(height.saturating_sub(2));
    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Settings").borders(Borders::ALL))
        .scroll((scroll.min(u16::MAX as usize) as u16, 0));

    f.render_widget(paragraph, popup_area);
}
