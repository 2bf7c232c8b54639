//! Read and Write panels
//!
//! Each entry is a collapsible form. The left column lists the forms with
//! their fields; the right column shows the selected form's latest result
//! or its transactions.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::{short_hash, App, InputMode};
use crate::domain::form::{CallPhase, FormState, ReadForm, WriteForm};
use crate::ui::layout;

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn draw_read_panel(f: &mut Frame, area: Rect, app: &App) {
    let (list_area, detail_area) = layout::panel_split(area);
    let editing = app.input_mode == InputMode::Form;

    let forms: Vec<&FormState> = app.read_forms.iter().map(|form| &form.form).collect();
    draw_form_list(f, list_area, "Read", &forms, app.selected_read, editing, &[]);

    let lines = match app.selected_read_form() {
        Some(form) => read_detail_lines(form),
        None => empty_lines(app),
    };
    draw_detail(f, detail_area, "Result", lines);
}

pub fn draw_write_panel(f: &mut Frame, area: Rect, app: &App) {
    let (list_area, detail_area) = layout::panel_split(area);
    let editing = app.input_mode == InputMode::Form;

    let forms: Vec<&FormState> = app.write_forms.iter().map(|form| &form.form).collect();
    let busy: Vec<bool> = app
        .write_forms
        .iter()
        .map(|form| !form.submit_enabled())
        .collect();
    draw_form_list(f, list_area, "Write", &forms, app.selected_write, editing, &busy);

    let lines = match app.selected_write_form() {
        Some(form) => {
            let explorer = app.contract.as_ref().map(|contract| &contract.network);
            write_detail_lines(form, |hash| {
                explorer
                    .map(|network| network.tx_url(hash))
                    .unwrap_or_else(|| hash.to_string())
            })
        }
        None => empty_lines(app),
    };
    draw_detail(f, detail_area, "Transactions", lines);
}

fn draw_form_list(
    f: &mut Frame,
    area: Rect,
    title: &str,
    forms: &[&FormState],
    selected: usize,
    editing: bool,
    busy: &[bool],
) {
    let mut lines: Vec<Line> = Vec::new();
    let mut selected_line = 0usize;

    for (idx, form) in forms.iter().enumerate() {
        let is_selected = idx == selected;
        if is_selected {
            selected_line = lines.len();
        }
        let marker = if form.expanded { "▾" } else { "▸" };
        let name_style = if is_selected {
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let mut spans = vec![
            Span::raw(format!("{marker} ")),
            Span::styled(form.entry.name.clone(), name_style),
            Span::styled(
                format!(
                    "({})",
                    form.entry
                        .inputs
                        .iter()
                        .map(|param| param.canonical.as_str())
                        .collect::<Vec<_>>()
                        .join(",")
                ),
                dim(),
            ),
        ];
        if form.entry.is_payable() {
            spans.push(Span::styled(" payable", Style::default().fg(Color::Magenta)));
        }
        if busy.get(idx).copied().unwrap_or(false) {
            spans.push(Span::styled(" ⏳", Style::default().fg(Color::Yellow)));
        }
        lines.push(Line::from(spans));

        if !form.expanded {
            continue;
        }
        for (field_idx, field) in form.fields.iter().enumerate() {
            let focused = is_selected && editing && field_idx == form.active_field;
            let label_style = if focused {
                Style::default().fg(Color::Yellow)
            } else {
                dim()
            };
            let cursor = if focused { "▏" } else { "" };
            let placeholder = if field.value.is_empty() && !focused {
                Span::styled(field.ty.clone(), Style::default().fg(Color::DarkGray))
            } else {
                Span::raw(format!("{}{cursor}", field.value))
            };
            lines.push(Line::from(vec![
                Span::styled(format!("    {}: ", field.label), label_style),
                placeholder,
            ]));
        }
        if form.fields.is_empty() {
            lines.push(Line::from(Span::styled("    (no arguments)", dim())));
        }
    }

    if forms.is_empty() {
        lines.push(Line::from(Span::styled("No entries", dim())));
    }

    let inner_height = area.height.saturating_sub(2) as usize;
    let scroll = selected_line.saturating_sub(inner_height.saturating_sub(4));
    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .title(format!("{title} ({})", forms.len()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .scroll((scroll.min(u16::MAX as usize) as u16, 0));
    f.render_widget(paragraph, area);
}

fn draw_detail(f: &mut Frame, area: Rect, title: &str, lines: Vec<Line<'static>>) {
    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn empty_lines(app: &App) -> Vec<Line<'static>> {
    if app.contract.is_none() {
        vec![
            Line::from("No contract loaded."),
            Line::from(""),
            Line::from(Span::styled(":load <address> [network]", dim())),
            Line::from(Span::styled(":open <abi.json> <address>", dim())),
        ]
    } else {
        vec![Line::from("Nothing to show.")]
    }
}

fn entry_header(form: &FormState) -> Vec<Line<'static>> {
    vec![
        Line::from(vec![
            Span::styled(
                form.entry.signature.clone(),
                Style::default()
                    .fg(Color::LightCyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {}", form.entry.selector_hex()), dim()),
        ]),
        Line::from(vec![
            Span::styled("mutability ", dim()),
            Span::raw(form.entry.state_mutability.as_str().to_string()),
        ]),
        Line::from(""),
    ]
}

fn phase_line(phase: &CallPhase) -> Option<Line<'static>> {
    let (text, color) = match phase {
        CallPhase::Idle => return None,
        CallPhase::Validating => ("validating…".to_string(), Color::Yellow),
        CallPhase::Submitted => ("submitted".to_string(), Color::Yellow),
        CallPhase::Confirmed => ("ok".to_string(), Color::LightGreen),
        CallPhase::Failed(reason) => (format!("error: {reason}"), Color::LightRed),
    };
    Some(Line::from(Span::styled(text, Style::default().fg(color))))
}

fn read_detail_lines(form: &ReadForm) -> Vec<Line<'static>> {
    let mut lines = entry_header(&form.form);
    if let Some(line) = phase_line(&form.phase) {
        lines.push(line);
    }
    if let Some(outputs) = form.result.as_ref() {
        if outputs.is_empty() {
            lines.push(Line::from(Span::styled("(no return values)", dim())));
        }
        for output in outputs {
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", output.name), dim()),
                Span::styled(format!("{} ", output.kind), Style::default().fg(Color::Magenta)),
                Span::raw(output.value.clone()),
            ]));
        }
    }
    if form.phase == CallPhase::Idle {
        lines.push(Line::from(Span::styled("Enter to query", dim())));
    }
    lines
}

fn write_detail_lines(form: &WriteForm, tx_link: impl Fn(&str) -> String) -> Vec<Line<'static>> {
    let mut lines = entry_header(&form.form);
    if let Some(line) = phase_line(&form.phase) {
        lines.push(line);
    }
    if !form.submit_enabled() {
        lines.push(Line::from(Span::styled(
            format!(
                "submit disabled: {} pending",
                form.pending.unconfirmed_count()
            ),
            Style::default().fg(Color::Yellow),
        )));
    }
    if form.pending.is_empty() {
        lines.push(Line::from(Span::styled("No transactions yet", dim())));
        return lines;
    }
    lines.push(Line::from(""));
    for tx in form.pending.iter() {
        let (label, color) = match (tx.confirmed, tx.failure.as_ref()) {
            (true, _) => ("confirmed", Color::LightGreen),
            (false, Some(_)) => ("failed", Color::LightRed),
            (false, None) => ("pending", Color::Yellow),
        };
        let mut spans = vec![
            Span::styled(format!("{} ", tx.submitted_at.format("%H:%M:%S")), dim()),
            Span::styled(format!("{label:<9} "), Style::default().fg(color)),
            Span::raw(short_hash(&tx.hash)),
        ];
        if let Some(block) = tx.block_number {
            spans.push(Span::styled(format!("  #{block}"), dim()));
        }
        lines.push(Line::from(spans));
        lines.push(Line::from(Span::styled(
            format!("  {}", tx_link(&tx.hash)),
            Style::default().fg(Color::Blue),
        )));
        if let Some(failure) = tx.failure.as_ref() {
            lines.push(Line::from(Span::styled(
                format!("  {failure}"),
                Style::default().fg(Color::LightRed),
            )));
        }
    }
    lines
}
