use chrono::Local;
use ratatui::{
    Frame,
    layout::{Layout, Direction, Constraint, Rect, Alignment},
    widgets::{Block, Borders, BorderType, List, ListItem, ListState, Paragraph, Wrap, Clear},
    style::{Style, Modifier, Color},
    text::{Line, Span},
};
use crate::app::{App, Focus, ToastKind};
use crate::constants::ui::{MIN_HEIGHT, MIN_WIDTH};
use crate::controller::RequestState;
use crate::format::{self, BadgeTone, StatusTone};
use crate::theme::ColorScheme;
use crate::types::TrackingResult;

// ===============================
// Top-level draw
// ===============================
pub fn draw(f:&mut Frame, app:&mut App){
    app.tick();
    let colors = app.theme().colors();
    f.render_widget(Block::default().style(Style::default().bg(colors.background).fg(colors.text)), f.area());

    let area = f.area();
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = Paragraph::new(format!("Terminal too small ({}x{}), need {MIN_WIDTH}x{MIN_HEIGHT}", area.width, area.height))
            .style(Style::default().fg(colors.danger))
            .wrap(Wrap { trim: true });
        f.render_widget(msg, area);
        return;
    }

    let show_validation = app.validation_error().is_some();
    let mut constraints: Vec<Constraint> = Vec::with_capacity(5);
    constraints.push(Constraint::Length(1));                          // header
    constraints.push(Constraint::Length(3));                          // search bar
    if show_validation { constraints.push(Constraint::Length(1)); }   // inline validation
    constraints.push(Constraint::Min(0));                             // body
    constraints.push(Constraint::Length(1));                          // footer

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut idx = 0usize;
    header(f, chunks[idx], app, &colors); idx += 1;
    search_bar(f, chunks[idx], app, &colors); idx += 1;
    if show_validation {
        validation_line(f, chunks[idx], app, &colors); idx += 1;
    }
    body(f, chunks[idx], app, &colors); idx += 1;
    footer(f, chunks[idx], app, &colors);

    if let Some((msg, kind)) = app.toast_message() {
        draw_toast_modal(f, msg, kind, &colors);
    }
}

// ===============================
// Header / Search bar
// ===============================
fn header(f:&mut Frame, area:Rect, app:&App, colors:&ColorScheme){
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(14), Constraint::Min(0)])
        .split(area);

    let title = Line::from(vec![
        Span::styled("📮 Dak", Style::default().fg(colors.accent).add_modifier(Modifier::BOLD)),
        Span::styled("Dash", Style::default().fg(colors.text).add_modifier(Modifier::BOLD)),
    ]);
    f.render_widget(Paragraph::new(title), halves[0]);

    let link = format::truncate(&app.share_link(), halves[1].width as usize);
    f.render_widget(
        Paragraph::new(Span::styled(link, Style::default().fg(colors.text_dim))).alignment(Alignment::Right),
        halves[1],
    );
}

fn search_bar(f:&mut Frame, area:Rect, app:&App, colors:&ColorScheme){
    let focused = app.focus() == Focus::Input && !app.state().is_loading();
    let border = if app.validation_error().is_some() {
        colors.danger
    } else if focused {
        colors.accent
    } else {
        colors.border
    };

    let icon = app.carrier_icon();
    let title = if icon.is_empty() {
        format!(" {} ◂Tab▸ ", app.carrier_name())
    } else {
        format!(" {icon} {} ◂Tab▸ ", app.carrier_name())
    };

    let text = if app.input().is_empty() {
        Span::styled("Enter tracking number (e.g. RM123456789IN)", Style::default().fg(colors.text_dim))
    } else {
        Span::styled(app.input().to_string(), Style::default().fg(colors.text))
    };

    let paragraph = Paragraph::new(Line::from(text))
        .block(Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border)));
    f.render_widget(paragraph, area);

    if focused && area.width > 2 {
        let x = area.x + 1 + (app.input().chars().count().min(area.width.saturating_sub(3) as usize) as u16);
        f.set_cursor_position((x, area.y + 1));
    }
}

fn validation_line(f:&mut Frame, area:Rect, app:&App, colors:&ColorScheme){
    if let Some(err) = app.validation_error() {
        let line = Span::styled(format!(" ⚠ {err}"), Style::default().fg(colors.danger));
        f.render_widget(Paragraph::new(line), area);
    }
}

// ===============================
// Body
// ===============================
fn body(f:&mut Frame, area:Rect, app:&App, colors:&ColorScheme){
    match app.state() {
        RequestState::Idle => render_landing(f, area, app, colors),
        RequestState::Loading { query } => {
            let lines = vec![
                Line::from(""),
                Line::from(vec![
                    Span::styled(format!("{} ", app.spinner()), Style::default().fg(colors.accent)),
                    Span::styled(format!("Tracking {}", query.number), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!(" via {}", crate::carriers::display_name(app.carriers(), &query.carrier)), Style::default().fg(colors.text_dim)),
                ]),
                Line::from(""),
                Line::from(Span::styled(
                    "The first request can take up to a minute while the server wakes up.",
                    Style::default().fg(colors.text_dim),
                )),
            ];
            f.render_widget(Paragraph::new(lines).alignment(Alignment::Center).wrap(Wrap { trim: true }), area);
        }
        RequestState::Failure { query, error } => {
            let lines = vec![
                Line::from(Span::styled(error.message.clone(), Style::default().fg(colors.danger).add_modifier(Modifier::BOLD))),
                Line::from(""),
                Line::from(Span::styled(format!("Tracking number: {}", query.number), Style::default().fg(colors.text_dim))),
                Line::from(""),
                Line::from(Span::styled("Esc dismiss · F5 retry · Ctrl+N new search", Style::default().fg(colors.text_dim))),
            ];
            let block = Block::default()
                .title(" Error ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(colors.danger));
            let height = 7.min(area.height);
            let banner = Rect { height, ..area };
            f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), banner);
        }
        RequestState::Success { result, .. } => render_result(f, area, app, result, colors),
    }
}

fn render_landing(f:&mut Frame, area:Rect, app:&App, colors:&ColorScheme){
    let recent = app.recent_visible();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let intro = vec![
        Line::from(Span::styled("Track your parcel across Indian carriers", Style::default().add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(
            "India Post, Delhivery, Blue Dart, DTDC and more. Type a number and press Enter.",
            Style::default().fg(colors.text_dim),
        )),
    ];
    f.render_widget(Paragraph::new(intro).wrap(Wrap { trim: true }).block(Block::default().borders(Borders::NONE)), chunks[0]);

    if recent.is_empty() {
        return;
    }

    let items: Vec<ListItem> = recent.iter()
        .map(|n| ListItem::new(Line::from(format!("↺ {n}"))))
        .collect();
    let list_focused = app.focus() == Focus::Recent;
    let list = List::new(items)
        .block(Block::default()
            .title(" Recent searches (↓ to select, Ctrl+L to clear) ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(if list_focused { colors.accent } else { colors.border })))
        .highlight_style(Style::default().bg(colors.selection_bg).fg(colors.selection_fg).add_modifier(Modifier::BOLD));

    let mut state = ListState::default();
    state.select(app.recent_selection());
    let height = (recent.len() as u16 + 2).min(chunks[1].height);
    f.render_stateful_widget(list, Rect { height, ..chunks[1] }, &mut state);
}

fn tone_color(tone:StatusTone, colors:&ColorScheme) -> Color {
    match tone {
        StatusTone::Delivered => colors.ok,
        StatusTone::Moving => colors.warning,
        StatusTone::Problem => colors.danger,
        StatusTone::Neutral => colors.text,
    }
}

fn badge_color(tone:BadgeTone, colors:&ColorScheme) -> Color {
    match tone {
        BadgeTone::OnTrack => colors.ok,
        BadgeTone::Info => colors.accent,
        BadgeTone::Warning => colors.warning,
        BadgeTone::Danger => colors.danger,
    }
}

fn render_result(f:&mut Frame, area:Rect, app:&App, result:&TrackingResult, colors:&ColorScheme){
    let dim = Style::default().fg(colors.text_dim);
    let badge = format::delay_badge(result.delay_info.as_ref());

    let mut summary = vec![
        Line::from(vec![
            Span::styled(result.tracking_number.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                if result.carrier.is_empty() { String::new() } else { format!("  {}", result.carrier) },
                dim,
            ),
        ]),
        Line::from(vec![
            Span::styled(result.status.clone(), Style::default().fg(tone_color(format::status_tone(&result.status), colors)).add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(format!("[{}]", badge.label), Style::default().fg(badge_color(badge.tone, colors)).add_modifier(Modifier::BOLD)),
        ]),
    ];
    if let Some(detail) = &badge.detail {
        summary.push(Line::from(Span::styled(detail.clone(), dim)));
    }
    summary.push(Line::from(vec![
        Span::styled("From ", dim),
        Span::raw(result.origin.clone().unwrap_or_else(|| "N/A".into())),
        Span::styled("  →  To ", dim),
        Span::raw(result.destination.clone().unwrap_or_else(|| "N/A".into())),
    ]));
    summary.push(Line::from(vec![
        Span::styled("Last updated ", dim),
        Span::raw(format::format_optional_timestamp(result.last_updated.as_deref())),
    ]));
    if let Some(text) = result.smart_summary.as_deref().filter(|s| !s.trim().is_empty()) {
        summary.push(Line::from(""));
        summary.push(Line::from(Span::styled(text.to_string(), Style::default().fg(colors.accent))));
    }
    if let Some(at) = app.controller().fetched_at() {
        summary.push(Line::from(Span::styled(
            format!("Refreshed {}", format::format_last_refreshed(at, Local::now())),
            dim,
        )));
    }

    let summary_height = (summary.len() as u16 + 2).min(area.height / 2 + 2);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(summary_height), Constraint::Min(0)])
        .split(area);

    f.render_widget(
        Paragraph::new(summary)
            .wrap(Wrap { trim: true })
            .block(Block::default().title(" Shipment ").borders(Borders::ALL).border_type(BorderType::Rounded).border_style(Style::default().fg(colors.border))),
        chunks[0],
    );

    let timeline_block = Block::default()
        .title(format!(" Timeline ({}) ", result.events.len()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(colors.border));

    if result.events.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled("No tracking events available", dim)).alignment(Alignment::Center).block(timeline_block),
            chunks[1],
        );
        return;
    }

    // Most recent first; the head of the list is emphasised
    let items: Vec<ListItem> = result.events.iter().enumerate().map(|(i, ev)| {
        let latest = i == 0;
        let marker = match (latest, format::status_tone(&ev.status)) {
            (_, StatusTone::Delivered) => "✔",
            (true, _) => "●",
            (false, _) => "○",
        };
        let head = Style::default().fg(if latest { colors.accent } else { colors.text_dim });
        let status = if latest {
            Style::default().fg(colors.text).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.text)
        };
        let mut meta = ev.timestamp.as_deref().map(format::format_timestamp).unwrap_or_default();
        if let Some(loc) = ev.location.as_deref().filter(|l| !l.is_empty()) {
            if !meta.is_empty() { meta.push_str("  ·  "); }
            meta.push_str(loc);
        }
        ListItem::new(vec![
            Line::from(vec![Span::styled(format!("{marker} "), head), Span::styled(ev.status.clone(), status)]),
            Line::from(Span::styled(format!("  {meta}"), dim)),
        ])
    }).collect();

    f.render_widget(List::new(items).block(timeline_block), chunks[1]);
}

// ===============================
// Footer / Overlays
// ===============================
fn footer(f:&mut Frame, area:Rect, app:&App, colors:&ColorScheme){
    let hints = match app.state() {
        RequestState::Idle => "Enter track · Tab carrier · ↑↓ recent · Ctrl+T theme · Ctrl+C quit",
        RequestState::Loading { .. } => "Enter new search · Ctrl+N cancel · Ctrl+C quit",
        RequestState::Success { .. } => "F5 refresh · Ctrl+Y copy link · Ctrl+N new search · Ctrl+T theme · Ctrl+C quit",
        RequestState::Failure { .. } => "Esc dismiss · F5 retry · Ctrl+N new search · Ctrl+C quit",
    };
    let line = Line::from(vec![
        Span::styled(hints, Style::default().fg(colors.text_dim)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_toast_modal(f: &mut Frame, message: &str, kind: ToastKind, colors: &ColorScheme) {
    let (glyph, color) = match kind {
        ToastKind::Success => ("✓", colors.toast_success),
        ToastKind::Error => ("✗", colors.toast_error),
    };

    // Small centered box (40% width, 3 lines height)
    let area = f.area();
    let width = ((area.width * 4) / 10).max(message.chars().count() as u16 + 6).min(area.width);
    let height = 3;
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (area.height.saturating_sub(height)) / 2;
    let overlay = Rect { x, y, width, height };

    f.render_widget(Clear, overlay);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color));

    let text = Paragraph::new(format!("{glyph} {message}"))
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .block(block);

    f.render_widget(text, overlay);
}
