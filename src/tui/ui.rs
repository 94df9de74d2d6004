use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};
use unicode_truncate::UnicodeTruncateStr;

use crate::browse::Phase;
use crate::playlist::Dimension;

use super::app::{App, PlayerState, View};

const NAME_WIDTH: usize = 40;

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Dimension tabs
            Constraint::Length(1), // Status line
            Constraint::Min(0),    // Body
            Constraint::Length(2), // Help
        ])
        .split(frame.area());

    draw_tabs(frame, app, chunks[0]);
    draw_status(frame, app, chunks[1]);

    match app.view {
        View::Channels => draw_channels(frame, app, chunks[2]),
        View::Browser => draw_browser(frame, app, chunks[2]),
        View::Search => draw_search(frame, app, chunks[2]),
        View::Help => draw_help(frame, chunks[2]),
    }

    draw_footer(frame, app, chunks[3]);
}

fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Dimension::ALL
        .iter()
        .enumerate()
        .map(|(i, d)| Line::from(format!("{} {}", i + 1, d.label())))
        .collect();

    let active = Dimension::ALL
        .iter()
        .position(|d| *d == app.browse.dimension())
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(active)
        .block(Block::default().borders(Borders::BOTTOM).title("tvscout"))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, area);
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let browse = &app.browse;
    let selection = browse
        .selection()
        .label()
        .unwrap_or_else(|| browse.dimension().label().to_string());

    let mut spans = vec![Span::styled(
        selection,
        Style::default().add_modifier(Modifier::BOLD),
    )];

    let state = match browse.phase() {
        Phase::Idle => "pick an entry (b)".to_string(),
        Phase::Loading => "loading...".to_string(),
        Phase::Loaded | Phase::LoadingMore => match browse.expected_total() {
            Some(total) => format!(
                "{}/{} shown, {} listed",
                browse.shown_len(),
                browse.filtered_len(),
                total
            ),
            None => format!("{}/{} shown", browse.shown_len(), browse.filtered_len()),
        },
    };
    spans.push(Span::raw(" | "));
    spans.push(Span::styled(state, Style::default().fg(Color::DarkGray)));

    if let Some(value) = browse.filter_value() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("filter: {}", value),
            Style::default().fg(Color::Yellow),
        ));
    }

    if !browse.search().is_empty() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("search: {}", browse.search()),
            Style::default().fg(Color::Yellow),
        ));
    }

    match &app.player {
        PlayerState::Stopped => {}
        PlayerState::Playing(name) => {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(
                format!("▶ {}", name),
                Style::default().fg(Color::Green),
            ));
        }
        PlayerState::Error(e) => {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(e.clone(), Style::default().fg(Color::Red)));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_channels(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let displayed = app.browse.displayed();

    if displayed.is_empty() {
        draw_notice(frame, app, chunks[0]);
    } else {
        let current_id = app.browse.current().map(|c| c.id.as_str());
        let items: Vec<ListItem> = displayed
            .iter()
            .map(|channel| {
                let (name, _) = channel.name.unicode_truncate(NAME_WIDTH);
                let marker = if Some(channel.id.as_str()) == current_id {
                    "● "
                } else {
                    "  "
                };
                let tag = channel
                    .attribute(app.browse.dimension())
                    .unwrap_or_default();

                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(Color::Green)),
                    Span::raw(format!("{:<width$}", name, width = NAME_WIDTH)),
                    Span::styled(format!(" {}", tag), Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect();

        let title = if app.browse.has_more() {
            format!(
                "Channels [{} more, m: +{}]",
                app.browse.filtered_len() - app.browse.shown_len(),
                app.browse.page_size()
            )
        } else {
            "Channels".to_string()
        };

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            );

        let mut state = ListState::default();
        state.select(Some(app.selected_index));
        frame.render_stateful_widget(list, chunks[0], &mut state);
    }

    draw_channel_info(frame, app, chunks[1]);
}

/// Shown in place of the list when there is nothing to display
fn draw_notice(frame: &mut Frame, app: &App, area: Rect) {
    let browse = &app.browse;
    let lines = match (browse.phase(), browse.error()) {
        _ if browse.is_loading() => vec![Line::from(Span::styled(
            "Loading channels...",
            Style::default().fg(Color::Yellow),
        ))],
        (Phase::Idle, _) => vec![Line::from(format!(
            "Pick one of {} {} to load (b)",
            app.catalog.len(browse.dimension()),
            browse.dimension().label().to_lowercase()
        ))],
        (_, Some(error)) => vec![
            Line::from(Span::styled(
                "No channels available for this selection",
                Style::default().fg(Color::Red),
            )),
            Line::from(""),
            Line::from(Span::styled(error.to_string(), Style::default().fg(Color::DarkGray))),
            Line::from(""),
            Line::from("r: retry"),
        ],
        _ if !browse.batch().is_empty() => {
            vec![Line::from("No channels match the current search and filter")]
        }
        _ => vec![Line::from("No channels available for this selection (r: retry)")],
    };

    let notice = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Channels"));
    frame.render_widget(notice, area);
}

fn draw_channel_info(frame: &mut Frame, app: &App, area: Rect) {
    let label = Style::default().fg(Color::DarkGray);

    let lines = match app.selected_channel().or(app.browse.current()) {
        Some(channel) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    channel.name.clone(),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
            ];

            let fields = [
                ("Category", channel.category.as_deref()),
                ("Country", channel.country.as_deref()),
                ("Language", channel.language.as_deref()),
                ("Region", channel.region.as_deref()),
                ("Logo", channel.logo.as_deref()),
            ];
            for (name, value) in fields {
                if let Some(value) = value {
                    lines.push(Line::from(vec![
                        Span::styled(format!("{:<10}", name), label),
                        Span::raw(value.to_string()),
                    ]));
                }
            }

            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Stream", label)));
            lines.push(Line::from(channel.url.clone()));
            lines
        }
        None => vec![Line::from(Span::styled("No channel selected", label))],
    };

    let info = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Now"));
    frame.render_widget(info, area);
}

fn draw_browser(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let filter = Paragraph::new(format!("{}█", app.browser_query))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title("Filter"));
    frame.render_widget(filter, chunks[0]);

    let rows = app.browser_rows();
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let flag = row.flag.as_deref().map(|f| format!("{} ", f)).unwrap_or_default();
            let more = if row.has_subdivisions { " ›" } else { "" };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{}{}{}", flag, row.label, more)),
                Span::styled(
                    format!("  {} channels", row.channels),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let title = match app.browser_country.and_then(|i| app.catalog.countries.get(i)) {
        Some(country) => format!("{} subdivisions", country.name),
        None => format!("{} [{}]", app.browse.dimension().label(), rows.len()),
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !rows.is_empty() {
        state.select(Some(app.browser_index));
    }
    frame.render_stateful_widget(list, chunks[1], &mut state);
}

fn draw_search(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let input = Paragraph::new(format!("{}█", app.search_input))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title("Search channel names"));
    frame.render_widget(input, chunks[0]);

    draw_channels(frame, app, chunks[1]);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let keys = [
        ("1-5", "switch dimension"),
        ("b", "pick an entry in the current dimension"),
        ("↑/↓ j/k", "move"),
        ("PgUp/PgDn", "move by 10"),
        ("Enter", "play channel"),
        ("/", "search by name"),
        ("f", "cycle secondary filter"),
        ("m", "show more channels"),
        ("r", "reload the current selection"),
        ("q", "quit"),
    ];

    let lines: Vec<Line> = keys
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(format!("{:<12}", key), Style::default().fg(Color::Cyan)),
                Span::raw(*desc),
            ])
        })
        .collect();

    let help = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Keys"));
    frame.render_widget(help, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let text = match app.view {
        View::Channels => "1-5: dimension | b: browse | Enter: play | /: search | f: filter | m: more | r: retry | ?: help | q: quit",
        View::Browser => "type to filter | ↑/↓: navigate | Enter: load | →: subdivisions | Esc: back",
        View::Search => "type to search | Enter: done | Esc: clear",
        View::Help => "Esc: back",
    };

    let footer = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, area);
}
