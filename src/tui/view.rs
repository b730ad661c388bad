use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph},
    Frame,
};

use tcha_player::engine::{format_clock, PlaybackState, Progress};

use super::model::{App, Focus};

const PLAY_BTN: char = '\u{25B6}';
const PAUSE_BTN: char = '\u{23F8}';

pub fn draw(f: &mut Frame, app: &mut App) {
    // Header, Main (Playlist + Queue), Progress, Logs, Footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(8),    // Main
            Constraint::Length(3), // Progress
            Constraint::Length(4), // Logs
            Constraint::Length(1), // Footer
        ])
        .split(f.size());

    draw_header(f, app, chunks[0]);
    draw_main(f, app, chunks[1]);
    draw_progress(f, app, chunks[2]);
    draw_logs(f, app, chunks[3]);
    draw_footer(f, chunks[4]);

    if app.show_help {
        draw_help(f);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let state_str = match app.player.state() {
        PlaybackState::Playing => "[PLAYING]",
        PlaybackState::Paused => "[PAUSED]",
        PlaybackState::Idle => "[IDLE]",
    };

    let title = "tcha-player";
    let help_hint = "(h: Help)";
    let left_part = format!("{}  {}", title, help_hint);
    let spaces = " ".repeat(
        area.width
            .saturating_sub(left_part.len() as u16 + state_str.len() as u16 + 2) as usize,
    );

    let header_line = Line::from(vec![
        Span::raw(title),
        Span::raw("  "),
        Span::styled(help_hint, Style::default().fg(Color::DarkGray)),
        Span::raw(spaces),
        Span::raw(state_str),
    ]);

    let paragraph = Paragraph::new(header_line).block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

fn focused_block(title: &str, focused: bool) -> Block<'_> {
    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

fn draw_main(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    draw_playlist(f, app, chunks[0]);
    draw_queue(f, app, chunks[1]);
}

fn draw_playlist(f: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = (0..app.playlist.len())
        .map(|i| ListItem::new(format!("{:02}. {}", i + 1, app.entry_name(i))))
        .collect();

    let focused = app.focus == Focus::Playlist;
    let mut playlist = List::new(items).block(focused_block("Playlist", focused));
    if focused {
        playlist = playlist.highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        );
    }

    f.render_stateful_widget(playlist, area, &mut app.playlist_state);
}

fn draw_queue(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .queue
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if i == 0 {
                ListItem::new(format!("> {}", name))
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            } else {
                ListItem::new(format!("  {}", name))
            }
        })
        .collect();

    let title = format!("Queue ({})", app.queue.len());
    let list = List::new(items).block(focused_block(&title, app.focus == Focus::Queue));
    f.render_widget(list, area);
}

fn draw_progress(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(9),
            Constraint::Min(10),
            Constraint::Length(9),
        ])
        .split(area);

    let (elapsed, total, percent, glyph) = match app.progress {
        Progress::Empty => (None, None, 0, PLAY_BTN),
        Progress::Playing(state) => (
            Some(state.elapsed),
            state.known_total(),
            state.percent,
            // the glyph shows the action Space would take
            if state.paused { PLAY_BTN } else { PAUSE_BTN },
        ),
    };

    let clock = |d| {
        Paragraph::new(format_clock(d))
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL))
    };
    f.render_widget(clock(elapsed), chunks[0]);
    f.render_widget(clock(total), chunks[2]);

    let name = app.queue.first().map(String::as_str).unwrap_or("Music Progress");
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("[{}] {}", glyph, name)),
        )
        .gauge_style(Style::default().fg(Color::Yellow).bg(Color::Black))
        .percent(percent.min(100) as u16);
    f.render_widget(gauge, chunks[1]);
}

fn draw_logs(f: &mut Frame, app: &App, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let start = app.logs.len().saturating_sub(visible);
    let lines: Vec<Line> = app.logs[start..]
        .iter()
        .map(|l| Line::from(Span::styled(l.as_str(), Style::default().fg(Color::DarkGray))))
        .collect();

    let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Log"));
    f.render_widget(paragraph, area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let keys = "Enter: queue | Space: pause | n: skip | Tab: focus | q: quit";
    f.render_widget(
        Paragraph::new(Span::styled(keys, Style::default().fg(Color::DarkGray))),
        area,
    );
}

fn draw_help(f: &mut Frame) {
    let area = centered_rect(50, 50, f.size());
    let lines = vec![
        Line::from("Enter      add selected file to the queue"),
        Line::from("Space      pause / resume current track"),
        Line::from("n          skip current track"),
        Line::from("j/k, ↑/↓   move in playlist"),
        Line::from("Tab        switch focus"),
        Line::from("h          toggle this help"),
        Line::from("q, Esc     quit"),
    ];
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help")),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
