use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use tcha_player::engine::{RefreshLoop, RefreshState};

use super::{
    model::{App, Focus},
    view,
};

/// Input poll interval
const POLL_RATE: Duration = Duration::from_millis(50);

type Term = Terminal<CrosstermBackend<io::Stdout>>;

/// TUI entry point
///
/// Runs until the user quits or the refresh loop dies. The terminal is
/// restored on every exit path.
pub fn run(app: &mut App, refresh: &RefreshLoop) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e);
    }
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    if app.playlist.is_empty() {
        app.log(format!("No audio files under {}", app.root.display()));
    } else {
        app.log(format!("{} files in library", app.playlist.len()));
    }

    let result = event_loop(&mut terminal, app, refresh);
    if result.is_err() {
        app.screen.close();
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop(terminal: &mut Term, app: &mut App, refresh: &RefreshLoop) -> io::Result<()> {
    let mut dirty = true;

    while !app.should_quit {
        if refresh.state() == RefreshState::Stopped {
            log::error!("Refresh loop stopped, leaving UI");
            break;
        }

        dirty |= app.on_frame();
        if dirty {
            terminal.draw(|f| view::draw(f, app))?;
            dirty = false;
        }

        if event::poll(POLL_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key.code, key.modifiers);
                    dirty = true;
                }
            } else {
                // resize and friends
                dirty = true;
            }
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    // raw mode swallows SIGINT
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_help {
        if matches!(code, KeyCode::Char('h') | KeyCode::Esc | KeyCode::Char('q')) {
            app.show_help = false;
        }
        return;
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('h') => app.show_help = true,
        KeyCode::Char(' ') => app.toggle_pause(),
        KeyCode::Char('n') => app.skip(),
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::Down | KeyCode::Char('j') if app.focus == Focus::Playlist => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') if app.focus == Focus::Playlist => app.select_prev(),
        KeyCode::Enter if app.focus == Focus::Playlist => app.enqueue_selected(),
        _ => {}
    }
}
