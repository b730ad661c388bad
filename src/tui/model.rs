use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tcha_player::decode::DecoderRegistry;
use tcha_player::engine::{Display, DisplayError, Mailbox, Progress};
use tcha_player::library;
use tcha_player::Player;

/// Log lines kept for the log pane
const MAX_LOGS: usize = 50;

/// Focused pane
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Playlist,
    Queue,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Self::Playlist => Self::Queue,
            Self::Queue => Self::Playlist,
        }
    }
}

/// State written by the refresh thread, read by the UI thread
#[derive(Default)]
pub struct Screen {
    queue: Mutex<Vec<String>>,
    redraw: AtomicBool,
    closed: AtomicBool,
}

impl Screen {
    pub fn queue(&self) -> Vec<String> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_queue(&self, names: Vec<String>) {
        *self.queue.lock().unwrap_or_else(PoisonError::into_inner) = names;
    }

    /// Consume a pending redraw request
    pub fn take_redraw(&self) -> bool {
        self.redraw.swap(false, Ordering::AcqRel)
    }

    pub fn request_redraw(&self) {
        self.redraw.store(true, Ordering::Release);
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// Refresh-loop side of the screen
pub struct ScreenDisplay(pub Arc<Screen>);

impl Display for ScreenDisplay {
    fn sync_queue(&mut self, names: Vec<String>) {
        self.0.set_queue(names);
    }

    fn request_redraw(&mut self) -> Result<(), DisplayError> {
        if self.0.closed.load(Ordering::Acquire) {
            return Err(DisplayError::Closed);
        }
        self.0.request_redraw();
        Ok(())
    }
}

/// TUI application state
pub struct App {
    /// Shared playback queue
    pub player: Player,

    registry: DecoderRegistry,

    /// Library root, used to shorten display names
    pub root: PathBuf,

    /// Files found under the library root
    pub playlist: Vec<PathBuf>,

    /// Playlist cursor (Ratatui ListState)
    pub playlist_state: ratatui::widgets::ListState,

    pub focus: Focus,

    pub screen: Arc<Screen>,

    progress_rx: Arc<Mailbox<Progress>>,

    /// Latest progress received from the refresh loop
    pub progress: Progress,

    /// Queue listing as of the last refresh
    pub queue: Vec<String>,

    pub logs: Vec<String>,

    pub should_quit: bool,

    pub show_help: bool,

    last_error: Option<String>,
}

impl App {
    pub fn new(
        player: Player,
        root: PathBuf,
        playlist: Vec<PathBuf>,
        progress_rx: Arc<Mailbox<Progress>>,
    ) -> Self {
        let mut playlist_state = ratatui::widgets::ListState::default();
        if !playlist.is_empty() {
            playlist_state.select(Some(0));
        }

        Self {
            player,
            registry: DecoderRegistry::default(),
            root,
            playlist,
            playlist_state,
            focus: Focus::default(),
            screen: Arc::new(Screen::default()),
            progress_rx,
            progress: Progress::Empty,
            queue: Vec::new(),
            logs: Vec::new(),
            should_quit: false,
            show_help: false,
            last_error: None,
        }
    }

    pub fn log(&mut self, message: String) {
        if self.logs.len() >= MAX_LOGS {
            self.logs.remove(0);
        }
        let timestamp = chrono::Local::now().format("%H:%M:%S");
        self.logs.push(format!("[{}] {}", timestamp, message));
    }

    /// Display name of a playlist entry
    pub fn entry_name(&self, index: usize) -> String {
        self.playlist
            .get(index)
            .map(|path| library::display_name(&self.root, path))
            .unwrap_or_default()
    }

    /// Decode the selected playlist entry and append it to the queue
    pub fn enqueue_selected(&mut self) {
        let Some(index) = self.playlist_state.selected() else {
            return;
        };
        let Some(path) = self.playlist.get(index).cloned() else {
            return;
        };
        let name = self.entry_name(index);

        match self.registry.open(&path) {
            Ok(source) => {
                self.player.add(source, name.clone());
                self.log(format!("Queued: {}", name));
                // show it now instead of on the next tick
                self.queue = self.player.names();
                self.progress = self.player.progress();
                self.screen.request_redraw();
            }
            Err(e) => {
                log::warn!("Cannot open {}: {}", path.display(), e);
                self.log(format!("Cannot open {}: {}", name, e));
            }
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.player.toggle_pause() {
            Some(true) => self.log("Paused".to_string()),
            Some(false) => self.log("Resumed".to_string()),
            None => self.log("Nothing to pause".to_string()),
        }
        self.progress = self.player.progress();
        self.screen.request_redraw();
    }

    pub fn skip(&mut self) {
        if let Some(name) = self.player.skip() {
            self.log(format!("Skipped: {}", name));
            self.queue = self.player.names();
            self.progress = self.player.progress();
            self.screen.request_redraw();
        }
    }

    pub fn select_next(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        let i = match self.playlist_state.selected() {
            Some(i) if i + 1 < self.playlist.len() => i + 1,
            _ => 0,
        };
        self.playlist_state.select(Some(i));
    }

    pub fn select_prev(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        let i = match self.playlist_state.selected() {
            Some(0) | None => self.playlist.len() - 1,
            Some(i) => i - 1,
        };
        self.playlist_state.select(Some(i));
    }

    /// Pull whatever the refresh loop produced since the last frame
    ///
    /// Returns true when something needs to be redrawn.
    pub fn on_frame(&mut self) -> bool {
        let mut dirty = self.screen.take_redraw();
        if dirty {
            self.queue = self.screen.queue();
        }
        if let Some(progress) = self.progress_rx.take() {
            self.progress = progress;
            dirty = true;
        }

        let error = self.player.last_error();
        if error.is_some() && error != self.last_error {
            if let Some(e) = &error {
                self.log(format!("Decode error: {}", e));
            }
            dirty = true;
        }
        self.last_error = error;

        dirty
    }
}
