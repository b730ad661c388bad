//! tcha-player: a terminal music player built on a sequential playback queue

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use tcha_player::audio::{NullOutput, OutputConfig, PlaybackStats};
use tcha_player::decode::DecoderRegistry;
use tcha_player::engine::{
    format_clock, Display, DisplayError, Mailbox, Progress, RefreshConfig, RefreshLoop,
};
use tcha_player::{library, Player, ProgressPublisher};

mod tui;

/// tcha-player - sequential terminal music player
#[derive(Parser)]
#[command(name = "tcha-player")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Music directory
    #[arg(value_name = "PATH", default_value = "music")]
    path: PathBuf,

    /// Audio requested per output callback, in milliseconds
    #[arg(long, default_value = "100")]
    period_ms: u64,

    /// Progress/queue refresh interval, in milliseconds
    #[arg(long, default_value = "1000")]
    refresh_ms: u64,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Log file used while the terminal UI owns the screen
    #[arg(long, default_value = "tcha-player.log")]
    log_file: PathBuf,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Interactive terminal UI (default)
    Tui,

    /// Queue every file in the library and play it through
    Play,

    /// List playable files in the library
    List,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui);

    init_logging(&cli, command)?;

    match command {
        Commands::Tui => run_tui(&cli),
        Commands::Play => run_headless(&cli),
        Commands::List => list(&cli.path),
    }
}

fn init_logging(cli: &Cli, command: Commands) -> anyhow::Result<()> {
    let level = if cli.verbose { "info" } else { "warn" };
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));

    // the TUI owns the terminal, so logs go to a file
    if command == Commands::Tui {
        let file = File::create(&cli.log_file)
            .with_context(|| format!("cannot create log file {}", cli.log_file.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

fn output_config(cli: &Cli) -> OutputConfig {
    OutputConfig {
        period: Duration::from_millis(cli.period_ms.max(1)),
        ..OutputConfig::default()
    }
}

fn refresh_config(cli: &Cli) -> RefreshConfig {
    RefreshConfig {
        period: Duration::from_millis(cli.refresh_ms.max(1)),
    }
}

/// Whichever output driver this build can use
enum Output {
    Null(NullOutput),
    #[cfg(feature = "cpal")]
    Device(tcha_player::audio::DeviceOutput),
}

impl Output {
    fn start(player: Player, config: &OutputConfig) -> anyhow::Result<Self> {
        if let Some(device) = Self::start_device(&player, config) {
            return Ok(device);
        }

        let output = NullOutput::start(player, config).context("failed to start output")?;
        Ok(Self::Null(output))
    }

    #[cfg(feature = "cpal")]
    fn start_device(player: &Player, config: &OutputConfig) -> Option<Self> {
        match tcha_player::audio::DeviceOutput::start(player.clone(), config) {
            Ok(device) => Some(Self::Device(device)),
            Err(e) => {
                log::warn!("Audio device unavailable ({}), using null output", e);
                None
            }
        }
    }

    #[cfg(not(feature = "cpal"))]
    fn start_device(_player: &Player, _config: &OutputConfig) -> Option<Self> {
        None
    }

    fn stats(&self) -> Arc<PlaybackStats> {
        match self {
            Self::Null(output) => output.stats(),
            #[cfg(feature = "cpal")]
            Self::Device(output) => output.stats(),
        }
    }
}

fn scan_library(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    library::scan(root).with_context(|| format!("cannot read music directory {}", root.display()))
}

fn list(root: &Path) -> anyhow::Result<()> {
    let files = scan_library(root)?;
    if files.is_empty() {
        println!("No audio files under {}", root.display());
        return Ok(());
    }

    for (i, path) in files.iter().enumerate() {
        println!("{:>3}. {}", i + 1, library::display_name(root, path));
    }
    println!("\n{} files", files.len());
    Ok(())
}

fn run_tui(cli: &Cli) -> anyhow::Result<()> {
    let files = scan_library(&cli.path)?;

    let player = Player::new();
    let publisher = ProgressPublisher::new();
    let _output = Output::start(player.clone(), &output_config(cli))?;

    let mut app = tui::App::new(player.clone(), cli.path.clone(), files, publisher.mailbox());
    let display = tui::ScreenDisplay(Arc::clone(&app.screen));
    let refresh = RefreshLoop::start(player, publisher, display, refresh_config(cli))
        .context("failed to start refresh loop")?;

    let outcome = tui::run(&mut app, &refresh);
    let refreshed = refresh.stop();

    outcome.context("terminal UI failed")?;
    refreshed.context("redraw failed")?;
    Ok(())
}

/// One status line per refresh on stderr
struct ConsoleDisplay {
    progress: Arc<Mailbox<Progress>>,
    current: Option<String>,
}

impl Display for ConsoleDisplay {
    fn sync_queue(&mut self, names: Vec<String>) {
        let head = names.into_iter().next();
        if head.is_some() && head != self.current {
            if let Some(name) = &head {
                eprintln!("\nNow playing: {}", name);
            }
        }
        self.current = head;
    }

    fn request_redraw(&mut self) -> Result<(), DisplayError> {
        let line = match self.progress.peek() {
            Some(Progress::Playing(state)) => format!(
                "\r{} {} / {} ({:>3}%)",
                if state.paused { "||" } else { ">" },
                format_clock(Some(state.elapsed)),
                format_clock(state.known_total()),
                state.percent,
            ),
            _ => format!("\r  {} / {}", format_clock(None), format_clock(None)),
        };

        let mut stderr = io::stderr().lock();
        stderr
            .write_all(line.as_bytes())
            .and_then(|_| stderr.flush())
            .map_err(|e| DisplayError::Redraw(e.to_string()))
    }
}

fn run_headless(cli: &Cli) -> anyhow::Result<()> {
    let files = scan_library(&cli.path)?;
    if files.is_empty() {
        anyhow::bail!("no audio files under {}", cli.path.display());
    }

    let player = Player::new();
    let registry = DecoderRegistry::default();
    for path in &files {
        match registry.open(path) {
            Ok(source) => player.add(source, library::display_name(&cli.path, path)),
            Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
        }
    }
    if player.is_empty() {
        anyhow::bail!("none of the {} files could be opened", files.len());
    }
    println!("Queued {} of {} files", player.len(), files.len());

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let publisher = ProgressPublisher::new();
    let display = ConsoleDisplay {
        progress: publisher.mailbox(),
        current: None,
    };
    let output = Output::start(player.clone(), &output_config(cli))?;
    let refresh = RefreshLoop::start(player.clone(), publisher, display, refresh_config(cli))
        .context("failed to start refresh loop")?;

    while running.load(Ordering::SeqCst) && !player.is_empty() {
        std::thread::sleep(Duration::from_millis(50));
    }
    if !running.load(Ordering::SeqCst) {
        eprintln!("\nPlayback interrupted.");
    }

    let refreshed = refresh.stop();
    let stats = output.stats().report();
    drop(output);

    eprintln!("\n{}", stats);
    if let Some(e) = player.last_error() {
        log::warn!("Last decode error: {}", e);
    }
    refreshed.context("status display failed")?;
    Ok(())
}
