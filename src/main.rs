mod app;
mod config;
mod constants;
mod display;
mod edamam;
mod graphics;
mod input;
mod media;
mod playback;
mod present;
mod recipes;
mod session;
mod studio;
mod theme;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use directories::ProjectDirs;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use config::Config;
use display::CliDisplayMode;
use media::MediaResolver;
use recipes::RecipeBook;
use session::Services;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Display mode: 'auto', 'direct', or 'ascii' (default: auto-detect)
  #[arg(short, long, default_value = "auto")]
  display_mode: CliDisplayMode,

  /// Log filter used when RUST_LOG is unset, e.g. 'debug' or 'pantry=trace'
  #[arg(long, default_value = "info")]
  log_level: String,

  /// Do not download frame or recipe card images; show frame URLs instead
  #[arg(long)]
  no_frames: bool,

  /// Print shell completions and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<Shell>,
}

// --- Logging ---

/// Log to a daily file under the data dir; the terminal belongs to the UI.
/// The returned guard flushes the writer on drop.
fn init_logging(level: &str) -> Option<WorkerGuard> {
  let dirs = ProjectDirs::from("", "", "pantry")?;
  let log_dir = dirs.data_local_dir().join("logs");
  std::fs::create_dir_all(&log_dir).ok()?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, "pantry.log"));
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
  Some(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), "pantry", &mut std::io::stdout());
    return Ok(());
  }

  let _guard = init_logging(&args.log_level);
  info!(version = env!("CARGO_PKG_VERSION"), "pantry starting");

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, args).await;
  ratatui::restore();
  result
}

fn services(prefs: &Config, download_frames: bool) -> Services {
  let credentials = prefs.clone().with_env(|key| std::env::var(key).ok()).credentials();
  Services {
    recipes: Arc::new(RecipeBook::sample()),
    resolver: Arc::new(MediaResolver::standard(Client::new(), &credentials)),
    client: download_frames.then(Client::new),
  }
}

async fn run(terminal: &mut DefaultTerminal, args: Args) -> Result<()> {
  let display_mode = display::resolve_display_mode(args.display_mode);
  let prefs = Config::load();
  let services = services(&prefs, !args.no_frames);
  let mut app = App::new(display_mode, services, prefs);
  info!(display_mode = display_mode.label(), "terminal ready");

  loop {
    app.check_pending();
    app.expire_messages();

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(Duration::from_millis(50))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  app.close_detail();
  info!("pantry exiting");
  Ok(())
}
