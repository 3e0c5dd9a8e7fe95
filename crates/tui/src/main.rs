mod app;
mod render;
mod theme;
mod ui;

use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tracing_subscriber::EnvFilter;

use app::App;
use taskscope_api_client::{ApiClient, PushClient};
use taskscope_sync::{NetTransportProvider, SessionRegistry};

/// Terminal monitor for live taskscope activity feeds.
#[derive(Debug, Parser)]
#[command(name = "taskscope-tui", version, about)]
struct Cli {
    /// Backend server base URL.
    #[arg(long, default_value = "http://localhost:8080")]
    server: String,

    /// Poll interval in seconds (fallback transport).
    #[arg(long, default_value_t = 2)]
    poll_interval: u64,

    /// Override the snapshot file location.
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Task ids to pin on startup (restored feeds are kept too).
    #[arg(value_name = "TASK_ID")]
    tasks: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let rt = tokio::runtime::Runtime::new()?;

    let api = Arc::new(ApiClient::new(&cli.server, Duration::from_secs(10))?);
    let push = PushClient::new(&cli.server);
    let provider = Arc::new(
        NetTransportProvider::new(Arc::clone(&api), push, rt.handle().clone())
            .with_poll_interval(Duration::from_secs(cli.poll_interval.max(1))),
    );

    let snapshot_path = match cli.state_file {
        Some(path) => path,
        None => taskscope_store::snapshot_path()?,
    };

    let (mut registry, events_rx) = SessionRegistry::new(provider, snapshot_path);
    registry.restore();
    for id in &cli.tasks {
        registry.register_feed(id, id);
    }

    let server_ok = rt.block_on(api.health()).is_ok();
    let mut app = App::new(registry, events_rx, cli.server.clone(), server_ok);

    // Terminal setup
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    // Teardown cancels every transport and forces a final snapshot write.
    app.registry.shutdown();

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.drain_events();
        app.registry.flush_if_dirty();

        terminal.draw(|frame| ui::draw(frame, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Log to a file under the config dir; stdout belongs to the terminal UI.
fn init_tracing() {
    let Ok(dir) = taskscope_store::config_dir() else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::File::create(dir.join("tui.log")) else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("taskscope_sync=info".parse().unwrap())
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .try_init();
}
