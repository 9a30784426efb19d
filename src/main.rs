mod api;
mod app;
mod config;
mod console;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{ExecuteRequest, PluaClient, RuntimeApi};
use app::App;
use config::AppConfig;
use console::{execution, status, LineKind, OutputLine, Tab};

#[derive(Parser, Debug)]
#[command(name = "plua-console")]
#[command(version = "0.1.0")]
#[command(about = "A terminal console for a plua Lua runtime")]
struct Args {
    /// Base URL of the plua runtime API
    #[arg(short, long, env = "PLUA_URL")]
    url: Option<String>,

    /// Use this config file instead of the default one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tab to open on start (repl, api, status)
    #[arg(short, long, default_value = "repl")]
    tab: String,

    /// Execute a snippet of Lua code and print the result
    #[arg(short, long, conflicts_with = "file")]
    exec: Option<String>,

    /// Execute a Lua file and print the result
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Print runtime info and status as JSON
    #[arg(short, long)]
    status: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let headless = args.exec.is_some() || args.file.is_some() || args.status;

    init_logging(headless);

    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load()?,
    };
    if let Some(url) = &args.url {
        config = config.with_base_url(url);
    }

    let initial_tab: Tab = args.tab.parse()?;
    let api: Arc<dyn RuntimeApi> = Arc::new(PluaClient::new(&config.base_url, config.client_timeout()));

    // Handle CLI-only commands
    if args.status {
        return print_status(api.as_ref()).await;
    }

    if let Some(path) = &args.file {
        let code = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return run_once(api.as_ref(), &config, code).await;
    }

    if let Some(code) = args.exec {
        return run_once(api.as_ref(), &config, code).await;
    }

    // Run TUI
    run_tui(api, &config, initial_tab).await
}

/// The TUI owns the terminal, so logs go to a file unless running headless
fn init_logging(headless: bool) {
    let filter = tracing_subscriber::EnvFilter::from_default_env();

    if headless {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .with(filter)
            .init();
        return;
    }

    let log_file = dirs::cache_dir()
        .map(|dir| dir.join("plua-console"))
        .and_then(|dir| std::fs::create_dir_all(&dir).ok().map(|_| dir.join("console.log")))
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    match log_file {
        Some(file) => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .with(filter)
            .init(),
        None => tracing_subscriber::registry().with(filter).init(),
    }
}

async fn print_status(api: &dyn RuntimeApi) -> Result<()> {
    let snapshot = status::fetch_snapshot(api)
        .await
        .context("Failed to load status data")?;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

async fn run_once(api: &dyn RuntimeApi, config: &AppConfig, code: String) -> Result<()> {
    let code = code.trim().to_string();
    if code.is_empty() {
        anyhow::bail!("Nothing to execute");
    }

    let request = ExecuteRequest::new(code.clone()).with_timeout(config.exec_timeout_secs);
    let outcome = execution::run_execution(api, &request, config.client_timeout()).await;

    let mut lines = vec![OutputLine::input(code)];
    lines.extend(execution::outcome_lines(&outcome));

    let mut failed = false;
    for line in &lines {
        match line.kind {
            LineKind::Input => println!("> {}", line.text.replace('\n', "\n  ")),
            LineKind::Error => {
                failed = true;
                eprintln!("{}", line.text);
            }
            LineKind::Result | LineKind::Info => println!("{}", line.text),
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_tui(api: Arc<dyn RuntimeApi>, config: &AppConfig, initial_tab: Tab) -> Result<()> {
    // Restore the terminal even if something panics
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(info);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(api, config);
    app.start(initial_tab);
    tracing::info!("Console started against {}", config.base_url);

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // Keep the poll short so background results show up promptly
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    // Handle key and catch any errors to prevent crashes
                    if let Err(e) = app.handle_key(key) {
                        app.status_message = Some(format!("Error: {}", e));
                    }
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }

        // Let spawned requests make progress, then pick up their results
        tokio::task::yield_now().await;
        app.drain_events();
        app.tick();
    }
}
