// Native binary for DakDash - Terminal UI mode

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    fs::OpenOptions,
    io,
    path::Path,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use dakdash::{
    api::{HttpTransport, TrackingClient},
    app::App,
    config::load,
    controller::TrackingController,
    fetch,
    keep_alive::KeepAlive,
    platform,
    recent::RecentSearches,
    router::Location,
    storage::{KeyValueStore, MemoryStore, SqliteStore},
    types::AppEvent,
    ui,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (safe to ignore if not found)
    let _ = dotenvy::dotenv();

    let cfg = load().context("Failed to load configuration")?;
    init_logging(&cfg.log_file)?;
    log::info!(
        "dakdash {} starting against {}",
        env!("CARGO_PKG_VERSION"),
        cfg.api_url
    );
    if std::env::var_os("DAKDASH_PRINT_CONFIG").is_some() {
        cfg.print_summary();
    }

    // Recent searches + theme; an unusable database only costs persistence
    let store: Arc<dyn KeyValueStore> = match SqliteStore::open(&cfg.db_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            log::error!("{e:#}; falling back to in-memory storage");
            Arc::new(MemoryStore::new())
        }
    };

    let client = Arc::new(TrackingClient::new(
        HttpTransport::new(&cfg.api_url),
        cfg.retry_policy(),
    ));

    // app + channels
    let (tx, rx) = unbounded_channel::<AppEvent>();
    let (fetch_tx, fetch_rx) = unbounded_channel();
    let fetch_task = tokio::spawn(fetch::run_tracking_fetch(
        Arc::clone(&client),
        fetch_rx,
        tx.clone(),
    ));
    let carriers_task = tokio::spawn(fetch::load_carriers(Arc::clone(&client), tx.clone()));

    let mut keep_alive = KeepAlive::new(
        Arc::clone(&client),
        &cfg.api_url,
        cfg.keep_alive_interval(),
    );
    keep_alive.start();

    let controller = TrackingController::new(
        fetch_tx,
        RecentSearches::new(Arc::clone(&store)),
        Location::new(cfg.initial_route.clone()),
    );
    let mut app = App::new(controller, store, cfg.default_carrier.clone(), cfg.render_fps);

    // Apply deep link route from CLI args (if provided)
    app.open_route(&cfg.initial_route);

    // terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // main loop
    let result = run_loop(&mut app, &mut terminal, rx).await;

    // cleanup
    keep_alive.stop();
    fetch_task.abort();
    carriers_task.abort();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    log::info!("dakdash exiting");
    result
}

/// stderr belongs to the terminal UI, so logs go to a file.
fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

async fn run_loop(
    app: &mut App,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut rx: UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let mut last_frame = Instant::now();

    loop {
        // frame budget (coalesced renders)
        let frame_ms = 1000u32.saturating_div(app.fps()) as u64;
        let budget = Duration::from_millis(frame_ms.max(1));
        let wait = budget.saturating_sub(last_frame.elapsed());

        // input or background events
        if event::poll(wait)? {
            if let Event::Key(k) = event::read()? {
                if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                    handle_key(app, k);
                }
            }
        }
        while let Ok(ev) = rx.try_recv() {
            app.on_event(ev);
        }

        if last_frame.elapsed() >= budget {
            terminal.draw(|f| ui::draw(f, app))?;
            last_frame = Instant::now();
        }
        if app.quit_flag() {
            break;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, k: KeyEvent) {
    match (k.code, k.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Char('q'), KeyModifiers::CONTROL) => {
            app.on_event(AppEvent::Quit);
        }

        // Request lifecycle
        (KeyCode::Enter, _) => {
            app.track();
        }
        (KeyCode::F(5), _) | (KeyCode::Char('r'), KeyModifiers::CONTROL) => app.refresh(),
        (KeyCode::Char('n'), KeyModifiers::CONTROL) => app.new_search(),
        (KeyCode::Esc, _) => app.dismiss(),

        // Search bar
        (KeyCode::Tab, _) => app.next_carrier(),
        (KeyCode::BackTab, _) => app.prev_carrier(),
        (KeyCode::Backspace, _) => app.input_backspace(),
        (KeyCode::Char('u'), KeyModifiers::CONTROL) => app.input_clear(),

        // Landing view
        (KeyCode::Up, _) => app.recent_up(),
        (KeyCode::Down, _) => app.recent_down(),
        (KeyCode::Char('l'), KeyModifiers::CONTROL) => app.clear_recent(),

        (KeyCode::Char('y'), KeyModifiers::CONTROL) => platform::copy_share_link(app),
        (KeyCode::Char('t'), KeyModifiers::CONTROL) => app.toggle_theme(),

        (KeyCode::Char(c), m) if !m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            app.input_add_char(c);
        }
        _ => {}
    }
}
