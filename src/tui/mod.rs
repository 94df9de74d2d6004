mod app;
mod ui;

pub use app::{App, BrowserRow, PlayerState, View};

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::browse::{BrowseController, Completion, LoadRequest};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::fetcher::{FetchError, PlaylistFetcher};
use crate::player;
use crate::playlist::{Channel, Dimension, PlaylistScheme};

/// Messages sent from background tasks to the UI
pub enum UiMessage {
    PlaylistLoaded {
        generation: u64,
        result: Result<Vec<Channel>, FetchError>,
    },
    SearchSettled(u64),
    PlayerExited,
    PlayerError(String),
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

pub async fn run(config: Config, catalog: Catalog) -> io::Result<()> {
    let fetcher = PlaylistFetcher::new(&config).map_err(io::Error::other)?;

    // Set up panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let browse = BrowseController::new(
        PlaylistScheme::new(&config.playlists.base_url),
        config.browse.page_size,
    );
    let mut app = App::new(catalog, browse);
    let (tx, mut rx) = mpsc::channel::<UiMessage>(32);

    let mut loader = Loader::new(Arc::new(fetcher), tx.clone());
    let result = run_app(&mut terminal, &mut app, &config, &mut loader, tx, &mut rx).await;
    loader.cancel();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

/// Runs playlist fetches in the background, one at a time. Starting a load
/// cancels the one in flight; the controller's generation check drops
/// anything that still slips through.
struct Loader {
    fetcher: Arc<PlaylistFetcher>,
    tx: mpsc::Sender<UiMessage>,
    in_flight: Option<CancellationToken>,
}

impl Loader {
    fn new(fetcher: Arc<PlaylistFetcher>, tx: mpsc::Sender<UiMessage>) -> Self {
        Self {
            fetcher,
            tx,
            in_flight: None,
        }
    }

    fn start(&mut self, request: LoadRequest) {
        self.cancel();

        let token = CancellationToken::new();
        self.in_flight = Some(token.clone());

        let fetcher = self.fetcher.clone();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let generation = request.generation;
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(generation, "playlist load cancelled");
                }
                result = fetcher.fetch(&request.location, Some(&request.context)) => {
                    let _ = tx.send(UiMessage::PlaylistLoaded { generation, result }).await;
                }
            }
        });
    }

    fn cancel(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    config: &Config,
    loader: &mut Loader,
    tx: mpsc::Sender<UiMessage>,
    rx: &mut mpsc::Receiver<UiMessage>,
) -> io::Result<()> {
    let debounce = Duration::from_millis(config.browse.search_debounce_ms);

    // Start on the all-channels playlist
    if let Some(request) = app.select_dimension(Dimension::All) {
        loader.start(request);
    }

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // Handle messages from background tasks
        while let Ok(msg) = rx.try_recv() {
            match msg {
                UiMessage::PlaylistLoaded { generation, result } => {
                    if app.browse.complete(generation, result) == Completion::Applied {
                        app.clamp_selection();
                    }
                }
                UiMessage::SearchSettled(seq) => {
                    if app.settle_search(seq) {
                        debug!(term = %app.search_input, "search applied");
                    }
                }
                UiMessage::PlayerExited => {
                    info!("player exited");
                    app.player = PlayerState::Stopped;
                }
                UiMessage::PlayerError(e) => {
                    app.player = PlayerState::Error(e);
                }
            }
        }

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Global quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    app.should_quit = true;
                }

                match app.view {
                    View::Channels => handle_channels_key(key, app, config, loader, &tx),
                    View::Browser => handle_browser_key(key, app, loader),
                    View::Search => handle_search_key(key, app, debounce, &tx),
                    View::Help => match key.code {
                        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
                            app.view = View::Channels;
                        }
                        _ => {}
                    },
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn dimension_key(c: char) -> Option<Dimension> {
    let index = c.to_digit(10)?.checked_sub(1)? as usize;
    Dimension::ALL.get(index).copied()
}

fn handle_channels_key(
    key: KeyEvent,
    app: &mut App,
    config: &Config,
    loader: &mut Loader,
    tx: &mpsc::Sender<UiMessage>,
) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('?') => app.view = View::Help,
        KeyCode::Char('/') => app.view = View::Search,
        KeyCode::Char('f') => app.cycle_filter(),
        KeyCode::Char('m') => {
            app.browse.load_more();
        }
        KeyCode::Char('r') => {
            if let Some(request) = app.retry() {
                loader.start(request);
            }
        }
        KeyCode::Char('b') if app.browse.dimension() != Dimension::All => {
            app.view = View::Browser;
        }
        KeyCode::Char(c) if dimension_key(c).is_some() => {
            if let Some(dimension) = dimension_key(c) {
                match app.select_dimension(dimension) {
                    Some(request) => loader.start(request),
                    // Nothing to load until an entry is picked
                    None => loader.cancel(),
                }
            }
        }
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.page_up(10),
        KeyCode::PageDown => app.page_down(10),
        KeyCode::Enter if !matches!(app.player, PlayerState::Playing(_)) => {
            if let Some(channel) = app.tune_selected() {
                app.player = PlayerState::Playing(channel.name.clone());
                spawn_player(config, channel, tx.clone());
            }
        }
        _ => {}
    }
}

fn handle_browser_key(key: KeyEvent, app: &mut App, loader: &mut Loader) {
    match key.code {
        KeyCode::Esc => {
            if !app.close_subdivisions() {
                app.view = View::Channels;
            }
        }
        KeyCode::Enter => {
            if let Some(request) = app.confirm_browser() {
                loader.start(request);
            }
        }
        KeyCode::Right | KeyCode::Tab => {
            app.open_subdivisions();
        }
        KeyCode::Left => {
            app.close_subdivisions();
        }
        KeyCode::Up => app.browser_previous(),
        KeyCode::Down => app.browser_next(),
        KeyCode::Backspace => app.browser_backspace(),
        KeyCode::Char(c) => app.browser_type(c),
        _ => {}
    }
}

fn handle_search_key(
    key: KeyEvent,
    app: &mut App,
    debounce: Duration,
    tx: &mpsc::Sender<UiMessage>,
) {
    let seq = match key.code {
        KeyCode::Esc => {
            app.search_clear();
            app.view = View::Channels;
            return;
        }
        KeyCode::Enter => {
            let seq = app.search_seq;
            app.settle_search(seq);
            app.view = View::Channels;
            return;
        }
        KeyCode::Backspace => app.search_backspace(),
        KeyCode::Char(c) => app.search_type(c),
        _ => return,
    };

    let tx = tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(debounce).await;
        let _ = tx.send(UiMessage::SearchSettled(seq)).await;
    });
}

fn spawn_player(config: &Config, channel: Channel, tx: mpsc::Sender<UiMessage>) {
    let command = config.player.command.clone();
    let args = config.player.args.clone();

    tokio::spawn(async move {
        match player::launch(&command, &args, &channel) {
            Ok(mut child) => {
                info!("player started, waiting for exit");
                let _ = child.wait().await;
                let _ = tx.send(UiMessage::PlayerExited).await;
            }
            Err(e) => {
                error!(error = %e, "failed to launch player");
                let _ = tx.send(UiMessage::PlayerError(e.to_string())).await;
            }
        }
    });
}
