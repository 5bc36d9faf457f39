// ============================================================================
// BPI Watch - Programme TUI
// ============================================================================
// Affiche le Bitcoin Price Index (Coindesk) : dernier prix de la devise
// sélectionnée, clôtures historiques, et détail multi-devises d'un jour.
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : render -> input -> update
// 3. Async dans sync : la boucle TUI est synchrone, le modèle vit sur le
//    runtime tokio (runtime.enter())
// ============================================================================

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use bpiwatch::aggregator::SnapshotHandle;
use bpiwatch::api::{CoinDeskApi, CoinDeskClient, FetchError, FetchPort};
use bpiwatch::app::{App, AppCommand};
use bpiwatch::models::{CurrencyCode, HistoricalSnapshot, SupportedCurrency};
use bpiwatch::ui::events::{
    is_down_event, is_enter_event, is_escape_event, is_faster_refresh_event, is_next_currency_event,
    is_previous_currency_event, is_quit_event, is_refresh_event, is_slower_refresh_event, is_up_event, Event,
    EventHandler,
};
use bpiwatch::ui::render;
use bpiwatch::{Config, PriceListModel, RowViewState};

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne fonctionnent pas une fois le TUI lancé : on log vers un
// fichier avec rotation quotidienne.
// ============================================================================

/// Répertoire des logs
///
/// - Linux : ~/.local/share/bpiwatch/logs
/// - macOS : ~/Library/Application Support/bpiwatch/logs
/// - sinon : ./logs
fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("bpiwatch").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialise le système de logging vers fichier
///
/// ```bash
/// tail -f ~/.local/share/bpiwatch/logs/bpiwatch.log.*
/// RUST_LOG=bpiwatch=trace cargo run
/// ```
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "bpiwatch.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true) // Les fetchs tournent sur les workers tokio
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bpiwatch=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée
// ============================================================================

fn main() -> Result<()> {
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!("BPI Watch starting up");
    let config = Config::from_env();
    info!(
        base_url = %config.base_url,
        currency = %config.default_currency,
        refresh_secs = config.refresh_interval.as_secs(),
        "Configuration loaded"
    );

    // CONCEPT RUST : runtime.enter()
    // - Le modèle fait des tokio::spawn depuis le thread principal (synchrone)
    // - Le guard rend le runtime "courant" pour ce thread
    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;
    let _guard = runtime.enter();

    let client = Arc::new(CoinDeskClient::new(&config).context("Échec de la création du client Coindesk")?);

    println!("📊 Chargement des devises...");
    let currencies = runtime.block_on(load_supported_currencies(client.as_ref()));

    let model = PriceListModel::new(Arc::clone(&client), config.default_currency.clone());
    model.set_refresh_rate(config.refresh_interval);
    model.start();

    let mut app = App::new(config.default_currency.clone(), config.refresh_interval);
    app.set_currencies(currencies);

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let events = EventHandler::new();
    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &model, &events);

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;
    model.stop();

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

/// Liste des devises de l'API ; en cas d'échec, les trois devises de
/// "currentprice.json"
async fn load_supported_currencies<P: FetchPort + ?Sized>(port: &P) -> Vec<SupportedCurrency> {
    match port.supported_currencies().await {
        Ok(currencies) => {
            info!(count = currencies.len(), "Supported currencies loaded");
            currencies
        }
        Err(e) => {
            warn!(error = %e, "Failed to load supported currencies, using defaults");
            [("USD", "United States Dollar"), ("GBP", "British Pound Sterling"), ("EUR", "Euro")]
                .into_iter()
                .filter_map(|(code, name)| {
                    CurrencyCode::parse(code).ok().map(|code| SupportedCurrency {
                        code,
                        display_name: name.to_string(),
                    })
                })
                .collect()
        }
    }
}

// ============================================================================
// Event Loop Principal
// ============================================================================

/// Récepteurs des sorties du modèle, recopiées dans App à chaque itération
struct ModelOutputs {
    rows: watch::Receiver<RowViewState>,
    refreshing: watch::Receiver<bool>,
    last_error: watch::Receiver<Option<FetchError>>,
}

impl ModelOutputs {
    fn sync(&mut self, app: &mut App) {
        if self.rows.has_changed().unwrap_or(false) {
            app.update_rows(self.rows.borrow_and_update().clone());
        }
        app.is_refreshing = *self.refreshing.borrow();
        app.last_error = self.last_error.borrow().as_ref().map(|e| e.to_string());
    }
}

/// Snapshot de l'écran DayDetail en cours de construction
struct DayDetail {
    handle: SnapshotHandle,
    updates: watch::Receiver<HistoricalSnapshot>,
}

fn run<P>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    model: &PriceListModel<P>,
    events: &EventHandler,
) -> Result<()>
where
    P: FetchPort + ?Sized + 'static,
{
    let mut outputs = ModelOutputs {
        rows: model.rows(),
        refreshing: model.is_refreshing(),
        last_error: model.last_error(),
    };
    let mut day_detail: Option<DayDetail> = None;

    while app.is_running() {
        // 0. SYNC : copie les sorties du modèle
        outputs.sync(app);
        if let Some(detail) = day_detail.as_mut() {
            if detail.updates.has_changed().unwrap_or(false) {
                app.update_day_detail(detail.updates.borrow_and_update().clone());
            }
        }

        // 1. RENDER
        terminal.draw(|frame| render(frame, app))?;

        // 2. INPUT
        match events.next() {
            Ok(event) => {
                if let Some(command) = handle_event(app, event) {
                    apply_command(app, model, command, &mut day_detail);
                }
            }
            Err(e) => error!(error = %e, "Failed to read terminal event"),
        }

        // L'écran DayDetail a été quitté : on abandonne le snapshot
        if app.is_on_price_list() {
            if let Some(detail) = day_detail.take() {
                debug!("Leaving day detail, aborting snapshot");
                detail.handle.abort();
            }
        }

        // 3. UPDATE
        app.tick();
    }

    Ok(())
}

/// Applique au modèle une commande issue du clavier
fn apply_command<P>(app: &mut App, model: &PriceListModel<P>, command: AppCommand, day_detail: &mut Option<DayDetail>)
where
    P: FetchPort + ?Sized + 'static,
{
    match command {
        AppCommand::Refresh => model.refresh(),
        AppCommand::SelectCurrency(code) => {
            // Le modèle ne re-télécharge pas seul : on enchaîne un refresh
            model.set_currency(code);
            model.refresh();
        }
        AppCommand::SetRefreshRate(period) => model.set_refresh_rate(period),
        AppCommand::OpenDay(date) => {
            let handle = model.historical_close_for_day(date);
            let updates = handle.subscribe();
            let symbols = model.latest_quote().map(|quote| quote.symbols()).unwrap_or_default();
            app.show_day_detail(handle.current(), symbols);
            if let Some(previous) = day_detail.replace(DayDetail { handle, updates }) {
                previous.handle.abort();
            }
        }
    }
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Met à jour App selon l'événement ; retourne la commande éventuelle pour
/// le modèle
fn handle_event(app: &mut App, event: Event) -> Option<AppCommand> {
    match event {
        Event::Tick => None,

        Event::Key(_) if is_quit_event(&event) => {
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
            None
        }

        Event::Key(_) => {
            app.cancel_quit();

            if app.is_on_day_detail() {
                if is_escape_event(&event) {
                    debug!("User returned to price list");
                    app.show_price_list();
                }
                return None;
            }

            if is_up_event(&event) {
                app.navigate_up();
                None
            } else if is_down_event(&event) {
                app.navigate_down();
                None
            } else if is_next_currency_event(&event) {
                let code = app.next_currency();
                info!(currency = %code, "User selected next currency");
                Some(AppCommand::SelectCurrency(code))
            } else if is_previous_currency_event(&event) {
                let code = app.previous_currency();
                info!(currency = %code, "User selected previous currency");
                Some(AppCommand::SelectCurrency(code))
            } else if is_refresh_event(&event) {
                info!("User requested refresh");
                Some(AppCommand::Refresh)
            } else if is_faster_refresh_event(&event) {
                Some(AppCommand::SetRefreshRate(app.faster_refresh()))
            } else if is_slower_refresh_event(&event) {
                Some(AppCommand::SetRefreshRate(app.slower_refresh()))
            } else if is_enter_event(&event) {
                let date = app.selected_date()?;
                info!(%date, "User opened day detail");
                Some(AppCommand::OpenDay(date))
            } else {
                None
            }
        }
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================

/// Configure le terminal en mode TUI (raw mode + alternate screen)
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal, même si la boucle a échoué
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
