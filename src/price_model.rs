// ============================================================================
// Modèle dérivé : liste des prix
// ============================================================================
// Combine trois entrées :
// - la devise sélectionnée (watch, modifiable de l'extérieur)
// - la cotation actuelle (RefreshableValue<Quote>)
// - la série historique de la devise sélectionnée (RefreshableValue<HistoricalSeries>)
//
// et publie un RowViewState recalculé EN ENTIER à chaque changement d'une
// entrée. Un timer optionnel rafraîchit la cotation à intervalle régulier.
//
// CONCEPTS RUST :
// 1. Une seule tâche "recombinaison" écrit l'état dérivé : pas de verrou sur
//    les lignes, pas de lecture à moitié mise à jour
// 2. tokio::select! sur plusieurs watch::Receiver
// 3. Cycle de vie explicite (start / stop) au lieu d'un démarrage caché au
//    premier abonnement
// ============================================================================

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument};

use crate::aggregator::{self, SnapshotHandle};
use crate::api::{CoinDeskApi, FetchError, FetchPort, HistoricalQuery};
use crate::models::{CurrencyCode, HistoricalSeries, Quote};
use crate::refreshable::RefreshableValue;

/// Devises incluses dans "currentprice.json" ; les autres passent par
/// "currentprice/{CODE}.json"
const DEFAULT_QUOTE_CURRENCIES: [&str; 3] = ["USD", "GBP", "EUR"];

// ============================================================================
// Lignes affichées
// ============================================================================

/// Ligne "dernier prix"
#[derive(Debug, Clone, PartialEq)]
pub struct LatestRow {
    pub symbol: String,
    /// Taux tel que formaté par l'API (ex: "9,481.8696")
    pub rate: String,
    pub updated_at: DateTime<Utc>,
}

/// Ligne de clôture historique
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalRow {
    pub symbol: String,
    pub price: String,
    pub date: NaiveDate,
}

/// Ce que l'utilisateur doit voir, recalculé à chaque changement
#[derive(Debug, Clone, PartialEq)]
pub struct RowViewState {
    pub currency: CurrencyCode,

    /// Section séparée, jamais fusionnée dans `historical`
    pub latest: Option<LatestRow>,

    /// Triées par date décroissante
    pub historical: Vec<HistoricalRow>,
}

impl RowViewState {
    pub fn empty(currency: CurrencyCode) -> Self {
        Self {
            currency,
            latest: None,
            historical: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_none() && self.historical.is_empty()
    }
}

/// Calcule les lignes à partir des trois entrées
pub fn build_rows(currency: &CurrencyCode, quote: Option<&Quote>, history: Option<&HistoricalSeries>) -> RowViewState {
    let price = quote.and_then(|q| q.price_for(currency));

    // Le symbole vient de la cotation ; à défaut on affiche le code
    let symbol = price
        .map(|p| p.display_symbol())
        .unwrap_or_else(|| currency.to_string());

    let latest = match (quote, price) {
        (Some(quote), Some(price)) => Some(LatestRow {
            symbol: symbol.clone(),
            rate: price.rate_display.clone(),
            updated_at: quote.updated_at,
        }),
        _ => None,
    };

    // Série d'une autre devise (sélection changée, refresh pas encore fait) :
    // ses prix ne sont pas affichés sous le symbole de la nouvelle devise
    let history = history.filter(|series| match &series.currency {
        Some(tagged) if tagged != currency => {
            debug!(selected = %currency, series = %tagged, "Historical series belongs to another currency");
            false
        }
        _ => true,
    });

    let mut historical: Vec<HistoricalRow> = history
        .map(|series| {
            series
                .dated_closes()
                .into_iter()
                .map(|(date, close)| HistoricalRow {
                    symbol: symbol.clone(),
                    price: format!("{:.4}", close),
                    date,
                })
                .collect()
        })
        .unwrap_or_default();
    historical.sort_by(|a, b| b.date.cmp(&a.date));

    RowViewState {
        currency: currency.clone(),
        latest,
        historical,
    }
}

// ============================================================================
// Recombinaison
// ============================================================================

/// Sorties publiées par la tâche de recombinaison
struct Outputs {
    rows: watch::Sender<RowViewState>,
    refreshing: watch::Sender<bool>,
    last_error: watch::Sender<Option<FetchError>>,
}

/// Entrées observées par la tâche de recombinaison
struct Inputs {
    currency: watch::Receiver<CurrencyCode>,
    quote: watch::Receiver<Option<Quote>>,
    history: watch::Receiver<Option<HistoricalSeries>>,
    quote_error: watch::Receiver<Option<FetchError>>,
    history_error: watch::Receiver<Option<FetchError>>,
    quote_busy: watch::Receiver<usize>,
    history_busy: watch::Receiver<usize>,
}

impl Inputs {
    fn publish_rows(&mut self, outputs: &Outputs) {
        let currency = self.currency.borrow_and_update().clone();
        let quote = self.quote.borrow_and_update().clone();
        let history = self.history.borrow_and_update().clone();

        let rows = build_rows(&currency, quote.as_ref(), history.as_ref());
        debug!(
            currency = %rows.currency,
            latest = rows.latest.is_some(),
            historical = rows.historical.len(),
            "Rows recomputed"
        );
        outputs.rows.send_replace(rows);
    }

    /// Erreur de la cotation en priorité, sinon celle de l'historique
    fn publish_error(&mut self, outputs: &Outputs) {
        let quote_error = self.quote_error.borrow_and_update().clone();
        let history_error = self.history_error.borrow_and_update().clone();
        let error = quote_error.or(history_error);

        outputs.last_error.send_if_modified(|current| {
            if *current == error {
                return false;
            }
            *current = error;
            true
        });
    }

    fn publish_busy(&mut self, outputs: &Outputs) {
        // Les deux récepteurs doivent être marqués lus
        let quote_busy = *self.quote_busy.borrow_and_update() > 0;
        let history_busy = *self.history_busy.borrow_and_update() > 0;
        let busy = quote_busy || history_busy;

        outputs.refreshing.send_if_modified(|current| {
            if *current == busy {
                return false;
            }
            *current = busy;
            true
        });
    }
}

/// Boucle de la tâche de recombinaison ; s'arrête quand une source disparaît
async fn recombine(mut inputs: Inputs, outputs: Arc<Outputs>) {
    inputs.publish_rows(&outputs);
    inputs.publish_error(&outputs);
    inputs.publish_busy(&outputs);

    loop {
        tokio::select! {
            changed = inputs.currency.changed() => {
                if changed.is_err() { break; }
                inputs.publish_rows(&outputs);
            }
            changed = inputs.quote.changed() => {
                if changed.is_err() { break; }
                inputs.publish_rows(&outputs);
            }
            changed = inputs.history.changed() => {
                if changed.is_err() { break; }
                inputs.publish_rows(&outputs);
            }
            changed = inputs.quote_error.changed() => {
                if changed.is_err() { break; }
                inputs.publish_error(&outputs);
            }
            changed = inputs.history_error.changed() => {
                if changed.is_err() { break; }
                inputs.publish_error(&outputs);
            }
            changed = inputs.quote_busy.changed() => {
                if changed.is_err() { break; }
                inputs.publish_busy(&outputs);
            }
            changed = inputs.history_busy.changed() => {
                if changed.is_err() { break; }
                inputs.publish_busy(&outputs);
            }
        }
    }

    debug!("Recombination task finished");
}

// ============================================================================
// Modèle
// ============================================================================

/// Le timer ne tourne que si le modèle est démarré ; sinon seule la période
/// est mémorisée
struct RefreshTimer {
    period: Duration,
    running: bool,
    task: Option<JoinHandle<()>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Modèle de la liste des prix
///
/// Le port est injecté par le constructeur : plusieurs modèles peuvent
/// coexister, chacun avec ses propres sources.
pub struct PriceListModel<P: ?Sized> {
    port: Arc<P>,
    currency: watch::Sender<CurrencyCode>,
    quote: RefreshableValue<Quote, FetchError>,
    history: RefreshableValue<HistoricalSeries, FetchError>,
    outputs: Arc<Outputs>,
    recombination: Mutex<Option<JoinHandle<()>>>,
    timer: Mutex<RefreshTimer>,
}

impl<P> PriceListModel<P>
where
    P: FetchPort + ?Sized + 'static,
{
    /// Crée le modèle ; rien ne tourne avant `start()`
    pub fn new(port: Arc<P>, default_currency: CurrencyCode) -> Self {
        let (currency, _) = watch::channel(default_currency.clone());

        let quote = {
            let port = Arc::clone(&port);
            let selector = currency.subscribe();
            RefreshableValue::new(move || {
                let port = Arc::clone(&port);
                let code = selector.borrow().clone();
                async move { fetch_quote(port.as_ref(), code).await }
            })
        };

        // La devise est lue au moment où le fetch part, pas à la création
        let history = {
            let port = Arc::clone(&port);
            let selector = currency.subscribe();
            RefreshableValue::new(move || {
                let port = Arc::clone(&port);
                let code = selector.borrow().clone();
                async move { port.historical_close(HistoricalQuery::for_currency(code)).await }
            })
        };

        let (rows, _) = watch::channel(RowViewState::empty(default_currency));
        let (refreshing, _) = watch::channel(false);
        let (last_error, _) = watch::channel(None);

        Self {
            port,
            currency,
            quote,
            history,
            outputs: Arc::new(Outputs {
                rows,
                refreshing,
                last_error,
            }),
            recombination: Mutex::new(None),
            timer: Mutex::new(RefreshTimer {
                period: Duration::ZERO,
                running: false,
                task: None,
            }),
        }
    }

    /// Démarre la recombinaison (et le timer s'il est configuré), puis lance
    /// un premier refresh. Sans effet si le modèle tourne déjà.
    pub fn start(&self) {
        {
            let mut task = lock(&self.recombination);
            if task.as_ref().is_some_and(|t| !t.is_finished()) {
                debug!("Price model already started");
                return;
            }
            *task = Some(tokio::spawn(recombine(self.inputs(), Arc::clone(&self.outputs))));
        }

        {
            let mut timer = lock(&self.timer);
            timer.running = true;
            if timer.task.is_none() && !timer.period.is_zero() {
                timer.task = Some(spawn_timer(self.quote.clone(), timer.period));
            }
        }

        let currency = self.currency.borrow().clone();
        info!(currency = %currency, "Price model started");
        self.refresh();
    }

    /// Arrête la recombinaison et le timer (la cadence est conservée)
    pub fn stop(&self) {
        let was_running = self.abort_tasks();
        if was_running {
            info!("Price model stopped");
        }
    }

    /// Rafraîchit la cotation ET l'historique de la devise courante
    pub fn refresh(&self) {
        self.quote.refresh();
        self.history.refresh();
    }

    /// Change la devise ; les lignes sont recalculées mais rien n'est
    /// re-téléchargé avant le prochain `refresh()`
    pub fn set_currency(&self, code: CurrencyCode) {
        let changed = self.currency.send_if_modified(|current| {
            if *current == code {
                return false;
            }
            *current = code.clone();
            true
        });
        if changed {
            info!(currency = %code, "Currency selected");
        }
    }

    /// Cadence du rafraîchissement automatique de la cotation
    ///
    /// Une durée positive (re)démarre le timer, dont le premier tick arrive
    /// une période complète plus tard. ZERO l'arrête. Modèle arrêté : la
    /// cadence est seulement mémorisée pour le prochain `start()`.
    #[instrument(skip(self))]
    pub fn set_refresh_rate(&self, period: Duration) {
        let mut timer = lock(&self.timer);
        if let Some(task) = timer.task.take() {
            task.abort();
        }
        timer.period = period;

        if period.is_zero() {
            info!("Refresh timer stopped");
            return;
        }
        if !timer.running {
            debug!(period_secs = period.as_secs(), "Model stopped, refresh rate stored");
            return;
        }

        timer.task = Some(spawn_timer(self.quote.clone(), period));
        info!(period_secs = period.as_secs(), "Refresh timer started");
    }

    pub fn refresh_rate(&self) -> Duration {
        lock(&self.timer).period
    }

    /// Dernière cotation reçue (None avant le premier succès)
    pub fn latest_quote(&self) -> Option<Quote> {
        self.quote.latest_value()
    }

    /// Clôtures d'un jour pour toutes les devises de la dernière cotation
    /// (ou la seule devise sélectionnée si aucune cotation n'est arrivée)
    pub fn historical_close_for_day(&self, date: NaiveDate) -> SnapshotHandle {
        let currencies = match self.quote.latest_value() {
            Some(quote) => quote.currencies(),
            None => vec![self.currency.borrow().clone()],
        };
        aggregator::historical_close_for_day(Arc::clone(&self.port), currencies, date)
    }

    fn inputs(&self) -> Inputs {
        Inputs {
            currency: self.currency.subscribe(),
            quote: self.quote.values(),
            history: self.history.values(),
            quote_error: self.quote.errors(),
            history_error: self.history.errors(),
            quote_busy: self.quote.in_flight(),
            history_busy: self.history.in_flight(),
        }
    }
}

impl<P: ?Sized> PriceListModel<P> {
    pub fn rows(&self) -> watch::Receiver<RowViewState> {
        self.outputs.rows.subscribe()
    }

    /// Vrai tant qu'un refresh (cotation ou historique) est en cours
    pub fn is_refreshing(&self) -> watch::Receiver<bool> {
        self.outputs.refreshing.subscribe()
    }

    pub fn last_error(&self) -> watch::Receiver<Option<FetchError>> {
        self.outputs.last_error.subscribe()
    }

    pub fn currency(&self) -> watch::Receiver<CurrencyCode> {
        self.currency.subscribe()
    }

    fn abort_tasks(&self) -> bool {
        let recombination = lock(&self.recombination).take();
        let timer = {
            let mut timer = lock(&self.timer);
            timer.running = false;
            timer.task.take()
        };

        let running = recombination.is_some() || timer.is_some();
        for task in recombination.into_iter().chain(timer) {
            task.abort();
        }
        running
    }
}

impl<P: ?Sized> Drop for PriceListModel<P> {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

/// Cotation incluant `code`
async fn fetch_quote<P>(port: &P, code: CurrencyCode) -> Result<Quote, FetchError>
where
    P: FetchPort + ?Sized,
{
    if DEFAULT_QUOTE_CURRENCIES.contains(&code.as_str()) {
        port.current_price().await
    } else {
        port.current_price_for(code).await
    }
}

/// Tâche du timer : un refresh de la cotation par période
fn spawn_timer(quote: RefreshableValue<Quote, FetchError>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            debug!("Refresh timer tick");
            quote.refresh();
        }
    })
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CoinDeskRequest, Payload};
    use crate::models::fixtures::{CURRENT_PRICE_JSON, HISTORICAL_CLOSE_JSON, TWO_DAY_HISTORY_JSON};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Stub : sert les fixtures, compte les requêtes, peut tomber en panne
    #[derive(Default)]
    struct CountingPort {
        quotes: AtomicUsize,
        histories: AtomicUsize,
        offline: AtomicBool,
    }

    impl CountingPort {
        fn quotes(&self) -> usize {
            self.quotes.load(Ordering::SeqCst)
        }

        fn histories(&self) -> usize {
            self.histories.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FetchPort for CountingPort {
        async fn execute(&self, request: &CoinDeskRequest) -> Result<String, FetchError> {
            let body = match request {
                CoinDeskRequest::CurrentPrice | CoinDeskRequest::CurrentPriceFor { .. } => {
                    self.quotes.fetch_add(1, Ordering::SeqCst);
                    CURRENT_PRICE_JSON
                }
                CoinDeskRequest::HistoricalClose(_) => {
                    self.histories.fetch_add(1, Ordering::SeqCst);
                    HISTORICAL_CLOSE_JSON
                }
                CoinDeskRequest::SupportedCurrencies => "[]",
            };
            if self.offline.load(Ordering::SeqCst) {
                return Err(FetchError::transport("offline"));
            }
            Ok(body.to_string())
        }
    }

    fn code(raw: &str) -> CurrencyCode {
        CurrencyCode::parse(raw).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn wait_until<T>(rx: &mut watch::Receiver<T>, predicate: impl FnMut(&T) -> bool) {
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for model state")
            .map(|_| ())
            .expect("model output closed");
    }

    async fn eventually(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("condition never met");
    }

    fn loaded(rows: &RowViewState) -> bool {
        rows.latest.is_some() && !rows.historical.is_empty()
    }

    #[test]
    fn test_latest_row_for_selected_currency_only() {
        let mut quote = Quote::decode(CURRENT_PRICE_JSON).unwrap();
        quote.prices.remove(&code("GBP"));

        let rows = build_rows(&CurrencyCode::eur(), Some(&quote), None);
        let latest = rows.latest.unwrap();
        assert_eq!(latest.symbol, "€");
        assert_eq!(latest.rate, "9,481.8696");
        assert_eq!(latest.updated_at, quote.updated_at);
        assert!(!latest.rate.contains("10,666"));
        assert!(rows.historical.is_empty());
    }

    #[test]
    fn test_historical_rows_sorted_newest_first() {
        let quote = Quote::decode(CURRENT_PRICE_JSON).unwrap();
        let history = HistoricalSeries::decode(TWO_DAY_HISTORY_JSON).unwrap();

        let rows = build_rows(&CurrencyCode::usd(), Some(&quote), Some(&history));
        let dates: Vec<NaiveDate> = rows.historical.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(2019, 7, 18), day(2019, 7, 17)]);
        assert_eq!(rows.historical[0].price, "10636.9100");
        assert_eq!(rows.historical[1].price, "9692.7067");
        assert_eq!(rows.historical[0].symbol, "$");
        // La ligne "latest" reste à part, même si la date coïncide
        assert!(rows.latest.is_some());
        assert_eq!(rows.historical.len(), 2);
    }

    #[test]
    fn test_undated_keys_are_skipped() {
        let history = HistoricalSeries::decode(
            r#"{ "bpi": { "not-a-date": 1.0, "2019-07-18": 10636.91 },
                 "time": { "updated": "x", "updatedISO": "2019-07-19T00:03:00+00:00" } }"#,
        )
        .unwrap();

        let rows = build_rows(&CurrencyCode::usd(), None, Some(&history));
        assert_eq!(rows.historical.len(), 1);
        assert_eq!(rows.historical[0].date, day(2019, 7, 18));
        // Sans cotation : pas de ligne latest, symbole = code
        assert!(rows.latest.is_none());
        assert_eq!(rows.historical[0].symbol, "USD");
    }

    #[test]
    fn test_history_of_another_currency_is_hidden() {
        let quote = Quote::decode(CURRENT_PRICE_JSON).unwrap();
        let history = HistoricalSeries::decode(TWO_DAY_HISTORY_JSON)
            .unwrap()
            .with_currency(CurrencyCode::usd());

        // Sélection passée à EUR, série encore celle de USD
        let rows = build_rows(&CurrencyCode::eur(), Some(&quote), Some(&history));
        assert!(rows.historical.is_empty());
        assert_eq!(rows.latest.unwrap().symbol, "€");

        let rows = build_rows(&CurrencyCode::usd(), Some(&quote), Some(&history));
        assert_eq!(rows.historical.len(), 2);
        assert_eq!(rows.historical[0].symbol, "$");
    }

    #[test]
    fn test_currency_absent_from_quote() {
        let quote = Quote::decode(CURRENT_PRICE_JSON).unwrap();
        let rows = build_rows(&code("JPY"), Some(&quote), None);
        assert!(rows.is_empty());
        assert_eq!(rows.currency.as_str(), "JPY");
    }

    #[tokio::test]
    async fn test_model_publishes_rows() {
        let port = Arc::new(CountingPort::default());
        let model = PriceListModel::new(Arc::clone(&port), CurrencyCode::eur());
        let mut rows = model.rows();
        let mut refreshing = model.is_refreshing();

        assert!(rows.borrow().is_empty());
        model.start();
        wait_until(&mut rows, loaded).await;
        wait_until(&mut refreshing, |busy| !busy).await;

        let state = rows.borrow().clone();
        assert_eq!(state.currency, CurrencyCode::eur());
        assert_eq!(state.latest.as_ref().unwrap().rate, "9,481.8696");
        assert_eq!(state.historical.len(), 31);
        assert_eq!(state.historical[0].date, day(2019, 7, 18));
        assert_eq!(state.historical[0].symbol, "€");
        assert!(model.last_error().borrow().is_none());

        model.stop();
    }

    #[tokio::test]
    async fn test_currency_change_recombines_without_refetch() {
        let port = Arc::new(CountingPort::default());
        let model = PriceListModel::new(Arc::clone(&port), CurrencyCode::eur());
        let mut rows = model.rows();
        let mut refreshing = model.is_refreshing();

        model.start();
        wait_until(&mut rows, loaded).await;
        wait_until(&mut refreshing, |busy| !busy).await;
        assert_eq!((port.quotes(), port.histories()), (1, 1));

        model.set_currency(CurrencyCode::usd());
        wait_until(&mut rows, |r| r.currency == CurrencyCode::usd()).await;
        assert_eq!(rows.borrow().latest.as_ref().unwrap().rate, "10,666.5500");
        // L'historique en cache est celui de EUR : masqué jusqu'au refresh
        assert!(rows.borrow().historical.is_empty());
        assert_eq!((port.quotes(), port.histories()), (1, 1));

        // Un refresh explicite re-télécharge pour la nouvelle devise
        model.refresh();
        eventually(|| port.quotes() == 2 && port.histories() == 2).await;
        wait_until(&mut rows, loaded).await;
        assert_eq!(rows.borrow().historical[0].symbol, "$");
    }

    #[tokio::test]
    async fn test_errors_keep_last_rows() {
        let port = Arc::new(CountingPort::default());
        let model = PriceListModel::new(Arc::clone(&port), CurrencyCode::eur());
        let mut rows = model.rows();
        let mut errors = model.last_error();

        model.start();
        wait_until(&mut rows, loaded).await;

        port.offline.store(true, Ordering::SeqCst);
        model.refresh();
        wait_until(&mut errors, |e| e.is_some()).await;
        assert!(errors.borrow().as_ref().unwrap().is_transport());
        assert!(loaded(&rows.borrow()));

        port.offline.store(false, Ordering::SeqCst);
        model.refresh();
        wait_until(&mut errors, |e| e.is_none()).await;
        assert!(loaded(&rows.borrow()));
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        let port = Arc::new(CountingPort::default());
        let model = PriceListModel::new(Arc::clone(&port), CurrencyCode::eur());
        let mut refreshing = model.is_refreshing();
        let mut rows = model.rows();

        model.start();
        model.start();
        wait_until(&mut rows, loaded).await;
        wait_until(&mut refreshing, |busy| !busy).await;
        assert_eq!(port.quotes(), 1);

        model.stop();
        model.stop();
        model.start();
        eventually(|| port.quotes() == 2).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_timer_drives_quote() {
        let port = Arc::new(CountingPort::default());
        let model = PriceListModel::new(Arc::clone(&port), CurrencyCode::eur());

        model.set_refresh_rate(Duration::from_secs(10));
        assert_eq!(model.refresh_rate(), Duration::from_secs(10));

        // Avant start() : aucun fetch
        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(port.quotes(), 0);

        // start() : refresh initial, puis premier tick une période plus tard
        model.start();
        time::sleep(Duration::from_secs(9)).await;
        assert_eq!((port.quotes(), port.histories()), (1, 1));
        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(port.quotes(), 2);
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(port.quotes(), 3);

        // Le timer ne touche pas à l'historique
        assert_eq!(port.histories(), 1);

        model.set_refresh_rate(Duration::ZERO);
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(port.quotes(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_changing_rate_restarts_timer() {
        let port = Arc::new(CountingPort::default());
        let model = PriceListModel::new(Arc::clone(&port), CurrencyCode::eur());
        model.start();

        model.set_refresh_rate(Duration::from_secs(10));
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(port.quotes(), 1);
        model.set_refresh_rate(Duration::from_secs(10));

        time::sleep(Duration::from_secs(6)).await;
        assert_eq!(port.quotes(), 1);
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(port.quotes(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_model_ignores_rate_changes() {
        let port = Arc::new(CountingPort::default());
        let model = PriceListModel::new(Arc::clone(&port), CurrencyCode::eur());

        model.start();
        eventually(|| port.quotes() == 1 && port.histories() == 1).await;
        model.stop();

        // La cadence est mémorisée, mais aucun timer ne part
        model.set_refresh_rate(Duration::from_secs(10));
        assert_eq!(model.refresh_rate(), Duration::from_secs(10));
        time::sleep(Duration::from_secs(35)).await;
        assert_eq!(port.quotes(), 1);

        // start() réarme le timer avec la cadence mémorisée
        model.start();
        time::sleep(Duration::from_secs(11)).await;
        assert_eq!(port.quotes(), 3);
        assert_eq!(port.histories(), 2);
    }

    #[tokio::test]
    async fn test_day_detail_uses_quote_currencies() {
        let port = Arc::new(CountingPort::default());
        let model = PriceListModel::new(Arc::clone(&port), CurrencyCode::eur());
        let mut rows = model.rows();

        model.start();
        wait_until(&mut rows, loaded).await;

        let snapshot = model.historical_close_for_day(day(2019, 7, 18)).finished().await;
        assert_eq!(snapshot.prices.len(), 3);
        assert_eq!(snapshot.price(&code("GBP")), Some(10_636.91));
        assert!(snapshot.is_complete());
    }
}
