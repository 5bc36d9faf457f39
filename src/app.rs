// ============================================================================
// Structure : App
// ============================================================================
// État de l'interface TUI. App ne parle jamais au réseau : elle reçoit des
// copies des sorties du PriceListModel (lignes, busy, erreur) et traduit les
// touches en commandes que main.rs applique au modèle.
//
// CONCEPTS RUST :
// 1. State Management : tout l'état affiché vit dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;

use crate::models::{CurrencyCode, HistoricalSnapshot, SupportedCurrency};
use crate::price_model::RowViewState;

/// Cadences proposées avec + et - (ZERO = rafraîchissement manuel)
pub const REFRESH_PRESETS: [Duration; 5] = [
    Duration::ZERO,
    Duration::from_secs(15),
    Duration::from_secs(30),
    Duration::from_secs(60),
    Duration::from_secs(300),
];

/// Frames de l'indicateur "refresh en cours"
const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

// ============================================================================
// Enum : Screen
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Dernier prix + clôtures historiques de la devise sélectionnée
    PriceList,

    /// Clôtures d'un jour pour toutes les devises (se remplit au fil des
    /// réponses)
    DayDetail,
}

/// Commandes à appliquer au modèle, produites par la gestion des touches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Refresh,
    SelectCurrency(CurrencyCode),
    SetRefreshRate(Duration),
    OpenDay(NaiveDate),
}

/// État principal de l'application
pub struct App {
    pub running: bool,

    pub current_screen: Screen,

    /// Two-step quit : première pression de 'q' = demande, seconde = sortie
    pub confirm_quit: bool,

    /// Devises proposées au cyclage [ / ]
    pub currencies: Vec<SupportedCurrency>,

    /// Index de la devise sélectionnée dans `currencies`
    pub currency_index: usize,

    /// Dernière copie des lignes publiées par le modèle
    pub rows: RowViewState,

    pub is_refreshing: bool,

    /// Message de la dernière erreur (None après un refresh réussi)
    pub last_error: Option<String>,

    pub refresh_rate: Duration,

    /// Ligne historique sélectionnée (pour Enter)
    pub selected_row: usize,

    /// Snapshot affiché sur l'écran DayDetail
    pub day_detail: Option<HistoricalSnapshot>,

    /// Symboles des devises (ex: "€"), tirés de la dernière cotation
    pub day_symbols: BTreeMap<CurrencyCode, String>,

    spinner_frame: usize,
}

impl App {
    /// Crée l'état initial pour une devise et une cadence
    ///
    /// La liste des devises contient au moins la devise de départ ; elle est
    /// complétée par `set_currencies` une fois la liste de l'API chargée.
    pub fn new(currency: CurrencyCode, refresh_rate: Duration) -> Self {
        Self {
            running: true,
            current_screen: Screen::PriceList,
            confirm_quit: false,
            currencies: vec![SupportedCurrency {
                code: currency.clone(),
                display_name: currency.to_string(),
            }],
            currency_index: 0,
            rows: RowViewState::empty(currency),
            is_refreshing: false,
            last_error: None,
            refresh_rate,
            selected_row: 0,
            day_detail: None,
            day_symbols: BTreeMap::new(),
            spinner_frame: 0,
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Tick : fait tourner le spinner pendant un refresh
    pub fn tick(&mut self) {
        if self.is_refreshing {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER.len();
        }
    }

    pub fn spinner(&self) -> &'static str {
        if self.is_refreshing {
            SPINNER[self.spinner_frame]
        } else {
            " "
        }
    }

    // ========================================================================
    // Devises
    // ========================================================================

    /// Remplace la liste des devises en gardant la sélection courante
    pub fn set_currencies(&mut self, mut currencies: Vec<SupportedCurrency>) {
        let selected = self.selected_currency();
        currencies.sort_by(|a, b| a.code.cmp(&b.code));
        currencies.dedup_by(|a, b| a.code == b.code);

        self.currency_index = match currencies.iter().position(|c| c.code == selected) {
            Some(index) => index,
            None => {
                let index = currencies.partition_point(|c| c.code < selected);
                currencies.insert(
                    index,
                    SupportedCurrency {
                        display_name: selected.to_string(),
                        code: selected,
                    },
                );
                index
            }
        };
        self.currencies = currencies;
    }

    pub fn selected_currency(&self) -> CurrencyCode {
        self.currencies
            .get(self.currency_index)
            .map(|c| c.code.clone())
            .unwrap_or_else(|| self.rows.currency.clone())
    }

    pub fn selected_currency_name(&self) -> &str {
        self.currencies
            .get(self.currency_index)
            .map(|c| c.display_name.as_str())
            .unwrap_or("")
    }

    /// Passe à la devise suivante (cycle)
    pub fn next_currency(&mut self) -> CurrencyCode {
        if !self.currencies.is_empty() {
            self.currency_index = (self.currency_index + 1) % self.currencies.len();
        }
        self.selected_currency()
    }

    pub fn previous_currency(&mut self) -> CurrencyCode {
        if !self.currencies.is_empty() {
            let len = self.currencies.len();
            self.currency_index = (self.currency_index + len - 1) % len;
        }
        self.selected_currency()
    }

    // ========================================================================
    // Lignes
    // ========================================================================

    /// Nouvelles lignes publiées par le modèle
    pub fn update_rows(&mut self, rows: RowViewState) {
        self.rows = rows;
        let max_index = self.rows.historical.len().saturating_sub(1);
        self.selected_row = self.selected_row.min(max_index);
    }

    pub fn navigate_up(&mut self) {
        self.selected_row = self.selected_row.saturating_sub(1);
    }

    pub fn navigate_down(&mut self) {
        let max_index = self.rows.historical.len().saturating_sub(1);
        self.selected_row = (self.selected_row + 1).min(max_index);
    }

    /// Date de la ligne historique sélectionnée
    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.rows.historical.get(self.selected_row).map(|row| row.date)
    }

    // ========================================================================
    // Cadence de rafraîchissement
    // ========================================================================

    /// Preset suivant (plus rapide), sans boucler
    ///
    /// "Plus rapide" = période plus courte, mais jamais ZERO (qui désactive).
    pub fn faster_refresh(&mut self) -> Duration {
        let current = self.preset_index();
        if current > 1 {
            self.refresh_rate = REFRESH_PRESETS[current - 1];
        } else if current == 0 {
            self.refresh_rate = REFRESH_PRESETS[REFRESH_PRESETS.len() - 1];
        }
        self.refresh_rate
    }

    /// Preset suivant (plus lent) ; au-delà du plus lent, on passe en manuel
    pub fn slower_refresh(&mut self) -> Duration {
        let current = self.preset_index();
        self.refresh_rate = match current {
            0 => Duration::ZERO,
            i if i + 1 < REFRESH_PRESETS.len() => REFRESH_PRESETS[i + 1],
            _ => Duration::ZERO,
        };
        self.refresh_rate
    }

    /// Index du preset le plus proche de la cadence courante
    fn preset_index(&self) -> usize {
        REFRESH_PRESETS
            .iter()
            .position(|p| *p >= self.refresh_rate)
            .unwrap_or(REFRESH_PRESETS.len() - 1)
    }

    pub fn refresh_label(&self) -> String {
        if self.refresh_rate.is_zero() {
            "manuel".to_string()
        } else {
            format!("{}s", self.refresh_rate.as_secs())
        }
    }

    // ========================================================================
    // Écrans
    // ========================================================================

    pub fn show_day_detail(&mut self, snapshot: HistoricalSnapshot, symbols: BTreeMap<CurrencyCode, String>) {
        self.day_detail = Some(snapshot);
        self.day_symbols = symbols;
        self.current_screen = Screen::DayDetail;
    }

    /// Nouvel état du snapshot (ignoré si on a quitté l'écran)
    pub fn update_day_detail(&mut self, snapshot: HistoricalSnapshot) {
        if self.current_screen == Screen::DayDetail {
            self.day_detail = Some(snapshot);
        }
    }

    pub fn show_price_list(&mut self) {
        self.current_screen = Screen::PriceList;
        self.day_detail = None;
        self.day_symbols.clear();
    }

    pub fn is_on_price_list(&self) -> bool {
        self.current_screen == Screen::PriceList
    }

    pub fn is_on_day_detail(&self) -> bool {
        self.current_screen == Screen::DayDetail
    }

    /// Symbole d'une devise pour l'écran DayDetail, le code à défaut
    pub fn day_symbol(&self, code: &CurrencyCode) -> String {
        self.day_symbols
            .get(code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }

    // ========================================================================
    // Quit
    // ========================================================================

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_model::HistoricalRow;

    fn supported(codes: &[&str]) -> Vec<SupportedCurrency> {
        codes
            .iter()
            .map(|c| SupportedCurrency {
                code: CurrencyCode::parse(c).unwrap(),
                display_name: c.to_string(),
            })
            .collect()
    }

    fn rows_with_dates(days: &[u32]) -> RowViewState {
        RowViewState {
            currency: CurrencyCode::eur(),
            latest: None,
            historical: days
                .iter()
                .map(|d| HistoricalRow {
                    symbol: "€".to_string(),
                    price: "1.0000".to_string(),
                    date: NaiveDate::from_ymd_opt(2019, 7, *d).unwrap(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_app_creation() {
        let app = App::new(CurrencyCode::eur(), Duration::from_secs(60));
        assert!(app.is_running());
        assert!(app.is_on_price_list());
        assert_eq!(app.selected_currency(), CurrencyCode::eur());
        assert!(app.rows.is_empty());
    }

    #[test]
    fn test_two_step_quit() {
        let mut app = App::new(CurrencyCode::eur(), Duration::ZERO);
        app.request_quit();
        assert!(app.is_awaiting_quit_confirmation());
        app.cancel_quit();
        assert!(!app.is_awaiting_quit_confirmation());
        app.quit();
        assert!(!app.is_running());
    }

    #[test]
    fn test_currency_cycle_keeps_selection() {
        let mut app = App::new(CurrencyCode::eur(), Duration::ZERO);
        app.set_currencies(supported(&["USD", "AED", "EUR", "GBP"]));
        assert_eq!(app.selected_currency(), CurrencyCode::eur());

        assert_eq!(app.next_currency().as_str(), "GBP");
        assert_eq!(app.next_currency().as_str(), "USD");
        assert_eq!(app.next_currency().as_str(), "AED");
        assert_eq!(app.previous_currency().as_str(), "USD");
    }

    #[test]
    fn test_selected_currency_missing_from_list_is_kept() {
        let mut app = App::new(CurrencyCode::parse("CHF").unwrap(), Duration::ZERO);
        app.set_currencies(supported(&["USD", "EUR"]));
        assert_eq!(app.currencies.len(), 3);
        assert_eq!(app.selected_currency().as_str(), "CHF");
        assert_eq!(app.next_currency().as_str(), "EUR");
    }

    #[test]
    fn test_row_navigation_is_clamped() {
        let mut app = App::new(CurrencyCode::eur(), Duration::ZERO);
        app.update_rows(rows_with_dates(&[18, 17, 16]));

        app.navigate_down();
        app.navigate_down();
        app.navigate_down();
        assert_eq!(app.selected_row, 2);
        assert_eq!(app.selected_date(), NaiveDate::from_ymd_opt(2019, 7, 16));

        // Moins de lignes : la sélection suit
        app.update_rows(rows_with_dates(&[18]));
        assert_eq!(app.selected_row, 0);
        app.navigate_up();
        assert_eq!(app.selected_date(), NaiveDate::from_ymd_opt(2019, 7, 18));
    }

    #[test]
    fn test_refresh_presets() {
        let mut app = App::new(CurrencyCode::eur(), Duration::from_secs(60));
        assert_eq!(app.faster_refresh(), Duration::from_secs(30));
        assert_eq!(app.faster_refresh(), Duration::from_secs(15));
        assert_eq!(app.faster_refresh(), Duration::from_secs(15));

        assert_eq!(app.slower_refresh(), Duration::from_secs(30));
        app.refresh_rate = Duration::from_secs(300);
        assert_eq!(app.slower_refresh(), Duration::ZERO);
        assert_eq!(app.refresh_label(), "manuel");
        assert_eq!(app.faster_refresh(), Duration::from_secs(300));
    }

    #[test]
    fn test_day_detail_screen() {
        let mut app = App::new(CurrencyCode::eur(), Duration::ZERO);
        let date = NaiveDate::from_ymd_opt(2019, 7, 18).unwrap();

        // Mise à jour ignorée hors de l'écran
        app.update_day_detail(HistoricalSnapshot::new(date, []));
        assert!(app.day_detail.is_none());

        let symbols = BTreeMap::from([(CurrencyCode::eur(), "€".to_string())]);
        app.show_day_detail(HistoricalSnapshot::new(date, [CurrencyCode::usd()]), symbols);
        assert!(app.is_on_day_detail());
        assert_eq!(app.day_symbol(&CurrencyCode::eur()), "€");
        assert_eq!(app.day_symbol(&CurrencyCode::usd()), "USD");
        app.update_day_detail(HistoricalSnapshot::new(date, []));
        assert!(app.day_detail.as_ref().unwrap().is_complete());

        app.show_price_list();
        assert!(app.day_detail.is_none());
        assert!(app.day_symbols.is_empty());
    }

    #[test]
    fn test_spinner_only_when_refreshing() {
        let mut app = App::new(CurrencyCode::eur(), Duration::ZERO);
        app.tick();
        assert_eq!(app.spinner(), " ");
        app.is_refreshing = true;
        app.tick();
        assert_eq!(app.spinner(), "/");
    }
}
