// ============================================================================
// Requêtes Coindesk
// ============================================================================
// Description immuable d'une requête : type d'endpoint + paramètres.
// La construction de l'URL est séparée de l'exécution (voir port.rs) pour
// pouvoir tester sans réseau.
// ============================================================================

use std::fmt;

use chrono::NaiveDate;
use reqwest::Url;

use crate::api::FetchError;
use crate::models::{format_close_date, CurrencyCode};

/// Indice de prix proposé par l'API historique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceIndex {
    Usd,
    Cny,
}

impl PriceIndex {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceIndex::Usd => "USD",
            PriceIndex::Cny => "CNY",
        }
    }
}

/// Paramètres de "historical/close.json", tous optionnels
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoricalQuery {
    pub index: Option<PriceIndex>,
    pub currency: Option<CurrencyCode>,
    /// Bornes incluses (start, end)
    pub range: Option<(NaiveDate, NaiveDate)>,
}

impl Default for HistoricalQuery {
    /// Indice USD, devise USD, période par défaut de l'API (31 derniers jours)
    fn default() -> Self {
        Self {
            index: Some(PriceIndex::Usd),
            currency: Some(CurrencyCode::usd()),
            range: None,
        }
    }
}

impl HistoricalQuery {
    /// Requête par défaut pour une devise
    pub fn for_currency(currency: CurrencyCode) -> Self {
        Self {
            currency: Some(currency),
            ..Self::default()
        }
    }

    /// Limite la requête à une seule journée
    pub fn for_day(self, date: NaiveDate) -> Self {
        self.between(date, date)
    }

    pub fn between(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.range = Some((start, end));
        self
    }

    pub fn with_index(mut self, index: Option<PriceIndex>) -> Self {
        self.index = index;
        self
    }
}

/// Requêtes supportées par le Fetch Port
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CoinDeskRequest {
    /// Cotation actuelle (USD, GBP, EUR)
    CurrentPrice,

    /// Cotation actuelle incluant une devise précise
    CurrentPriceFor { code: CurrencyCode },

    /// Clôtures historiques
    HistoricalClose(HistoricalQuery),

    /// Liste des devises supportées
    SupportedCurrencies,
}

impl CoinDeskRequest {
    /// Chemin relatif à l'URL de base
    pub fn path(&self) -> String {
        match self {
            CoinDeskRequest::CurrentPrice => "/v1/bpi/currentprice.json".to_string(),
            CoinDeskRequest::CurrentPriceFor { code } => {
                format!("/v1/bpi/currentprice/{}.json", code)
            }
            CoinDeskRequest::HistoricalClose(_) => "/v1/bpi/historical/close.json".to_string(),
            CoinDeskRequest::SupportedCurrencies => {
                "/v1/bpi/supported-currencies.json".to_string()
            }
        }
    }

    /// Paramètres de requête, dans l'ordre où l'API les documente
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut items = Vec::new();

        if let CoinDeskRequest::HistoricalClose(query) = self {
            if let Some(index) = query.index {
                items.push(("index", index.as_str().to_string()));
            }
            if let Some(currency) = &query.currency {
                items.push(("currency", currency.to_string()));
            }
            if let Some((start, end)) = query.range {
                items.push(("start", format_close_date(start)));
                items.push(("end", format_close_date(end)));
            }
        }

        items
    }

    /// URL complète pour une URL de base (ex: "https://api.coindesk.com")
    pub fn url(&self, base_url: &str) -> Result<Url, FetchError> {
        let base = Url::parse(base_url)
            .map_err(|e| FetchError::transport(format!("URL de base invalide '{}' : {}", base_url, e)))?;

        let mut url = base
            .join(&self.path())
            .map_err(|e| FetchError::transport(format!("chemin invalide : {}", e)))?;

        let query = self.query();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }

        Ok(url)
    }

    /// Nom court pour les logs
    pub fn kind(&self) -> &'static str {
        match self {
            CoinDeskRequest::CurrentPrice => "current_price",
            CoinDeskRequest::CurrentPriceFor { .. } => "current_price_for",
            CoinDeskRequest::HistoricalClose(_) => "historical_close",
            CoinDeskRequest::SupportedCurrencies => "supported_currencies",
        }
    }
}

impl fmt::Display for CoinDeskRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())?;
        let query = self.query();
        for (i, (key, value)) in query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, key, value)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
