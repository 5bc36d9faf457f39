// ============================================================================
// Structure : HistoricalSeries
// ============================================================================
// Série de clôtures journalières du BPI pour UNE devise.
//
// Les clés de date sont gardées brutes ("yyyy-mm-dd") : une clé illisible ne
// doit pas empêcher d'exploiter les autres. Le parsing se fait à la lecture,
// via `dated_closes()`, qui saute les clés invalides.
// ============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::wire::HistoricalWire;
use crate::models::CurrencyCode;

/// Format des clés de date de l'API
pub const CLOSE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Clé de date historique illisible
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("date historique invalide : '{raw}'")]
pub struct DateParseError {
    pub raw: String,
}

/// Parse une clé de date ("2019-07-18")
pub fn parse_close_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    NaiveDate::parse_from_str(raw, CLOSE_DATE_FORMAT).map_err(|_| DateParseError {
        raw: raw.to_string(),
    })
}

/// Formate une date au format des clés de l'API
pub fn format_close_date(date: NaiveDate) -> String {
    date.format(CLOSE_DATE_FORMAT).to_string()
}

/// Clôtures historiques d'une devise
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalSeries {
    /// Instant de mise à jour (fait foi)
    pub updated_at: DateTime<Utc>,

    /// Date lisible fournie par l'API, informative uniquement
    pub updated_display: String,

    /// Devise demandée, si connue (l'API ne la renvoie pas)
    pub currency: Option<CurrencyCode>,

    /// Clé de date brute -> clôture (toujours > 0)
    pub close_by_date: BTreeMap<String, f64>,
}

impl HistoricalSeries {
    /// Construit une série à partir du JSON décodé
    ///
    /// Les clôtures non positives (ou non finies) sont écartées : elles ne
    /// correspondent à aucun prix réel.
    pub fn from_wire(wire: HistoricalWire) -> Self {
        let mut close_by_date = BTreeMap::new();
        for (date, close) in wire.bpi {
            if close.is_finite() && close > 0.0 {
                close_by_date.insert(date, close);
            } else {
                warn!(date = %date, close, "Dropping non-positive historical close");
            }
        }

        Self {
            updated_at: wire.time.updated_iso.with_timezone(&Utc),
            updated_display: wire.time.updated,
            currency: None,
            close_by_date,
        }
    }

    /// Rattache la série à la devise demandée
    pub fn with_currency(mut self, currency: CurrencyCode) -> Self {
        self.currency = Some(currency);
        self
    }

    /// Clôture d'un jour précis, si présente
    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.close_by_date.get(&format_close_date(date)).copied()
    }

    /// Clôtures avec dates parsées, les clés illisibles sont sautées
    pub fn dated_closes(&self) -> Vec<(NaiveDate, f64)> {
        self.close_by_date
            .iter()
            .filter_map(|(raw, &close)| match parse_close_date(raw) {
                Ok(date) => Some((date, close)),
                Err(e) => {
                    debug!(error = %e, "Skipping undated historical close");
                    None
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.close_by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close_by_date.is_empty()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
