// ============================================================================
// Structures JSON de l'API Coindesk
// ============================================================================
// Ces structures collent EXACTEMENT au JSON renvoyé par l'API, pour que serde
// puisse (dé)sérialiser sans code manuel. Les types métier (Quote,
// HistoricalSeries, ...) sont construits à partir d'elles.
//
// CONCEPT RUST : #[serde(rename = "...")]
// - "updatedISO" (JSON) -> updated_iso (Rust)
// - "rate_float" (JSON) -> rate_float (déjà en snake_case)
// ============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::InvalidCurrencyCode;

/// Bloc `time` commun aux réponses "currentprice" et "historical"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWire {
    /// Date lisible (ex: "Jul 18, 2019 23:31:00 UTC"), informative
    pub updated: String,

    /// Instant ISO-8601, fait foi
    #[serde(rename = "updatedISO")]
    pub updated_iso: DateTime<FixedOffset>,

    /// Date lisible (heure UK), absente des réponses historiques
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updateduk: Option<String>,
}

/// Prix dans une devise (entrée de `bpi` pour "currentprice")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceWire {
    pub code: String,
    /// Symbole encodé en entité HTML (ex: "&euro;")
    pub symbol: String,
    /// Taux formaté par l'API (ex: "9,481.8696")
    pub rate: String,
    pub description: String,
    pub rate_float: f64,
}

/// Réponse de "currentprice.json" / "currentprice/{CODE}.json"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteWire {
    pub time: TimeWire,
    #[serde(rename = "chartName")]
    pub chart_name: String,
    pub bpi: BTreeMap<String, PriceWire>,
}

/// Réponse de "historical/close.json" : date "yyyy-mm-dd" -> clôture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalWire {
    pub bpi: BTreeMap<String, f64>,
    pub time: TimeWire,
}

/// Entrée de "supported-currencies.json"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportedCurrencyWire {
    pub currency: String,
    pub country: String,
}

/// Payload syntaxiquement valide mais qui viole un invariant métier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("le champ `bpi` ne contient aucun prix")]
    EmptyPrices,

    /// Deux clés de `bpi` désignent la même devise (ex: "usd" et "USD")
    #[error("devise en double dans `bpi` : {0}")]
    DuplicateCurrency(String),

    #[error(transparent)]
    InvalidCurrency(#[from] InvalidCurrencyCode),
}
