// ============================================================================
// Structure : Quote
// ============================================================================
// Cotation "instantanée" du BPI dans plusieurs devises.
//
// Invariants garantis par `Quote::from_wire` :
// - `prices` n'est jamais vide
// - les clés sont des CurrencyCode (3 lettres, majuscules), sans doublon
// ============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::wire::{PriceWire, QuoteWire, ShapeError, TimeWire};
use crate::models::{decode_symbol, CurrencyCode};

/// Prix du BPI dans une devise
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyPrice {
    pub code: CurrencyCode,

    /// Symbole brut tel qu'envoyé par l'API (entité HTML)
    pub symbol: String,

    /// Taux formaté par l'API (ex: "10,666.5500")
    pub rate_display: String,

    pub description: String,

    /// Taux numérique
    pub rate: f64,
}

impl CurrencyPrice {
    /// Symbole décodé (ex: "&euro;" -> "€")
    pub fn display_symbol(&self) -> String {
        decode_symbol(&self.symbol)
    }
}

/// Cotation à un instant donné
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Instant de mise à jour (fait foi)
    pub updated_at: DateTime<Utc>,

    /// Date lisible fournie par l'API, informative uniquement
    pub updated_display: String,

    /// Date lisible (heure UK), optionnelle
    pub updated_uk: Option<String>,

    /// Nom du graphique (ex: "Bitcoin")
    pub chart_name: String,

    /// Prix par devise
    pub prices: BTreeMap<CurrencyCode, CurrencyPrice>,
}

impl Quote {
    /// Construit une Quote à partir du JSON décodé, en vérifiant les invariants
    pub fn from_wire(wire: QuoteWire) -> Result<Self, ShapeError> {
        if wire.bpi.is_empty() {
            return Err(ShapeError::EmptyPrices);
        }

        let mut prices = BTreeMap::new();
        for (key, price) in wire.bpi {
            // La clé fait foi : le champ `code` est redondant dans le JSON
            let code = CurrencyCode::parse(&key)?;
            if prices.contains_key(&code) {
                return Err(ShapeError::DuplicateCurrency(code.to_string()));
            }
            prices.insert(
                code.clone(),
                CurrencyPrice {
                    code,
                    symbol: price.symbol,
                    rate_display: price.rate,
                    description: price.description,
                    rate: price.rate_float,
                },
            );
        }

        Ok(Self {
            updated_at: wire.time.updated_iso.with_timezone(&Utc),
            updated_display: wire.time.updated,
            updated_uk: wire.time.updateduk,
            chart_name: wire.chart_name,
            prices,
        })
    }

    /// Reconstruit la forme JSON (utile pour les fixtures et les tests)
    pub fn to_wire(&self) -> QuoteWire {
        QuoteWire {
            time: TimeWire {
                updated: self.updated_display.clone(),
                updated_iso: self.updated_at.into(),
                updateduk: self.updated_uk.clone(),
            },
            chart_name: self.chart_name.clone(),
            bpi: self
                .prices
                .iter()
                .map(|(code, price)| {
                    (
                        code.to_string(),
                        PriceWire {
                            code: code.to_string(),
                            symbol: price.symbol.clone(),
                            rate: price.rate_display.clone(),
                            description: price.description.clone(),
                            rate_float: price.rate,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Prix pour une devise donnée
    pub fn price_for(&self, currency: &CurrencyCode) -> Option<&CurrencyPrice> {
        self.prices.get(currency)
    }

    /// Devises présentes dans la cotation, triées
    pub fn currencies(&self) -> Vec<CurrencyCode> {
        self.prices.keys().cloned().collect()
    }

    /// Table code -> symbole décodé
    pub fn symbols(&self) -> BTreeMap<CurrencyCode, String> {
        self.prices
            .iter()
            .map(|(code, price)| (code.clone(), price.display_symbol()))
            .collect()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
