// ============================================================================
// Module : models
// ============================================================================
// Structures de données : formes JSON de l'API Coindesk et types métier
// construits à partir d'elles.
// ============================================================================

pub mod currency;   // CurrencyCode, SupportedCurrency, décodage des symboles
pub mod historical; // HistoricalSeries (clôtures d'une devise)
pub mod quote;      // Quote (cotation instantanée multi-devises)
pub mod snapshot;   // HistoricalSnapshot (une date, plusieurs devises)
pub mod wire;       // Structures JSON brutes

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export des structures principales
pub use currency::{decode_symbol, CurrencyCode, InvalidCurrencyCode, SupportedCurrency};
pub use historical::{format_close_date, parse_close_date, DateParseError, HistoricalSeries};
pub use quote::{CurrencyPrice, Quote};
pub use snapshot::HistoricalSnapshot;
pub use wire::ShapeError;
