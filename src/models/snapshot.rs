// ============================================================================
// Structure : HistoricalSnapshot
// ============================================================================
// Clôtures de plusieurs devises pour UNE date, remplies au fur et à mesure
// par l'agrégateur (une requête par devise).
//
// Chaque devise attendue est dans exactement un des ensembles :
// - pending : requête encore en cours
// - prices  : clôture reçue
// - missing : réponse reçue, mais sans cette date
// - failed  : requête en échec
// ============================================================================

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::models::CurrencyCode;

/// Clôtures multi-devises pour une date
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalSnapshot {
    pub date: NaiveDate,
    pub prices: BTreeMap<CurrencyCode, f64>,
    pub pending: BTreeSet<CurrencyCode>,
    pub missing: BTreeSet<CurrencyCode>,
    pub failed: BTreeSet<CurrencyCode>,
}

impl HistoricalSnapshot {
    /// Snapshot vide : toutes les devises attendues sont "pending"
    pub fn new(date: NaiveDate, expected: impl IntoIterator<Item = CurrencyCode>) -> Self {
        Self {
            date,
            prices: BTreeMap::new(),
            pending: expected.into_iter().collect(),
            missing: BTreeSet::new(),
            failed: BTreeSet::new(),
        }
    }

    /// Plus aucune requête en attente
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn price(&self, currency: &CurrencyCode) -> Option<f64> {
        self.prices.get(currency).copied()
    }

    /// Nombre de devises réglées (prix, absence ou échec)
    pub fn settled(&self) -> usize {
        self.prices.len() + self.missing.len() + self.failed.len()
    }

    pub(crate) fn record_close(&mut self, currency: CurrencyCode, close: f64) {
        self.pending.remove(&currency);
        self.prices.insert(currency, close);
    }

    pub(crate) fn record_missing(&mut self, currency: CurrencyCode) {
        self.pending.remove(&currency);
        self.missing.insert(currency);
    }

    pub(crate) fn record_failure(&mut self, currency: CurrencyCode) {
        self.pending.remove(&currency);
        self.failed.insert(currency);
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
