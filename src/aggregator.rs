// ============================================================================
// Agrégateur multi-devises
// ============================================================================
// Construit un HistoricalSnapshot (une date, plusieurs devises). L'API n'a pas
// d'endpoint "batch" : on lance une requête historique d'UN jour par devise,
// toutes en parallèle.
//
// CONCEPTS RUST :
// 1. tokio::task::JoinSet : les fetchs tournent en parallèle, on récupère
//    chaque résultat dès qu'il arrive
// 2. Un seul écrivain : la tâche collectrice est la seule à modifier le
//    snapshot, les fetchs ne font que produire des résultats
// 3. watch : le snapshot est republié après CHAQUE fusion, les lecteurs le
//    voient se remplir
//
// Aucune erreur n'est remontée : une devise en échec ou sans donnée pour la
// date réduit juste la complétude du snapshot.
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, instrument, warn};

use crate::api::{CoinDeskApi, FetchError, FetchPort, HistoricalQuery};
use crate::models::{CurrencyCode, HistoricalSeries, HistoricalSnapshot};

/// Snapshot en cours de construction
///
/// Le snapshot appartient à la tâche collectrice ; ce handle n'en donne
/// qu'une vue en lecture.
pub struct SnapshotHandle {
    snapshot: watch::Receiver<HistoricalSnapshot>,
    task: JoinHandle<HistoricalSnapshot>,
}

impl SnapshotHandle {
    /// Flux des états successifs du snapshot
    pub fn subscribe(&self) -> watch::Receiver<HistoricalSnapshot> {
        self.snapshot.clone()
    }

    /// État actuel (copie)
    pub fn current(&self) -> HistoricalSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn is_complete(&self) -> bool {
        self.snapshot.borrow().is_complete()
    }

    /// Attend que toutes les devises soient réglées et retourne le snapshot final
    pub async fn finished(self) -> HistoricalSnapshot {
        match self.task.await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "Snapshot collector aborted");
                self.snapshot.borrow().clone()
            }
        }
    }

    /// Abandonne la construction (les requêtes en cours sont annulées)
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Lance la construction du snapshot de `date` pour `currencies`
///
/// Doit être appelé depuis un runtime tokio. Les doublons dans `currencies`
/// ne donnent lieu qu'à une seule requête.
#[instrument(skip(port, currencies), fields(date = %date))]
pub fn historical_close_for_day<P>(
    port: Arc<P>,
    currencies: impl IntoIterator<Item = CurrencyCode>,
    date: NaiveDate,
) -> SnapshotHandle
where
    P: FetchPort + ?Sized + 'static,
{
    let expected: BTreeSet<CurrencyCode> = currencies.into_iter().collect();
    info!(currencies = expected.len(), "Building historical snapshot");

    let (tx, rx) = watch::channel(HistoricalSnapshot::new(date, expected.iter().cloned()));

    let mut fetches = JoinSet::new();
    for currency in expected {
        let port = Arc::clone(&port);
        fetches.spawn(async move {
            let query = HistoricalQuery::for_currency(currency.clone()).for_day(date);
            let result = port.historical_close(query).await;
            (currency, result)
        });
    }

    let task = tokio::spawn(async move {
        while let Some(joined) = fetches.join_next().await {
            match joined {
                Ok((currency, result)) => {
                    tx.send_modify(|snapshot| merge(snapshot, currency, result));
                }
                Err(e) => {
                    // La devise concernée est inconnue ici ; elle sera
                    // marquée en échec à la fin
                    error!(error = %e, "Historical fetch task failed");
                }
            }
        }

        tx.send_if_modified(|snapshot| {
            let orphans: Vec<CurrencyCode> = snapshot.pending.iter().cloned().collect();
            for currency in &orphans {
                snapshot.record_failure(currency.clone());
            }
            !orphans.is_empty()
        });

        let snapshot = tx.borrow().clone();
        info!(
            prices = snapshot.prices.len(),
            missing = snapshot.missing.len(),
            failed = snapshot.failed.len(),
            "Historical snapshot complete"
        );
        snapshot
    });

    SnapshotHandle { snapshot: rx, task }
}

/// Fusionne le résultat d'une devise dans le snapshot
fn merge(snapshot: &mut HistoricalSnapshot, currency: CurrencyCode, result: Result<HistoricalSeries, FetchError>) {
    match result {
        Ok(series) => match series.close_on(snapshot.date) {
            Some(close) => {
                debug!(currency = %currency, close, "Merged historical close");
                snapshot.record_close(currency, close);
            }
            None => {
                // Jour sans cotation pour cette devise : trou non bloquant
                warn!(currency = %currency, date = %snapshot.date, "Requested date missing from historical close");
                snapshot.record_missing(currency);
            }
        },
        Err(e) => {
            warn!(currency = %currency, error = %e, "Historical fetch failed, currency skipped");
            snapshot.record_failure(currency);
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
