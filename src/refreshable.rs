// ============================================================================
// Structure : RefreshableValue
// ============================================================================
// Transforme une opération async sans argument (un fetch) en source observable
// et rafraîchissable :
// - values    : dernière valeur réussie (un échec ne l'efface JAMAIS)
// - errors    : erreur du DERNIER refresh terminé (None après un succès)
// - results   : chaque résultat, dans l'ordre de complétion
// - in_flight : nombre de refresh en cours (indicateur "busy")
//
// CONCEPTS RUST :
// 1. tokio::sync::watch : "dernière valeur" observable par plusieurs lecteurs
// 2. tokio::sync::broadcast : flux de tous les résultats
// 3. Arc<Mutex<..>> : section critique unique par instance (compteur +
//    dernier résultat), même si les fetchs tournent en parallèle
//
// Les refresh qui se chevauchent ne sont ni dédupliqués ni annulés : si B
// termine avant A, c'est A (le dernier TERMINÉ) qui devient la valeur
// courante, même s'il est plus ancien.
// ============================================================================

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};
use tracing::{debug, error};

/// Résultat d'un refresh terminé : succès OU échec, jamais les deux
pub type RefreshResult<T, E> = Result<T, E>;

/// Capacité du flux `results` ; un lecteur trop lent perd les plus anciens
const RESULTS_CAPACITY: usize = 64;

type FetchFuture<T, E> = Pin<Box<dyn Future<Output = RefreshResult<T, E>> + Send>>;
type FetchOperation<T, E> = Arc<dyn Fn() -> FetchFuture<T, E> + Send + Sync>;

/// État protégé par le verrou de l'instance
struct RefreshState<T, E> {
    in_flight: usize,
    issued: u64,
    completed: u64,
    last_result: Option<RefreshResult<T, E>>,
}

/// Partie partagée entre l'instance et les tâches de fetch
struct Shared<T, E> {
    state: Mutex<RefreshState<T, E>>,
    values: watch::Sender<Option<T>>,
    errors: watch::Sender<Option<E>>,
    in_flight: watch::Sender<usize>,
    results: broadcast::Sender<RefreshResult<T, E>>,
}

impl<T, E> Shared<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn lock(&self) -> MutexGuard<'_, RefreshState<T, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publie un résultat ; tout se fait sous le verrou pour que deux
    /// complétions concurrentes ne s'entrelacent pas
    fn complete(&self, result: RefreshResult<T, E>) {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        state.completed += 1;

        match &result {
            Ok(value) => {
                self.values.send_replace(Some(value.clone()));
                self.errors.send_replace(None);
            }
            Err(err) => {
                self.errors.send_replace(Some(err.clone()));
            }
        }

        self.in_flight.send_replace(state.in_flight);
        // Err = aucun abonné, ce n'est pas une erreur
        let _ = self.results.send(result.clone());

        debug!(
            ok = result.is_ok(),
            completed = state.completed,
            in_flight = state.in_flight,
            "Refresh completed"
        );
        state.last_result = Some(result);
    }

    /// Le fetch a paniqué : aucun résultat à publier, mais il n'est plus en vol
    fn abandon(&self) {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        state.completed += 1;
        self.in_flight.send_replace(state.in_flight);
    }
}

/// Valeur rafraîchissable à partir d'une opération de fetch
pub struct RefreshableValue<T, E> {
    fetch: FetchOperation<T, E>,
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for RefreshableValue<T, E> {
    fn clone(&self) -> Self {
        Self {
            fetch: Arc::clone(&self.fetch),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> RefreshableValue<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Crée la valeur ; aucun fetch n'est lancé avant le premier `refresh()`
    ///
    /// CONCEPT RUST : Type erasure
    /// - Chaque closure a son propre type ; on la range derrière un
    ///   `Arc<dyn Fn() -> Pin<Box<dyn Future>>>` pour garder une struct simple
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RefreshResult<T, E>> + Send + 'static,
    {
        let fetch: FetchOperation<T, E> = Arc::new(move || -> FetchFuture<T, E> { Box::pin(fetch()) });

        let (values, _) = watch::channel(None);
        let (errors, _) = watch::channel(None);
        let (in_flight, _) = watch::channel(0);
        let (results, _) = broadcast::channel(RESULTS_CAPACITY);

        Self {
            fetch,
            shared: Arc::new(Shared {
                state: Mutex::new(RefreshState {
                    in_flight: 0,
                    issued: 0,
                    completed: 0,
                    last_result: None,
                }),
                values,
                errors,
                in_flight,
                results,
            }),
        }
    }

    /// Lance un refresh sans attendre son résultat
    ///
    /// Le compteur est incrémenté AVANT le début du fetch et décrémenté à sa
    /// complétion (succès ou échec). Doit être appelé depuis un runtime tokio.
    pub fn refresh(&self) {
        let issued = {
            let mut state = self.shared.lock();
            state.in_flight += 1;
            state.issued += 1;
            self.shared.in_flight.send_replace(state.in_flight);
            state.issued
        };
        debug!(refresh = issued, "Refresh issued");

        let fetch = (self.fetch)();
        let shared = Arc::clone(&self.shared);

        // Le fetch tourne dans sa propre tâche : une panique y est isolée et
        // le compteur reste cohérent
        tokio::spawn(async move {
            match tokio::spawn(fetch).await {
                Ok(result) => shared.complete(result),
                Err(e) => {
                    error!(refresh = issued, error = %e, "Refresh task aborted");
                    shared.abandon();
                }
            }
        });
    }

    /// Dernière valeur réussie (None seulement avant le premier succès)
    pub fn values(&self) -> watch::Receiver<Option<T>> {
        self.shared.values.subscribe()
    }

    /// Erreur du dernier refresh terminé, None s'il a réussi
    pub fn errors(&self) -> watch::Receiver<Option<E>> {
        self.shared.errors.subscribe()
    }

    /// Tous les résultats, dans l'ordre de complétion
    pub fn results(&self) -> broadcast::Receiver<RefreshResult<T, E>> {
        self.shared.results.subscribe()
    }

    /// Nombre de refresh en cours
    pub fn in_flight(&self) -> watch::Receiver<usize> {
        self.shared.in_flight.subscribe()
    }

    pub fn is_refreshing(&self) -> bool {
        *self.shared.in_flight.borrow() > 0
    }

    pub fn latest_value(&self) -> Option<T> {
        self.shared.values.borrow().clone()
    }

    pub fn latest_error(&self) -> Option<E> {
        self.shared.errors.borrow().clone()
    }

    pub fn last_result(&self) -> Option<RefreshResult<T, E>> {
        self.shared.lock().last_result.clone()
    }

    /// Nombre de refresh demandés depuis la création
    pub fn issued(&self) -> u64 {
        self.shared.lock().issued
    }

    /// Nombre de refresh terminés depuis la création
    pub fn completed(&self) -> u64 {
        self.shared.lock().completed
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
