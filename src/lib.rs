// ============================================================================
// BPI Watch - Library
// ============================================================================
// Synchronisation des cotations Bitcoin Price Index (Coindesk) :
// - api         : Fetch Port (requêtes, transport HTTP, décodage)
// - refreshable : valeur rafraîchissable observable
// - aggregator  : snapshot multi-devises pour une date
// - price_model : modèle dérivé consommé par l'interface
// ============================================================================

pub mod aggregator;  // Snapshot multi-devises
pub mod api;         // Fetch Port Coindesk
pub mod app;         // État de l'application TUI
pub mod config;      // Configuration
pub mod models;      // Structures de données
pub mod price_model; // Modèle dérivé (liste des prix)
pub mod refreshable; // RefreshableValue
pub mod ui;          // Interface utilisateur

pub use config::Config;
pub use price_model::{build_rows, PriceListModel, RowViewState};
pub use refreshable::{RefreshResult, RefreshableValue};
