// ============================================================================
// Module : ui
// ============================================================================
// Interface terminal : consomme les sorties du PriceListModel via App
// ============================================================================

pub mod dashboard;  // Écran principal : liste des prix
pub mod day_detail; // Écran : clôtures d'un jour, toutes devises
pub mod events;     // Gestion des événements clavier

// Re-exports pour simplifier les imports
pub use dashboard::render;
pub use events::{Event, EventHandler};
