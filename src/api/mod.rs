// ============================================================================
// Module : api
// ============================================================================
// Fetch Port : description des requêtes, transport HTTP, décodage typé.
// ============================================================================

pub mod coindesk; // Client reqwest (FetchPort réel)
pub mod error;    // FetchError
pub mod port;     // FetchPort, Payload, CoinDeskApi
pub mod request;  // CoinDeskRequest, HistoricalQuery

// Re-export des éléments principaux
pub use coindesk::CoinDeskClient;
pub use error::FetchError;
pub use port::{CoinDeskApi, FetchPort, Payload};
pub use request::{CoinDeskRequest, HistoricalQuery, PriceIndex};
