// ============================================================================
// API Client : Coindesk
// ============================================================================
// Implémentation réelle du FetchPort, au-dessus de reqwest.
//
// CONCEPTS RUST :
// 1. async/await : l'appel réseau est le seul point de suspension
// 2. Un seul reqwest::Client partagé (pool de connexions réutilisé)
// 3. #[instrument] : chaque requête a son span de logs
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, instrument};

use crate::api::{CoinDeskRequest, FetchError, FetchPort};
use crate::config::Config;

/// Client HTTP pour l'API Coindesk
#[derive(Debug, Clone)]
pub struct CoinDeskClient {
    client: reqwest::Client,
    base_url: String,
}

impl CoinDeskClient {
    /// Crée le client à partir de la configuration
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        Self::with_options(&config.base_url, &config.user_agent, config.request_timeout)
    }

    pub fn with_options(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::transport(format!("création du client HTTP impossible : {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl FetchPort for CoinDeskClient {
    #[instrument(skip(self), fields(kind = request.kind()))]
    async fn execute(&self, request: &CoinDeskRequest) -> Result<String, FetchError> {
        let url = request.url(&self.base_url)?;
        debug!(url = %url, "Sending HTTP request to Coindesk");

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            error!(url = %url, error = %e, "HTTP request failed");
            FetchError::transport(e.to_string())
        })?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        // Vérifie que la réponse est un succès HTTP (200-299)
        if !status.is_success() {
            error!(status = %status, url = %url, "Coindesk returned error status");
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await.map_err(|e| {
            error!(url = %url, error = %e, "Failed to read response body");
            FetchError::transport(e.to_string())
        })?;

        debug!(bytes = body.len(), "Response body received");
        Ok(body)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
