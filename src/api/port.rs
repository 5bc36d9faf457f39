// ============================================================================
// Fetch Port
// ============================================================================
// Le seul point de contact avec le réseau :
// - FetchPort  : exécute UNE requête et retourne le corps brut
// - Payload    : décode un corps en type métier (forme exacte attendue)
// - CoinDeskApi: les quatre requêtes typées, disponibles sur tout FetchPort
//
// Pas de retry, pas de cache. Le client réel est dans coindesk.rs ; les tests
// fournissent leurs propres implémentations.
// ============================================================================

use async_trait::async_trait;
use tracing::warn;

use crate::api::{CoinDeskRequest, FetchError, HistoricalQuery};
use crate::models::wire::{HistoricalWire, QuoteWire, SupportedCurrencyWire};
use crate::models::{CurrencyCode, HistoricalSeries, Quote, SupportedCurrency};

/// Transport : une requête -> un corps de réponse
///
/// CONCEPT RUST : #[async_trait]
/// - Les méthodes async dans un trait doivent être "boxées" pour être Send
/// - async_trait génère ce code pour nous
#[async_trait]
pub trait FetchPort: Send + Sync {
    async fn execute(&self, request: &CoinDeskRequest) -> Result<String, FetchError>;
}

/// Type décodable depuis un corps de réponse Coindesk
pub trait Payload: Sized + Send {
    fn decode(body: &str) -> Result<Self, FetchError>;
}

impl Payload for Quote {
    fn decode(body: &str) -> Result<Self, FetchError> {
        let wire: QuoteWire = serde_json::from_str(body)?;
        Ok(Quote::from_wire(wire)?)
    }
}

impl Payload for HistoricalSeries {
    fn decode(body: &str) -> Result<Self, FetchError> {
        let wire: HistoricalWire = serde_json::from_str(body)?;
        Ok(HistoricalSeries::from_wire(wire))
    }
}

impl Payload for Vec<SupportedCurrency> {
    fn decode(body: &str) -> Result<Self, FetchError> {
        let wire: Vec<SupportedCurrencyWire> = serde_json::from_str(body)?;
        wire.into_iter()
            .map(|entry| {
                let code = CurrencyCode::parse(&entry.currency)
                    .map_err(|e| FetchError::decode(e.to_string()))?;
                Ok(SupportedCurrency {
                    code,
                    display_name: entry.country,
                })
            })
            .collect()
    }
}

/// Requêtes typées, disponibles sur n'importe quel FetchPort
///
/// CONCEPT RUST : Extension trait + blanket impl
/// - `impl<P: FetchPort + ?Sized> CoinDeskApi for P`
/// - Tout transport (réel ou stub) obtient ces méthodes gratuitement
#[async_trait]
pub trait CoinDeskApi: FetchPort {
    /// Exécute une requête et décode le payload attendu
    async fn fetch<T: Payload>(&self, request: &CoinDeskRequest) -> Result<T, FetchError> {
        let body = self.execute(request).await?;
        T::decode(&body).map_err(|e| {
            warn!(request = %request, error = %e, "Failed to decode payload");
            e
        })
    }

    async fn current_price(&self) -> Result<Quote, FetchError> {
        self.fetch(&CoinDeskRequest::CurrentPrice).await
    }

    async fn current_price_for(&self, code: CurrencyCode) -> Result<Quote, FetchError> {
        self.fetch(&CoinDeskRequest::CurrentPriceFor { code }).await
    }

    /// Clôtures historiques ; la série est rattachée à la devise demandée
    async fn historical_close(&self, query: HistoricalQuery) -> Result<HistoricalSeries, FetchError> {
        let currency = query.currency.clone();
        let series: HistoricalSeries = self.fetch(&CoinDeskRequest::HistoricalClose(query)).await?;
        Ok(match currency {
            Some(code) => series.with_currency(code),
            None => series,
        })
    }

    async fn supported_currencies(&self) -> Result<Vec<SupportedCurrency>, FetchError> {
        self.fetch(&CoinDeskRequest::SupportedCurrencies).await
    }
}

impl<P: FetchPort + ?Sized> CoinDeskApi for P {}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::fixtures::{CURRENT_PRICE_JSON, HISTORICAL_CLOSE_JSON, SUPPORTED_CURRENCIES_JSON};

    /// Stub : sert les fixtures selon le type de requête
    pub(crate) struct FixturePort;

    #[async_trait]
    impl FetchPort for FixturePort {
        async fn execute(&self, request: &CoinDeskRequest) -> Result<String, FetchError> {
            Ok(match request {
                CoinDeskRequest::CurrentPrice | CoinDeskRequest::CurrentPriceFor { .. } => CURRENT_PRICE_JSON,
                CoinDeskRequest::HistoricalClose(_) => HISTORICAL_CLOSE_JSON,
                CoinDeskRequest::SupportedCurrencies => SUPPORTED_CURRENCIES_JSON,
            }
            .to_string())
        }
    }

    /// Stub : répond toujours le même corps
    struct BodyPort(&'static str);

    #[async_trait]
    impl FetchPort for BodyPort {
        async fn execute(&self, _request: &CoinDeskRequest) -> Result<String, FetchError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_current_price_decodes() {
        let quote = FixturePort.current_price().await.unwrap();
        assert_eq!(quote.prices.len(), 3);
        assert_eq!(quote.price_for(&CurrencyCode::usd()).unwrap().rate, 10_666.55);
    }

    #[tokio::test]
    async fn test_historical_close_is_tagged_with_currency() {
        let series = FixturePort
            .historical_close(HistoricalQuery::for_currency(CurrencyCode::eur()))
            .await
            .unwrap();
        assert_eq!(series.currency, Some(CurrencyCode::eur()));
        assert_eq!(series.len(), 31);
    }

    #[tokio::test]
    async fn test_supported_currencies_decode() {
        let currencies = FixturePort.supported_currencies().await.unwrap();
        assert_eq!(currencies.len(), 5);
        assert_eq!(currencies[0].code.as_str(), "AED");
        assert_eq!(currencies[0].display_name, "United Arab Emirates Dirham");
        assert_eq!(currencies[4].code.as_str(), "ZWL");
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_decode_error() {
        // Une série historique n'est pas une cotation
        let err = BodyPort(HISTORICAL_CLOSE_JSON).current_price().await.unwrap_err();
        assert!(err.is_decode());

        let err = BodyPort("<html>maintenance</html>").supported_currencies().await.unwrap_err();
        assert!(err.is_decode());
    }

    #[tokio::test]
    async fn test_empty_bpi_is_decode_error() {
        let body = r#"{
            "time": { "updated": "x", "updatedISO": "2019-07-18T23:31:00+00:00" },
            "chartName": "Bitcoin",
            "bpi": {}
        }"#;
        let err = BodyPort(body).current_price().await.unwrap_err();
        assert!(err.is_decode());
    }

    #[tokio::test]
    async fn test_works_through_trait_object() {
        let port: std::sync::Arc<dyn FetchPort> = std::sync::Arc::new(FixturePort);
        let quote = port.current_price().await.unwrap();
        assert!(!quote.prices.is_empty());
    }
}
