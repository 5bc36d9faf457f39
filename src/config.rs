// ============================================================================
// Configuration
// ============================================================================
// Valeurs par défaut + surcharge optionnelle par variables d'environnement.
// Seul le binaire lit l'environnement ; la bibliothèque reçoit tout par
// constructeur.
// ============================================================================

use std::time::Duration;

use tracing::warn;

use crate::models::CurrencyCode;

/// URL de l'API publique Coindesk
pub const DEFAULT_BASE_URL: &str = "https://api.coindesk.com";

/// Configuration de l'application
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// URL de base de l'API
    pub base_url: String,

    /// Devise sélectionnée au démarrage
    pub default_currency: CurrencyCode,

    /// Cadence de rafraîchissement de la cotation (ZERO = manuel)
    pub refresh_interval: Duration,

    pub user_agent: String,

    /// Timeout d'une requête HTTP
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_currency: CurrencyCode::eur(),
            refresh_interval: Duration::from_secs(60),
            user_agent: format!("bpiwatch/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Défauts surchargés par BPIWATCH_BASE_URL, BPIWATCH_CURRENCY,
    /// BPIWATCH_REFRESH_SECS
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Variante testable : `lookup` remplace std::env::var
    ///
    /// Une valeur invalide est ignorée (avec un warning), le défaut reste.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("BPIWATCH_BASE_URL") {
            config.base_url = url;
        }

        if let Some(raw) = lookup("BPIWATCH_CURRENCY") {
            match CurrencyCode::parse(&raw) {
                Ok(code) => config.default_currency = code,
                Err(e) => warn!(error = %e, "Ignoring BPIWATCH_CURRENCY"),
            }
        }

        if let Some(raw) = lookup("BPIWATCH_REFRESH_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.refresh_interval = Duration::from_secs(secs),
                Err(e) => warn!(value = %raw, error = %e, "Ignoring BPIWATCH_REFRESH_SECS"),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.default_currency, CurrencyCode::eur());
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("BPIWATCH_CURRENCY", "gbp"),
            ("BPIWATCH_REFRESH_SECS", "10"),
            ("BPIWATCH_BASE_URL", "http://localhost:8080"),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.default_currency.as_str(), "GBP");
        assert_eq!(config.refresh_interval, Duration::from_secs(10));
        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = Config::from_lookup(|k| match k {
            "BPIWATCH_CURRENCY" => Some("euro".to_string()),
            "BPIWATCH_REFRESH_SECS" => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(config, Config::default());
    }
}
