// ============================================================================
// Structure : CurrencyCode / SupportedCurrency
// ============================================================================
// Codes devise ISO (3 lettres) tels que Coindesk les utilise comme clés dans
// `bpi`, et la liste de référence des devises supportées.
//
// CONCEPTS RUST :
// 1. Newtype pattern : CurrencyCode enveloppe une String validée
// 2. TryFrom / FromStr : la validation se fait une seule fois, à la construction
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code devise invalide (pas exactement 3 lettres ASCII)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("code devise invalide : '{0}' (3 lettres attendues)")]
pub struct InvalidCurrencyCode(pub String);

/// Code devise normalisé en majuscules (ex: "EUR", "USD")
///
/// CONCEPT RUST : Invariant porté par le type
/// - Impossible de construire un CurrencyCode invalide depuis l'extérieur
/// - Le reste du code n'a plus besoin de revalider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Valide et normalise un code (" eur " -> "EUR")
    pub fn parse(raw: &str) -> Result<Self, InvalidCurrencyCode> {
        let trimmed = raw.trim();
        if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(InvalidCurrencyCode(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Dollar américain, devise par défaut des requêtes historiques
    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    /// Euro, devise sélectionnée par défaut dans la liste de prix
    pub fn eur() -> Self {
        Self("EUR".to_string())
    }
}

impl FromStr for CurrencyCode {
    type Err = InvalidCurrencyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = InvalidCurrencyCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SupportedCurrency
// ============================================================================

/// Devise supportée par l'API (liste de référence, immuable)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedCurrency {
    /// Code ISO (ex: "AED")
    pub code: CurrencyCode,

    /// Nom lisible (ex: "United Arab Emirates Dirham")
    pub display_name: String,
}

// ============================================================================
// Décodage des symboles
// ============================================================================
// Coindesk envoie les symboles sous forme d'entités HTML ("&#36;", "&euro;").
// On ne décode que ce que l'API produit réellement ; une entité inconnue est
// laissée telle quelle.
// ============================================================================

/// Décode les entités HTML d'un symbole monétaire
pub fn decode_symbol(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        match tail.find(';') {
            Some(end) => {
                let entity = &tail[1..end];
                match decode_entity(entity) {
                    Some(c) => out.push(c),
                    None => out.push_str(&tail[..=end]),
                }
                rest = &tail[end + 1..];
            }
            None => {
                out.push_str(tail);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = entity.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }

    match entity {
        "amp" => Some('&'),
        "pound" => Some('£'),
        "euro" => Some('€'),
        "yen" => Some('¥'),
        "cent" => Some('¢'),
        "dollar" => Some('$'),
        _ => None,
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_code_normalization() {
        let code = CurrencyCode::parse(" eur ").unwrap();
        assert_eq!(code.as_str(), "EUR");
        assert_eq!(code, CurrencyCode::eur());
    }

    #[test]
    fn test_currency_code_rejects_invalid() {
        assert!(CurrencyCode::parse("EURO").is_err());
        assert!(CurrencyCode::parse("E1R").is_err());
        assert!(CurrencyCode::parse("").is_err());
    }

    #[test]
    fn test_currency_code_serde() {
        let code: CurrencyCode = serde_json::from_str("\"gbp\"").unwrap();
        assert_eq!(code.as_str(), "GBP");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"GBP\"");
        assert!(serde_json::from_str::<CurrencyCode>("\"POUND\"").is_err());
    }

    #[test]
    fn test_decode_symbol() {
        assert_eq!(decode_symbol("&#36;"), "$");
        assert_eq!(decode_symbol("&pound;"), "£");
        assert_eq!(decode_symbol("&euro;"), "€");
        assert_eq!(decode_symbol("&#x20AC;"), "€");
        assert_eq!(decode_symbol("R&#36;"), "R$");
        // Entité inconnue ou incomplète : laissée telle quelle
        assert_eq!(decode_symbol("&nope;"), "&nope;");
        assert_eq!(decode_symbol("a & b"), "a & b");
    }
}
