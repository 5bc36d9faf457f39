// ============================================================================
// Erreurs du Fetch Port
// ============================================================================
// Deux familles :
// - transport : pas de connexion, statut HTTP non-2xx
// - décodage : le payload ne correspond pas à la forme attendue
//
// CONCEPT RUST : Clone sur une erreur
// - FetchError est diffusée à plusieurs observateurs (watch / broadcast)
// - On garde donc des messages String plutôt que les erreurs sources
// ============================================================================

use thiserror::Error;

/// Échec d'une requête vers l'API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connexion impossible, timeout, corps illisible
    #[error("erreur de transport : {message}")]
    Transport { message: String },

    /// Réponse HTTP hors 2xx
    #[error("l'API a retourné HTTP {status} pour {url}")]
    Status { status: u16, url: String },

    /// Payload ne correspondant pas à la forme attendue
    #[error("réponse invalide : {message}")]
    Decode { message: String },
}

impl FetchError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Erreur de la famille "transport" (connexion ou statut HTTP)
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}

impl From<crate::models::ShapeError> for FetchError {
    fn from(err: crate::models::ShapeError) -> Self {
        Self::decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_families() {
        assert!(FetchError::transport("offline").is_transport());
        assert!(FetchError::Status { status: 503, url: "x".into() }.is_transport());
        assert!(FetchError::decode("bad").is_decode());
        assert!(!FetchError::decode("bad").is_transport());
    }

    #[test]
    fn test_json_error_is_decode() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(FetchError::from(err).is_decode());
    }
}
