//! Gestion des erreurs pour le client Plex

use reqwest::StatusCode;
use thiserror::Error;

/// Type Result personnalisé pour pmoplex
pub type Result<T> = std::result::Result<T, PlexError>;

/// Erreurs possibles lors de l'orchestration des appels Plex
#[derive(Error, Debug)]
pub enum PlexError {
    /// Un champ requis de la session est absent (token, serveur, section)
    #[error("Precondition unmet: {0}")]
    PreconditionUnmet(&'static str),

    /// Serveur ou section inconnus
    #[error("{kind} not found: {name}")]
    SelectionNotFound { kind: &'static str, name: String },

    /// Le serveur distant a répondu avec un statut d'erreur
    #[error("Upstream returned {status} for {url}")]
    UpstreamStatus { status: StatusCode, url: String },

    /// Erreur HTTP (transport, connexion, décodage du corps)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Erreur de parsing JSON
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Erreur de parsing XML
    #[error("XML parsing error: {0}")]
    XmlParse(#[from] quick_xml::de::DeError),

    /// URL amont invalide
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Délai dépassé
    #[error("Upstream timeout: {0}")]
    Timeout(String),

    /// Erreur de configuration
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

impl PlexError {
    /// Crée une erreur de sélection introuvable
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::SelectionNotFound {
            kind,
            name: name.into(),
        }
    }

    /// Vérifie si l'erreur provient du service distant
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamStatus { .. }
                | Self::Http(_)
                | Self::JsonParse(_)
                | Self::XmlParse(_)
                | Self::InvalidUrl(_)
                | Self::Timeout(_)
        )
    }

    /// Statut HTTP à renvoyer au navigateur
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::PreconditionUnmet(_) => StatusCode::BAD_REQUEST,
            Self::SelectionNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Http(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}
