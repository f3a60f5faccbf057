//! Appairage d'une session avec un compte Plex
//!
//! Trois états : pas de PIN, PIN émis, authentifié (terminal). Chaque appel à
//! [`PairingFlow::advance`] fait au plus une émission de PIN et un sondage.
//! Aucune relance automatique : c'est la page (auto-refresh) qui rappelle.

use crate::api::PlexApi;
use crate::error::Result;
use crate::session::Session;
use std::sync::Arc;
use tracing::{debug, info};

/// Adresse où l'utilisateur saisit le PIN
pub const PLEX_LINK_URL: &str = "https://www.plex.tv/link/";

/// Résultat d'une étape d'appairage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingStatus {
    /// Le PIN doit encore être saisi sur plex.tv/link
    AwaitingPin { pin: String },
    Authenticated,
}

#[derive(Debug, Clone)]
pub struct PairingFlow {
    api: Arc<PlexApi>,
}

impl PairingFlow {
    pub fn new(api: Arc<PlexApi>) -> Self {
        Self { api }
    }

    /// Fait avancer l'appairage de la session
    pub async fn advance(&self, session: &mut Session) -> Result<PairingStatus> {
        if session.auth_token().is_some() {
            return Ok(PairingStatus::Authenticated);
        }

        let pairing = match session.pairing() {
            Some(pairing) => pairing.clone(),
            None => {
                let pairing = self.api.create_pin().await?;
                info!(session = %session.short_id(), "Pairing started");
                session.begin_pairing(pairing.clone());
                pairing
            }
        };

        match self.api.poll_pin(&pairing.id).await? {
            Some(token) => {
                session.authenticate(token);
                info!(session = %session.short_id(), "Session authenticated");
                Ok(PairingStatus::Authenticated)
            }
            None => {
                debug!(session = %session.short_id(), "PIN {} not entered yet", pairing.pin);
                Ok(PairingStatus::AwaitingPin { pin: pairing.pin })
            }
        }
    }
}
