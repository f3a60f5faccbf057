//! Appairage par code PIN auprès de plex.tv

use super::PlexApi;
use crate::error::Result;
use crate::models::{AuthToken, Pairing, PinEnvelope};
use reqwest::Method;
use reqwest::header::ACCEPT;
use tracing::debug;

impl PlexApi {
    /// Demande un nouveau code PIN
    ///
    /// `POST /pins.json`
    pub async fn create_pin(&self) -> Result<Pairing> {
        let request = self
            .plex_tv(Method::POST, "/pins.json")
            .header(ACCEPT, "application/json");
        let envelope: PinEnvelope = self.json(request).await?;

        debug!("PIN {} issued (id {})", envelope.pin.code, envelope.pin.id);

        Ok(Pairing {
            pin: envelope.pin.code,
            id: envelope.pin.id,
        })
    }

    /// Vérifie si le PIN a été saisi sur plex.tv/link
    ///
    /// `GET /pins/{id}.json`. Retourne `None` tant que le token est absent ou vide.
    pub async fn poll_pin(&self, id: &str) -> Result<Option<AuthToken>> {
        let request = self
            .plex_tv(Method::GET, &format!("/pins/{}.json", id))
            .header(ACCEPT, "application/json");
        let envelope: PinEnvelope = self.json(request).await?;

        Ok(envelope.pin.auth_token.filter(|token| !token.is_empty()))
    }
}
