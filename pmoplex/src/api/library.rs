//! Bibliothèques d'un serveur Plex (sections, contenu, métadonnées)

use super::PlexApi;
use crate::error::{PlexError, Result};
use crate::models::{
    ASSET_ROUTE, DirectoryContainer, Envelope, ItemRef, MediaItemMeta, MetadataContainer,
    SectionMeta, ServerMeta,
};

impl PlexApi {
    /// Liste les sections du serveur
    ///
    /// `GET /library/sections`
    pub async fn sections(&self, server: &ServerMeta, token: &str) -> Result<Vec<SectionMeta>> {
        let request = self.media_server(server, token, "/library/sections");
        let envelope: Envelope<DirectoryContainer> = self.json(request).await?;
        Ok(envelope.container.directories)
    }

    /// Liste le contenu d'une section, dans l'ordre du serveur
    ///
    /// `GET /library/sections/{key}/all`
    pub async fn section_items(
        &self,
        server: &ServerMeta,
        token: &str,
        section_key: &str,
    ) -> Result<Vec<ItemRef>> {
        let endpoint = format!("/library/sections/{}/all", section_key);
        let request = self.media_server(server, token, &endpoint);
        let envelope: Envelope<MetadataContainer> = self.json(request).await?;

        Ok(envelope
            .container
            .metadata
            .iter()
            .map(|raw| raw.item_ref())
            .collect())
    }

    /// Récupère les métadonnées détaillées d'un média
    ///
    /// `GET /library/metadata/{ratingKey}`, première entrée de `Metadata`.
    pub async fn item_metadata(
        &self,
        server: &ServerMeta,
        token: &str,
        rating_key: &str,
    ) -> Result<MediaItemMeta> {
        let endpoint = format!("/library/metadata/{}", rating_key);
        let request = self.media_server(server, token, &endpoint);
        let envelope: Envelope<MetadataContainer> = self.json(request).await?;

        envelope
            .container
            .metadata
            .into_iter()
            .next()
            .map(|raw| raw.into_media_item(ASSET_ROUTE))
            .ok_or_else(|| PlexError::not_found("item", rating_key))
    }
}
