//! Découverte des serveurs et sections, et enregistrement des choix de l'utilisateur

use crate::api::PlexApi;
use crate::error::{PlexError, Result};
use crate::models::{SectionMeta, ServerMeta};
use crate::session::Session;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct DiscoverySelection {
    api: Arc<PlexApi>,
}

impl DiscoverySelection {
    pub fn new(api: Arc<PlexApi>) -> Self {
        Self { api }
    }

    /// Serveurs accessibles à la session
    ///
    /// La liste est mise en cache sur la session au premier succès. Un échec
    /// laisse le cache tel quel.
    pub async fn list_servers(&self, session: &mut Session) -> Result<Vec<ServerMeta>> {
        if let Some(servers) = session.servers() {
            return Ok(servers.to_vec());
        }

        let token = session
            .auth_token()
            .ok_or(PlexError::PreconditionUnmet("auth token"))?;
        let servers = self.api.list_servers(token).await?;

        debug!(session = %session.short_id(), "Caching {} server(s)", servers.len());
        session.cache_servers(servers.clone());
        Ok(servers)
    }

    /// Sections du serveur sélectionné
    pub async fn list_sections(&self, session: &Session) -> Result<Vec<SectionMeta>> {
        let target = session.server_target()?;
        self.api.sections(&target.server, &target.token).await
    }

    /// Sélectionne un serveur par son nom exact
    ///
    /// Un nom inconnu ne modifie pas la session.
    pub async fn select_server(&self, session: &mut Session, name: &str) -> Result<ServerMeta> {
        let server = self
            .list_servers(session)
            .await?
            .into_iter()
            .find(|server| server.name == name)
            .ok_or_else(|| PlexError::not_found("server", name))?;

        session.select_server(server.clone())?;
        info!(session = %session.short_id(), "Server '{}' selected", server.name);
        Ok(server)
    }

    /// Enregistre la section choisie
    ///
    /// Le nom n'est pas vérifié ici ; une section inconnue est signalée lors de
    /// l'agrégation.
    pub fn select_section(&self, session: &mut Session, name: &str) -> Result<()> {
        session.select_section(name)?;
        info!(session = %session.short_id(), "Section '{}' selected", name);
        Ok(())
    }
}
