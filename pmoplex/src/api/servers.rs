//! Découverte des serveurs accessibles au compte

use super::PlexApi;
use crate::error::Result;
use crate::models::{ServerContainer, ServerMeta};
use reqwest::Method;
use reqwest::header::AUTHORIZATION;
use tracing::debug;

impl PlexApi {
    /// Liste les serveurs Plex du compte
    ///
    /// `GET /pms/servers.xml`, authentifié par le token (Bearer).
    pub async fn list_servers(&self, token: &str) -> Result<Vec<ServerMeta>> {
        let request = self
            .plex_tv(Method::GET, "/pms/servers.xml")
            .header(AUTHORIZATION, format!("Bearer {}", token));
        let container: ServerContainer = self.xml(request).await?;

        let servers: Vec<ServerMeta> = container.servers.into_iter().map(Into::into).collect();
        debug!("Discovered {} server(s)", servers.len());
        Ok(servers)
    }
}
