//! Couche d'accès aux API Plex
//!
//! Deux interlocuteurs :
//! - plex.tv (appairage par PIN, découverte des serveurs), identifié par les
//!   en-têtes `X-Plex-*`
//! - le serveur Plex choisi (sections, métadonnées, assets), authentifié par
//!   l'en-tête `X-Plex-Token`

pub mod assets;
pub mod library;
pub mod pins;
pub mod servers;

use crate::config_ext::PlexSettings;
use crate::error::{PlexError, Result};
use crate::models::ServerMeta;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Client API bas-niveau pour plex.tv et les serveurs Plex
#[derive(Debug, Clone)]
pub struct PlexApi {
    client: Client,
    api_base: String,
    /// En-têtes d'identification envoyés à plex.tv
    identity: HeaderMap,
}

fn header(name: &'static str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let value = HeaderValue::from_str(value)
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", name, e))?;
    Ok((HeaderName::from_static(name), value))
}

impl PlexApi {
    /// Crée une nouvelle instance de l'API
    pub fn new(settings: &PlexSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(format!("{}/{}", settings.product, settings.version))
            .build()?;

        let identity = [
            header("x-plex-client-identifier", &settings.client_identifier)?,
            header("x-plex-product", &settings.product)?,
            header("x-plex-version", &settings.version)?,
            header("x-plex-platform", std::env::consts::OS)?,
            header("x-plex-platform-version", &settings.version)?,
            header("x-plex-device", std::env::consts::ARCH)?,
            header("x-plex-device-name", &settings.device_name)?,
            header("x-plex-provides", "controller")?,
        ]
        .into_iter()
        .collect();

        Ok(Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            identity,
        })
    }

    /// Racine des appels plex.tv
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Client HTTP partagé (pool de connexions)
    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Prépare une requête vers plex.tv
    pub(crate) fn plex_tv(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!("{}{}", self.api_base, endpoint);
        debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .headers(self.identity.clone())
    }

    /// Prépare une requête JSON vers un serveur Plex
    pub(crate) fn media_server(
        &self,
        server: &ServerMeta,
        token: &str,
        endpoint: &str,
    ) -> RequestBuilder {
        let url = format!("{}{}", server.base_url(), endpoint);
        debug!("GET {}", url);
        self.client
            .get(url)
            .header(ACCEPT, "application/json")
            .header("X-Plex-Token", token)
    }

    /// Envoie la requête et rejette les statuts d'erreur
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let mut url = response.url().clone();
            url.set_query(None);
            warn!("Upstream error ({}) for {}", status, url);
            return Err(PlexError::UpstreamStatus {
                status,
                url: url.to_string(),
            });
        }

        Ok(response)
    }

    /// Envoie la requête et parse la réponse JSON
    pub(crate) async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let text = self.send(request).await?.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!("Failed to parse JSON response: {}", e);
            PlexError::JsonParse(e)
        })
    }

    /// Envoie la requête et parse la réponse XML
    pub(crate) async fn xml<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let text = self.send(request).await?.text().await?;
        quick_xml::de::from_str(&text).map_err(|e| {
            warn!("Failed to parse XML response: {}", e);
            PlexError::XmlParse(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_creation() {
        let settings = PlexSettings {
            api_base: "http://localhost:1234/".to_string(),
            ..PlexSettings::default()
        };
        let api = PlexApi::new(&settings).unwrap();
        assert_eq!(api.api_base(), "http://localhost:1234");
        assert_eq!(api.identity["x-plex-provides"], "controller");
        assert_eq!(
            api.identity["x-plex-client-identifier"],
            settings.client_identifier.as_str()
        );
    }

    #[test]
    fn test_invalid_identity_is_rejected() {
        let settings = PlexSettings {
            device_name: "bad\nname".to_string(),
            ..PlexSettings::default()
        };
        let err = PlexApi::new(&settings).unwrap_err();
        assert!(matches!(err, PlexError::Config(_)));
    }
}
