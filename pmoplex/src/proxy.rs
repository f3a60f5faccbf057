//! Proxy streaming des assets Plex
//!
//! Le corps amont est relayé morceau par morceau, jamais chargé en entier.
//! Abandonner le flux (déconnexion du navigateur) libère la connexion amont.

use crate::api::PlexApi;
use crate::error::Result;
use crate::session::ServerTarget;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::header::CONTENT_TYPE;
use std::io;
use std::sync::Arc;
use tracing::{debug, warn};

/// Asset amont ouvert, prêt à être relayé
pub struct AssetStream {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, io::Result<Bytes>>,
}

impl std::fmt::Debug for AssetStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetStream")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct AssetProxy {
    api: Arc<PlexApi>,
}

impl AssetProxy {
    pub fn new(api: Arc<PlexApi>) -> Self {
        Self { api }
    }

    /// Ouvre l'asset `path` sur le serveur ciblé
    ///
    /// Un statut amont non-succès est une erreur ; une erreur en cours de
    /// transfert termine le flux avec cette erreur.
    pub async fn open(&self, target: &ServerTarget, path: &str) -> Result<AssetStream> {
        let response = self
            .api
            .open_asset(&target.server, &target.token, path)
            .await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = response.content_length();

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(io::Error::other))
            .boxed();

        let path = path.to_string();
        let monitored = futures::stream::unfold(
            (stream, 0u64, false),
            move |(mut stream, relayed, done)| {
                let path = path.clone();
                async move {
                    if done {
                        return None;
                    }

                    match stream.next().await {
                        Some(Ok(chunk)) => {
                            let relayed = relayed + chunk.len() as u64;
                            Some((Ok(chunk), (stream, relayed, false)))
                        }
                        Some(Err(e)) => {
                            warn!("Asset stream {} failed after {} bytes: {}", path, relayed, e);
                            Some((Err(e), (stream, relayed, true)))
                        }
                        None => {
                            debug!("Asset {} relayed ({} bytes)", path, relayed);
                            None
                        }
                    }
                }
            },
        );

        Ok(AssetStream {
            content_type,
            content_length,
            body: monitored.boxed(),
        })
    }
}
