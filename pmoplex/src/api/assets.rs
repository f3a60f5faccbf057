//! Accès brut aux assets d'un serveur Plex (vignettes, affiches)

use super::PlexApi;
use crate::error::Result;
use crate::models::ServerMeta;
use reqwest::Response;
use tracing::debug;
use url::Url;

impl PlexApi {
    /// Construit l'URL absolue d'un asset, token en paramètre `X-Plex-Token`
    pub fn asset_url(&self, server: &ServerMeta, token: &str, path: &str) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/{}",
            server.base_url(),
            path.trim_start_matches('/')
        ))?;
        url.query_pairs_mut().append_pair("X-Plex-Token", token);
        Ok(url)
    }

    /// Ouvre l'asset en streaming
    ///
    /// Seuls les en-têtes sont lus, le corps reste à consommer par l'appelant.
    pub async fn open_asset(
        &self,
        server: &ServerMeta,
        token: &str,
        path: &str,
    ) -> Result<Response> {
        let url = self.asset_url(server, token, path)?;
        debug!("Opening asset {}{}", server.base_url(), url.path());
        self.send(self.http().get(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_ext::PlexSettings;

    #[test]
    fn test_asset_url() {
        let api = PlexApi::new(&PlexSettings::default()).unwrap();
        let server = ServerMeta {
            name: "nas".to_string(),
            scheme: "http".to_string(),
            host: "192.168.1.10".to_string(),
            port: "32400".to_string(),
        };

        let url = api
            .asset_url(&server, "s3cr3t", "/library/metadata/42/thumb/1600000000")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://192.168.1.10:32400/library/metadata/42/thumb/1600000000?X-Plex-Token=s3cr3t"
        );
    }

    #[test]
    fn test_invalid_server_url() {
        let api = PlexApi::new(&PlexSettings::default()).unwrap();
        let server = ServerMeta {
            name: "broken".to_string(),
            scheme: "http".to_string(),
            host: "".to_string(),
            port: "32400".to_string(),
        };
        assert!(matches!(
            api.asset_url(&server, "t", "thumb"),
            Err(crate::error::PlexError::InvalidUrl(_))
        ));
    }
}
