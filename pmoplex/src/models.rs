//! Structures de données pour représenter les objets Plex
//!
//! Les types publics (`Pairing`, `ServerMeta`, `MediaItemMeta`, ...) sont ceux que
//! manipule le reste de la crate. Les types `Raw*` reflètent le format des réponses
//! amont et ne sortent pas de la crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Credential long terme délivré par plex.tv à la fin de l'appairage
pub type AuthToken = String;

/// Préfixe des URLs d'assets relayés par le proxy
pub const ASSET_ROUTE: &str = "/plex_asset";

/// Désérialiseur flexible pour les IDs qui peuvent être des strings ou des integers
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(Error::custom("ID must be a string or number")),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// Plex renvoie parfois un objet seul au lieu d'une liste à un élément
pub(crate) fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
        None => Vec::new(),
    })
}

/// Code PIN en cours d'appairage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
    /// Code court à saisir sur plex.tv/link
    pub pin: String,
    /// Identifiant utilisé pour interroger plex.tv
    pub id: String,
}

/// Serveur Plex joignable par le compte authentifié
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMeta {
    pub name: String,
    pub scheme: String,
    pub host: String,
    pub port: String,
}

impl ServerMeta {
    /// URL de base du serveur (`scheme://host:port`)
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Bibliothèque (section) d'un serveur Plex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMeta {
    #[serde(deserialize_with = "deserialize_id")]
    pub key: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Entrée d'une section, avant enrichissement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemRef {
    pub rating_key: String,
    pub title: String,
}

/// Métadonnées d'un média, telles que servies au navigateur
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaItemMeta {
    pub title: String,
    pub audience_rating: Option<f64>,
    pub critic_rating: Option<f64>,
    pub summary: String,
    pub genres: BTreeSet<String>,
    /// Chemin relatif au proxy (`/plex_asset/...`)
    pub thumbnail_url: Option<String>,
    pub viewed_at: Option<DateTime<Utc>>,
}

/// Média dont la récupération des métadonnées a échoué
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedItem {
    pub rating_key: String,
    pub title: String,
    pub reason: String,
}

/// Résultat de l'agrégation d'une section
///
/// L'ordre de `items` est celui de complétion des requêtes, pas celui de la section.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SectionItems {
    pub items: Vec<MediaItemMeta>,
    pub failed: Vec<FailedItem>,
}

impl SectionItems {
    /// Vrai si au moins un média n'a pas pu être récupéré
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }
}

// ============================================================================
// Formats amont
// ============================================================================

/// Réponse de `POST /pins.json` et `GET /pins/{id}.json`
#[derive(Debug, Deserialize)]
pub(crate) struct PinEnvelope {
    pub pin: RawPin,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPin {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// Réponse XML de `GET /pms/servers.xml`
///
/// Un `MediaContainer` avec un seul `<Server>` donne une liste à un élément.
#[derive(Debug, Deserialize)]
pub(crate) struct ServerContainer {
    #[serde(rename = "Server", default)]
    pub servers: Vec<RawServer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawServer {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@scheme")]
    pub scheme: String,
    #[serde(rename = "@host")]
    pub host: String,
    #[serde(rename = "@port")]
    pub port: String,
}

impl From<RawServer> for ServerMeta {
    fn from(raw: RawServer) -> Self {
        Self {
            name: raw.name,
            scheme: raw.scheme,
            host: raw.host,
            port: raw.port,
        }
    }
}

/// Enveloppe JSON des réponses d'un serveur Plex
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    pub container: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DirectoryContainer {
    #[serde(rename = "Directory", default, deserialize_with = "one_or_many")]
    pub directories: Vec<SectionMeta>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MetadataContainer {
    #[serde(rename = "Metadata", default, deserialize_with = "one_or_many")]
    pub metadata: Vec<RawMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawTag {
    pub tag: String,
}

/// Entrée `Metadata` d'une section ou d'un média
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawMetadata {
    #[serde(deserialize_with = "deserialize_id")]
    pub rating_key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub audience_rating: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub summary: String,
    #[serde(rename = "Genre", default, deserialize_with = "one_or_many")]
    pub genres: Vec<RawTag>,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub last_viewed_at: Option<i64>,
}

impl RawMetadata {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef {
            rating_key: self.rating_key.clone(),
            title: self.title.clone(),
        }
    }

    pub fn into_media_item(self, asset_prefix: &str) -> MediaItemMeta {
        MediaItemMeta {
            title: self.title,
            audience_rating: self.audience_rating,
            critic_rating: self.rating,
            summary: self.summary,
            genres: self.genres.into_iter().map(|g| g.tag).collect(),
            thumbnail_url: self.thumb.map(|thumb| {
                format!(
                    "{}/{}",
                    asset_prefix.trim_end_matches('/'),
                    thumb.trim_start_matches('/')
                )
            }),
            viewed_at: self
                .last_viewed_at
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_base_url() {
        let server = ServerMeta {
            name: "nas".to_string(),
            scheme: "https".to_string(),
            host: "10.0.0.2".to_string(),
            port: "32400".to_string(),
        };
        assert_eq!(server.base_url(), "https://10.0.0.2:32400");
    }

    #[test]
    fn test_single_server_is_wrapped_in_list() {
        let xml = r#"<MediaContainer friendlyName="myPlex" size="1">
            <Server accessToken="x" name="nas" address="1.2.3.4" port="32400" scheme="http" host="1.2.3.4" machineIdentifier="abc"/>
        </MediaContainer>"#;

        let container: ServerContainer = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(container.servers.len(), 1);

        let server = ServerMeta::from(container.servers.into_iter().next().unwrap());
        assert_eq!(server.name, "nas");
        assert_eq!(server.port, "32400");
    }

    #[test]
    fn test_many_and_no_servers() {
        let xml = r#"<MediaContainer size="2">
            <Server name="a" scheme="http" host="h1" port="1"/>
            <Server name="b" scheme="https" host="h2" port="2"/>
        </MediaContainer>"#;
        let container: ServerContainer = quick_xml::de::from_str(xml).unwrap();
        let names: Vec<_> = container.servers.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let empty: ServerContainer =
            quick_xml::de::from_str(r#"<MediaContainer size="0"></MediaContainer>"#).unwrap();
        assert!(empty.servers.is_empty());
    }

    #[test]
    fn test_pin_with_numeric_id_and_null_token() {
        let env: PinEnvelope =
            serde_json::from_value(json!({"pin": {"id": 1234, "code": "ABCD", "auth_token": null}}))
                .unwrap();
        assert_eq!(env.pin.id, "1234");
        assert_eq!(env.pin.code, "ABCD");
        assert!(env.pin.auth_token.is_none());
    }

    #[test]
    fn test_metadata_conversion() {
        let raw: RawMetadata = serde_json::from_value(json!({
            "ratingKey": 42,
            "title": "Alien",
            "audienceRating": 9.4,
            "rating": 9.8,
            "summary": "In space...",
            "Genre": [{"tag": "Horror"}, {"tag": "Science Fiction"}],
            "thumb": "/library/metadata/42/thumb/1600000000",
            "lastViewedAt": 1600000000
        }))
        .unwrap();

        let item = raw.into_media_item("/plex_asset");
        assert_eq!(item.title, "Alien");
        assert_eq!(item.critic_rating, Some(9.8));
        assert!(item.genres.contains("Horror"));
        assert_eq!(
            item.thumbnail_url.as_deref(),
            Some("/plex_asset/library/metadata/42/thumb/1600000000")
        );
        assert_eq!(item.viewed_at.unwrap().timestamp(), 1600000000);
    }

    #[test]
    fn test_single_genre_object_and_missing_fields() {
        let raw: RawMetadata = serde_json::from_value(json!({
            "ratingKey": "7",
            "Genre": {"tag": "Drama"}
        }))
        .unwrap();

        let item = raw.into_media_item("/plex_asset");
        assert_eq!(item.genres.len(), 1);
        assert!(item.thumbnail_url.is_none());
        assert!(item.viewed_at.is_none());
        assert!(item.audience_rating.is_none());
    }

    #[test]
    fn test_empty_metadata_container() {
        let env: Envelope<MetadataContainer> =
            serde_json::from_value(json!({"MediaContainer": {"size": 0}})).unwrap();
        assert!(env.container.metadata.is_empty());
    }
}
