//! Helpers partagés par les tests d'intégration

#![allow(dead_code)]

use pmoplex::session::new_session_id;
use pmoplex::{PlexSettings, ServerMeta, Session};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::MockServer;

pub const TOKEN: &str = "plex-token";

/// Réglages pointant plex.tv vers le mock
pub fn settings(mock: &MockServer) -> PlexSettings {
    PlexSettings {
        api_base: mock.uri(),
        client_identifier: "pmoplex-tests".to_string(),
        ..PlexSettings::default()
    }
}

/// Le mock joue aussi le rôle de serveur Plex
pub fn server_meta(mock: &MockServer, name: &str) -> ServerMeta {
    let addr = mock.address();
    ServerMeta {
        name: name.to_string(),
        scheme: "http".to_string(),
        host: addr.ip().to_string(),
        port: addr.port().to_string(),
    }
}

pub fn authenticated_session() -> Session {
    let mut session = Session::new(new_session_id(), Duration::from_secs(3600));
    assert!(session.authenticate(TOKEN.to_string()));
    session
}

pub fn servers_xml(names: &[&str]) -> String {
    let servers: String = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            format!(
                r#"<Server accessToken="x" name="{}" address="10.0.0.{}" port="32400" scheme="http" host="10.0.0.{}" machineIdentifier="m{}" version="1.40"/>"#,
                name, i, i, i
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><MediaContainer friendlyName="myPlex" identifier="com.plexapp.plugins.myplex" machineIdentifier="abc" size="{}">{}</MediaContainer>"#,
        names.len(),
        servers
    )
}

pub fn sections_json() -> Value {
    json!({
        "MediaContainer": {
            "size": 2,
            "Directory": [
                {"key": "1", "title": "Movies", "type": "movie"},
                {"key": "2", "title": "Music", "type": "artist"}
            ]
        }
    })
}

pub fn section_items_json(count: usize) -> Value {
    let items: Vec<Value> = (1..=count)
        .map(|i| json!({"ratingKey": i.to_string(), "title": format!("Movie {}", i)}))
        .collect();
    json!({"MediaContainer": {"size": count, "Metadata": items}})
}

pub fn item_json(rating_key: &str) -> Value {
    json!({
        "MediaContainer": {
            "size": 1,
            "Metadata": [{
                "ratingKey": rating_key,
                "title": format!("Movie {}", rating_key),
                "audienceRating": 8.1,
                "rating": 7.5,
                "summary": "A movie.",
                "Genre": [{"tag": "Drama"}, {"tag": "Thriller"}],
                "thumb": format!("/library/metadata/{}/thumb/1600000000", rating_key),
                "lastViewedAt": 1600000000
            }]
        }
    })
}
