//! Tests d'intégration de la découverte et de la sélection

mod common;

use pmoplex::{DiscoverySelection, PlexApi, PlexError, Session};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_servers(mock: &MockServer, names: &[&str], expected: u64) {
    Mock::given(method("GET"))
        .and(path("/pms/servers.xml"))
        .and(header("Authorization", format!("Bearer {}", common::TOKEN).as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(common::servers_xml(names), "application/xml"),
        )
        .expect(expected)
        .mount(mock)
        .await;
}

fn discovery(mock: &MockServer) -> DiscoverySelection {
    let api = PlexApi::new(&common::settings(mock)).unwrap();
    DiscoverySelection::new(Arc::new(api))
}

#[tokio::test]
async fn test_single_server_response_is_a_list() {
    let mock = MockServer::start().await;
    mount_servers(&mock, &["nas"], 1).await;

    let mut session = common::authenticated_session();
    let servers = discovery(&mock).list_servers(&mut session).await.unwrap();

    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0].name, "nas");
    assert_eq!(servers[0].scheme, "http");
    assert_eq!(servers[0].host, "10.0.0.0");
    assert_eq!(servers[0].port, "32400");
}

#[tokio::test]
async fn test_servers_are_cached_on_session() {
    let mock = MockServer::start().await;
    mount_servers(&mock, &["nas", "cloud"], 1).await;

    let discovery = discovery(&mock);
    let mut session = common::authenticated_session();

    let first = discovery.list_servers(&mut session).await.unwrap();
    let second = discovery.list_servers(&mut session).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(session.servers().map(|s| s.len()), Some(2));
}

#[tokio::test]
async fn test_listing_requires_token() {
    let mock = MockServer::start().await;
    mount_servers(&mock, &["nas"], 0).await;

    let mut session = Session::new("s", Duration::from_secs(60));
    let err = discovery(&mock)
        .list_servers(&mut session)
        .await
        .unwrap_err();
    assert!(matches!(err, PlexError::PreconditionUnmet(_)));
}

#[tokio::test]
async fn test_discovery_failure_leaves_cache_untouched() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pms/servers.xml"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock)
        .await;

    let mut session = common::authenticated_session();
    let err = discovery(&mock)
        .list_servers(&mut session)
        .await
        .unwrap_err();

    assert!(err.is_upstream());
    assert!(session.servers().is_none());
}

#[tokio::test]
async fn test_select_known_server_is_idempotent() {
    let mock = MockServer::start().await;
    mount_servers(&mock, &["nas", "cloud"], 1).await;

    let discovery = discovery(&mock);
    let mut session = common::authenticated_session();

    let selected = discovery.select_server(&mut session, "cloud").await.unwrap();
    assert_eq!(selected.name, "cloud");
    assert_eq!(session.current_server(), Some(&selected));

    discovery.select_section(&mut session, "Movies").unwrap();
    let again = discovery.select_server(&mut session, "cloud").await.unwrap();
    assert_eq!(again, selected);
    assert_eq!(session.current_section(), Some("Movies"));
}

#[tokio::test]
async fn test_select_unknown_server_leaves_session_unchanged() {
    let mock = MockServer::start().await;
    mount_servers(&mock, &["nas"], 1).await;

    let discovery = discovery(&mock);
    let mut session = common::authenticated_session();
    discovery.select_server(&mut session, "nas").await.unwrap();

    let err = discovery
        .select_server(&mut session, "Nas")
        .await
        .unwrap_err();

    assert!(matches!(err, PlexError::SelectionNotFound { kind: "server", .. }));
    assert_eq!(err.status_code().as_u16(), 404);
    assert_eq!(session.current_server().map(|s| s.name.as_str()), Some("nas"));
}

#[tokio::test]
async fn test_list_sections_of_selected_server() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/sections"))
        .and(header("X-Plex-Token", common::TOKEN))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::sections_json()))
        .expect(1)
        .mount(&mock)
        .await;

    let mut session = common::authenticated_session();
    session
        .select_server(common::server_meta(&mock, "local"))
        .unwrap();

    let sections = discovery(&mock).list_sections(&session).await.unwrap();
    let titles: Vec<_> = sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Movies", "Music"]);
    assert_eq!(sections[0].kind, "movie");
}

#[tokio::test]
async fn test_select_section_requires_server() {
    let mock = MockServer::start().await;
    let mut session = common::authenticated_session();

    let err = discovery(&mock)
        .select_section(&mut session, "Movies")
        .unwrap_err();
    assert_eq!(err.status_code().as_u16(), 400);
    assert!(session.current_section().is_none());
}
