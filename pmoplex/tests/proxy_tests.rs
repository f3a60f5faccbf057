//! Tests d'intégration du proxy d'assets

mod common;

use futures::StreamExt;
use pmoplex::{AssetProxy, PlexApi, PlexError, ServerMeta, ServerTarget};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ASSET_PATH: &str = "/library/metadata/42/thumb/1600000000";

fn proxy(mock: &MockServer) -> AssetProxy {
    let api = PlexApi::new(&common::settings(mock)).unwrap();
    AssetProxy::new(Arc::new(api))
}

fn target(mock: &MockServer) -> ServerTarget {
    ServerTarget {
        token: common::TOKEN.to_string(),
        server: common::server_meta(mock, "local"),
    }
}

#[tokio::test]
async fn test_large_asset_is_streamed_in_chunks() {
    let mock = MockServer::start().await;
    let size = 8 * 1024 * 1024;
    let payload: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();

    Mock::given(method("GET"))
        .and(path(ASSET_PATH))
        .and(query_param("X-Plex-Token", common::TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_raw(payload.clone(), "image/jpeg"))
        .expect(1)
        .mount(&mock)
        .await;

    let mut asset = proxy(&mock)
        .open(&target(&mock), ASSET_PATH.trim_start_matches('/'))
        .await
        .unwrap();

    assert_eq!(asset.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(asset.content_length, Some(size as u64));

    let mut received = Vec::with_capacity(size);
    let mut chunks = 0;
    while let Some(chunk) = asset.body.next().await {
        let chunk = chunk.unwrap();
        assert!(chunk.len() < 1024 * 1024, "chunk of {} bytes", chunk.len());
        received.extend_from_slice(&chunk);
        chunks += 1;
    }

    assert!(chunks > 1);
    assert_eq!(received.len(), size);
    assert!(received == payload);
}

#[tokio::test]
async fn test_upstream_error_status() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock)
        .await;

    let err = proxy(&mock)
        .open(&target(&mock), "missing.jpg")
        .await
        .unwrap_err();

    match err {
        PlexError::UpstreamStatus { status, url } => {
            assert_eq!(status.as_u16(), 404);
            // Le token ne doit pas apparaître dans les erreurs
            assert!(!url.contains(common::TOKEN));
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Serveur HTTP brut d'une seule connexion : lit la requête puis confie la
/// socket à `body`
async fn raw_server<F, Fut>(body: F) -> ServerMeta
where
    F: FnOnce(TcpStream) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = vec![0u8; 4096];
        let _ = socket.read(&mut request).await.unwrap();
        body(socket).await;
    });

    ServerMeta {
        name: "raw".to_string(),
        scheme: "http".to_string(),
        host: addr.ip().to_string(),
        port: addr.port().to_string(),
    }
}

fn headers(announced: usize) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        announced
    )
}

#[tokio::test]
async fn test_truncated_upstream_ends_with_error() {
    let mock = MockServer::start().await;
    let server = raw_server(|mut socket| async move {
        socket.write_all(headers(100_000).as_bytes()).await.unwrap();
        socket.write_all(&[1u8; 1000]).await.unwrap();
        socket.shutdown().await.unwrap();
    })
    .await;

    let target = ServerTarget {
        token: common::TOKEN.to_string(),
        server,
    };
    let mut asset = proxy(&mock).open(&target, "thumb.jpg").await.unwrap();
    assert_eq!(asset.content_length, Some(100_000));

    let mut received = 0;
    let mut error = None;
    while let Some(chunk) = asset.body.next().await {
        match chunk {
            Ok(bytes) => received += bytes.len(),
            Err(e) => {
                error = Some(e);
                break;
            }
        }
    }

    assert_eq!(received, 1000);
    assert!(error.is_some(), "stream ended without error");
    // Le flux est terminé après l'erreur
    assert!(asset.body.next().await.is_none());
}

#[tokio::test]
async fn test_dropping_stream_releases_upstream() {
    let mock = MockServer::start().await;
    let (closed_tx, closed_rx) = oneshot::channel();
    let server = raw_server(|mut socket| async move {
        socket
            .write_all(headers(1024 * 1024 * 1024).as_bytes())
            .await
            .unwrap();
        let chunk = vec![9u8; 64 * 1024];
        let mut written = 0usize;
        // Écrit jusqu'à ce que le client ferme la connexion
        while socket.write_all(&chunk).await.is_ok() {
            written += chunk.len();
            if written >= 1024 * 1024 * 1024 {
                break;
            }
        }
        let _ = closed_tx.send(written);
    })
    .await;

    let target = ServerTarget {
        token: common::TOKEN.to_string(),
        server,
    };
    let mut asset = proxy(&mock).open(&target, "big.bin").await.unwrap();
    let first = asset.body.next().await.unwrap().unwrap();
    assert!(!first.is_empty());
    drop(asset);

    let written = tokio::time::timeout(Duration::from_secs(10), closed_rx)
        .await
        .expect("upstream connection still open after drop")
        .unwrap();
    assert!(written < 1024 * 1024 * 1024);
}
