//! Endpoints HTTP du parcours Plex
//!
//! Ce module définit les handlers du navigateur : appairage, choix du serveur et
//! de la section, agrégation JSON et proxy des assets.
//!
//! Chaque requête résout d'abord sa session via le cookie `session`, qui est
//! (ré)émis dès qu'une session est créée.

use crate::error::PlexError;
use crate::pages;
use crate::pairing::PairingStatus;
use crate::pmoserver_ext::PlexState;
use crate::session::Resolved;
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// Nom du cookie portant l'identifiant de session
pub const SESSION_COOKIE: &str = "session";

// ============ Gestion des erreurs ============

pub struct AppError(PlexError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            warn!("Request failed ({}): {}", status, self.0);
        } else {
            debug!("Request rejected ({}): {}", status, self.0);
        }

        let body = Json(json!({
            "error": self.0.to_string()
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<PlexError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

type HandlerResult = Result<Response, AppError>;

/// Crée le router du parcours Plex
pub fn create_router(state: PlexState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/select_server/{name}", get(select_server))
        .route("/select_section/{name}", get(select_section))
        .route("/list", get(list))
        .route("/plex_asset/{*path}", get(plex_asset))
        .route("/health", get(health))
        .with_state(state)
}

fn session_cookie(id: &str, ttl: Duration) -> Cookie<'static> {
    let max_age = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(max_age))
        .build()
}

/// Résout la session de la requête, ajoute le cookie si elle vient d'être créée
fn open_session(state: &PlexState, jar: CookieJar) -> (CookieJar, Resolved) {
    let id = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let resolved = state.store.resolve(id.as_deref());

    let jar = if resolved.created {
        debug!("Issuing session cookie");
        jar.add(session_cookie(&resolved.id, state.store.ttl()))
    } else {
        jar
    };

    (jar, resolved)
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /
/// Appairage, puis choix du serveur, puis de la section, puis redirection vers le front
async fn index(State(state): State<PlexState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, resolved) = open_session(&state, jar);
    (jar, index_page(&state, &resolved).await)
}

async fn index_page(state: &PlexState, resolved: &Resolved) -> HandlerResult {
    let mut session = resolved.handle.lock().await;

    if let PairingStatus::AwaitingPin { pin } = state.pairing.advance(&mut session).await? {
        return Ok(Html(pages::pairing(&pin)).into_response());
    }

    if session.current_server().is_none() {
        let servers = state.discovery.list_servers(&mut session).await?;
        return Ok(Html(pages::server_list(&servers)).into_response());
    }

    if session.current_section().is_none() {
        let sections = state.discovery.list_sections(&session).await?;
        return Ok(Html(pages::section_list(&sections)).into_response());
    }

    Ok(Redirect::to(&state.frontend_path).into_response())
}

/// GET /select_server/{name}
async fn select_server(
    State(state): State<PlexState>,
    jar: CookieJar,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let (jar, resolved) = open_session(&state, jar);
    (jar, choose_server(&state, &resolved, &name).await)
}

async fn choose_server(state: &PlexState, resolved: &Resolved, name: &str) -> HandlerResult {
    let mut session = resolved.handle.lock().await;
    state.discovery.select_server(&mut session, name).await?;
    Ok(Redirect::to("/").into_response())
}

/// GET /select_section/{name}
async fn select_section(
    State(state): State<PlexState>,
    jar: CookieJar,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let (jar, resolved) = open_session(&state, jar);
    (jar, choose_section(&state, &resolved, &name).await)
}

async fn choose_section(state: &PlexState, resolved: &Resolved, name: &str) -> HandlerResult {
    let mut session = resolved.handle.lock().await;
    state.discovery.select_section(&mut session, name)?;
    Ok(Redirect::to("/").into_response())
}

/// GET /list
/// Métadonnées de tous les médias de la section choisie
async fn list(State(state): State<PlexState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, resolved) = open_session(&state, jar);
    (jar, section_items(&state, &resolved).await)
}

async fn section_items(state: &PlexState, resolved: &Resolved) -> HandlerResult {
    // Le verrou est relâché avant l'agrégation
    let target = resolved.handle.lock().await.section_target()?;
    let items = state.aggregator.fetch_section_items(&target).await?;
    Ok(Json(items).into_response())
}

/// GET /plex_asset/{*path}
/// Relaye un asset du serveur choisi sans le charger en mémoire
async fn plex_asset(
    State(state): State<PlexState>,
    jar: CookieJar,
    Path(path): Path<String>,
) -> impl IntoResponse {
    let (jar, resolved) = open_session(&state, jar);
    (jar, proxy_asset(&state, &resolved, &path).await)
}

async fn proxy_asset(state: &PlexState, resolved: &Resolved, path: &str) -> HandlerResult {
    let target = resolved.handle.lock().await.server_target()?;
    let asset = state.proxy.open(&target, path).await?;

    let mut response = Body::from_stream(asset.body).into_response();
    let headers = response.headers_mut();
    if let Some(content_type) = asset
        .content_type
        .and_then(|ct| HeaderValue::from_str(&ct).ok())
    {
        headers.insert(CONTENT_TYPE, content_type);
    }
    if let Some(length) = asset.content_length {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    }
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("private, max-age=3600"));
    Ok(response)
}

/// GET /health
async fn health(State(state): State<PlexState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "sessions": state.store.len()
        })),
    )
}
