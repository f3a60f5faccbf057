//! Sessions navigateur
//!
//! Chaque navigateur est identifié par un cookie `session` opaque. L'état associé
//! (appairage, token, serveur et section choisis) est porté par [`Session`] et
//! conservé en mémoire par un [`SessionStore`].
//!
//! L'état d'une session est un [`SessionPhase`] qui n'avance que dans un sens :
//! une fois un token obtenu, la session ne repasse jamais par l'appairage.

use crate::error::{PlexError, Result};
use crate::models::{AuthToken, Pairing, ServerMeta};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use rand::distr::Alphanumeric;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Longueur des identifiants de session
pub const SESSION_ID_LEN: usize = 64;

/// Génère un identifiant de session (64 caractères alphanumériques, CSPRNG)
pub fn new_session_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

fn is_well_formed(id: &str) -> bool {
    id.len() == SESSION_ID_LEN && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Étape courante du parcours d'une session
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionPhase {
    #[default]
    Unauthenticated,
    Pairing(Pairing),
    Authenticated {
        token: AuthToken,
    },
    ServerSelected {
        token: AuthToken,
        server: ServerMeta,
    },
    SectionSelected {
        token: AuthToken,
        server: ServerMeta,
        section: String,
    },
}

/// Copie des champs nécessaires pour interroger le serveur choisi
#[derive(Debug, Clone, PartialEq)]
pub struct ServerTarget {
    pub token: AuthToken,
    pub server: ServerMeta,
}

/// Copie des champs nécessaires pour agréger une section
#[derive(Debug, Clone, PartialEq)]
pub struct SectionTarget {
    pub token: AuthToken,
    pub server: ServerMeta,
    pub section: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    expires_at: DateTime<Utc>,
    phase: SessionPhase,
    servers: Option<Vec<ServerMeta>>,
}

impl Session {
    pub fn new(id: impl Into<String>, ttl: Duration) -> Self {
        let ttl =
            chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500));
        Self {
            id: id.into(),
            expires_at: Utc::now()
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            phase: SessionPhase::Unauthenticated,
            servers: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn pairing(&self) -> Option<&Pairing> {
        match &self.phase {
            SessionPhase::Pairing(pairing) => Some(pairing),
            _ => None,
        }
    }

    pub fn auth_token(&self) -> Option<&str> {
        match &self.phase {
            SessionPhase::Authenticated { token }
            | SessionPhase::ServerSelected { token, .. }
            | SessionPhase::SectionSelected { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn current_server(&self) -> Option<&ServerMeta> {
        match &self.phase {
            SessionPhase::ServerSelected { server, .. }
            | SessionPhase::SectionSelected { server, .. } => Some(server),
            _ => None,
        }
    }

    pub fn current_section(&self) -> Option<&str> {
        match &self.phase {
            SessionPhase::SectionSelected { section, .. } => Some(section),
            _ => None,
        }
    }

    /// Liste des serveurs en cache, si déjà découverte
    pub fn servers(&self) -> Option<&[ServerMeta]> {
        self.servers.as_deref()
    }

    pub fn cache_servers(&mut self, servers: Vec<ServerMeta>) {
        self.servers = Some(servers);
    }

    /// Enregistre un PIN fraîchement émis
    ///
    /// Sans effet si la session détient déjà un token.
    pub fn begin_pairing(&mut self, pairing: Pairing) {
        match self.phase {
            SessionPhase::Unauthenticated | SessionPhase::Pairing(_) => {
                self.phase = SessionPhase::Pairing(pairing);
            }
            _ => debug!(session = %self.short_id(), "Ignoring PIN, session already authenticated"),
        }
    }

    /// Stocke le token obtenu et abandonne l'appairage
    ///
    /// Retourne `false` si le token est vide ou si la session en a déjà un.
    pub fn authenticate(&mut self, token: AuthToken) -> bool {
        if token.is_empty() || self.auth_token().is_some() {
            return false;
        }
        self.phase = SessionPhase::Authenticated { token };
        true
    }

    /// Sélectionne un serveur
    ///
    /// Changer de serveur efface la section choisie, resélectionner le même la conserve.
    pub fn select_server(&mut self, server: ServerMeta) -> Result<()> {
        let phase = std::mem::take(&mut self.phase);
        self.phase = match phase {
            SessionPhase::Authenticated { token } | SessionPhase::ServerSelected { token, .. } => {
                SessionPhase::ServerSelected { token, server }
            }
            SessionPhase::SectionSelected {
                token,
                server: current,
                section,
            } => {
                if current == server {
                    SessionPhase::SectionSelected {
                        token,
                        server,
                        section,
                    }
                } else {
                    SessionPhase::ServerSelected { token, server }
                }
            }
            other => {
                self.phase = other;
                return Err(PlexError::PreconditionUnmet("auth token"));
            }
        };
        Ok(())
    }

    /// Enregistre la section choisie (non validée auprès du serveur)
    pub fn select_section(&mut self, section: impl Into<String>) -> Result<()> {
        let phase = std::mem::take(&mut self.phase);
        self.phase = match phase {
            SessionPhase::ServerSelected { token, server }
            | SessionPhase::SectionSelected { token, server, .. } => {
                SessionPhase::SectionSelected {
                    token,
                    server,
                    section: section.into(),
                }
            }
            other => {
                self.phase = other;
                return Err(PlexError::PreconditionUnmet("server"));
            }
        };
        Ok(())
    }

    /// Token et serveur courants, copiés pour être utilisés hors verrou
    pub fn server_target(&self) -> Result<ServerTarget> {
        let token = self
            .auth_token()
            .ok_or(PlexError::PreconditionUnmet("auth token"))?;
        let server = self
            .current_server()
            .ok_or(PlexError::PreconditionUnmet("server"))?;
        Ok(ServerTarget {
            token: token.to_string(),
            server: server.clone(),
        })
    }

    /// Token, serveur et section courants, copiés pour être utilisés hors verrou
    pub fn section_target(&self) -> Result<SectionTarget> {
        let ServerTarget { token, server } = self.server_target()?;
        let section = self
            .current_section()
            .ok_or(PlexError::PreconditionUnmet("section"))?;
        Ok(SectionTarget {
            token,
            server,
            section: section.to_string(),
        })
    }

    /// Préfixe de l'identifiant, pour les logs
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(8) {
            Some((end, _)) => &self.id[..end],
            None => &self.id,
        }
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// Résultat de [`SessionStore::resolve`]
#[derive(Debug, Clone)]
pub struct Resolved {
    pub id: String,
    pub handle: SessionHandle,
    /// Vrai si la session vient d'être créée (le cookie doit être émis)
    pub created: bool,
}

/// Réglages du store de sessions
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub ttl: Duration,
    pub capacity: usize,
    /// `None` désactive la purge périodique
    pub sweep_interval: Option<Duration>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 3600),
            capacity: 10_000,
            sweep_interval: Some(Duration::from_secs(300)),
        }
    }
}

/// Stockage des sessions
///
/// Les opérations ne peuvent pas échouer : une session absente ou expirée est
/// simplement recréée.
pub trait SessionStore: Send + Sync {
    /// Retrouve la session `id`, ou en crée une nouvelle
    ///
    /// Une session expirée est remplacée sous la même clé. Sans identifiant (ou
    /// avec un identifiant mal formé), une nouvelle clé est générée.
    fn resolve(&self, id: Option<&str>) -> Resolved;

    /// Insère (ou remplace) une session sous son identifiant
    fn put(&self, session: Session) -> SessionHandle;

    /// Supprime les sessions expirées, retourne le nombre de sessions supprimées
    fn sweep_expired(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Durée de vie d'une session neuve
    fn ttl(&self) -> Duration;
}

struct Slot {
    expires_at: DateTime<Utc>,
    handle: SessionHandle,
}

impl Slot {
    fn new(session: Session) -> Self {
        Self {
            expires_at: session.expires_at(),
            handle: Arc::new(Mutex::new(session)),
        }
    }

    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Store en mémoire, sans persistance
///
/// Table concurrente shardée, chaque session derrière son propre mutex asynchrone.
///
/// # Exemple
///
/// ```
/// use pmoplex::{MemorySessionStore, SessionStore, StoreSettings};
///
/// let store = MemorySessionStore::new(StoreSettings::default());
/// let resolved = store.resolve(None);
/// assert!(resolved.created);
///
/// # tokio_test::block_on(async {
/// let session = resolved.handle.lock().await;
/// assert!(session.auth_token().is_none());
/// # });
/// ```
pub struct MemorySessionStore {
    sessions: DashMap<String, Slot>,
    settings: StoreSettings,
}

impl MemorySessionStore {
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            sessions: DashMap::new(),
            settings,
        }
    }

    fn make_room(&self) {
        if self.sessions.len() < self.settings.capacity {
            return;
        }
        let evicted = self.sweep_expired();
        if self.sessions.len() >= self.settings.capacity {
            warn!(
                "Session store over capacity ({} sessions, {} evicted)",
                self.sessions.len(),
                evicted
            );
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(StoreSettings::default())
    }
}

impl SessionStore for MemorySessionStore {
    fn resolve(&self, id: Option<&str>) -> Resolved {
        let key = match id {
            Some(id) if is_well_formed(id) => id.to_string(),
            Some(_) => {
                debug!("Malformed session id, issuing a new one");
                new_session_id()
            }
            None => new_session_id(),
        };

        let now = Utc::now();
        if let Some(slot) = self.sessions.get(&key) {
            if !slot.is_expired_at(now) {
                return Resolved {
                    id: key,
                    handle: slot.handle.clone(),
                    created: false,
                };
            }
        }

        self.make_room();

        // Deux requêtes concurrentes sur la même clé obtiennent la même session
        let (handle, created) = match self.sessions.entry(key.clone()) {
            Entry::Occupied(mut entry) if entry.get().is_expired_at(now) => {
                debug!("Session expired, reissuing");
                let slot = Slot::new(Session::new(key.clone(), self.settings.ttl));
                let handle = slot.handle.clone();
                entry.insert(slot);
                (handle, true)
            }
            Entry::Occupied(entry) => (entry.get().handle.clone(), false),
            Entry::Vacant(entry) => {
                let slot = Slot::new(Session::new(key.clone(), self.settings.ttl));
                let handle = slot.handle.clone();
                entry.insert(slot);
                (handle, true)
            }
        };

        Resolved {
            id: key,
            handle,
            created,
        }
    }

    fn put(&self, session: Session) -> SessionHandle {
        self.make_room();
        let key = session.id().to_string();
        let slot = Slot::new(session);
        let handle = slot.handle.clone();
        self.sessions.insert(key, slot);
        handle
    }

    fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, slot| !slot.is_expired_at(now));
        before.saturating_sub(self.sessions.len())
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }

    fn ttl(&self) -> Duration {
        self.settings.ttl
    }
}

/// Lance la purge périodique des sessions expirées
pub fn spawn_sweeper(store: Arc<dyn SessionStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Le premier tick est immédiat
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = store.sweep_expired();
            if evicted > 0 {
                info!(
                    "Evicted {} expired session(s), {} remaining",
                    evicted,
                    store.len()
                );
            }
        }
    })
}
