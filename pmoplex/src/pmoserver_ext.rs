//! Extension pmoserver pour Plex
//!
//! Ce module fournit un trait d'extension pour monter le parcours Plex
//! (appairage, sélection, agrégation, proxy) sur un serveur pmoserver.

use crate::aggregator::MetadataAggregator;
use crate::api::PlexApi;
use crate::config_ext::PlexSettings;
use crate::discovery::DiscoverySelection;
use crate::error::Result;
use crate::pairing::PairingFlow;
use crate::proxy::AssetProxy;
use crate::session::{SessionStore, StoreSettings};
use std::sync::Arc;

/// État partagé pour les handlers Plex
#[derive(Clone)]
pub struct PlexState {
    pub store: Arc<dyn SessionStore>,
    pub pairing: PairingFlow,
    pub discovery: DiscoverySelection,
    pub aggregator: MetadataAggregator,
    pub proxy: AssetProxy,
    /// Redirection une fois serveur et section choisis
    pub frontend_path: String,
}

impl PlexState {
    /// Construit l'état à partir des réglages et d'un store de sessions
    pub fn new(settings: &PlexSettings, store: Arc<dyn SessionStore>) -> Result<Self> {
        let api = Arc::new(PlexApi::new(settings)?);
        Ok(Self {
            store,
            pairing: PairingFlow::new(api.clone()),
            discovery: DiscoverySelection::new(api.clone()),
            aggregator: MetadataAggregator::new(api.clone(), settings),
            proxy: AssetProxy::new(api),
            frontend_path: settings.frontend_path.clone(),
        })
    }
}

/// Trait pour étendre pmoserver avec le parcours Plex
///
/// Ce trait permet à `pmoplex` d'ajouter des méthodes d'extension sur
/// `pmoserver::Server` sans que pmoserver dépende de pmoplex.
///
/// # Exemple
///
/// ```rust,no_run
/// use pmoplex::PlexServerExt;
/// use pmoserver::ServerBuilder;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut server = ServerBuilder::new_configured().build();
///     server.init_plex().await?;
///
///     server.start().await?;
///     server.wait().await;
///     Ok(())
/// }
/// ```
pub trait PlexServerExt {
    /// Initialise le parcours Plex depuis la configuration globale
    ///
    /// # Routes enregistrées
    ///
    /// - `GET /` - Appairage puis choix du serveur et de la section
    /// - `GET /select_server/{name}` - Sélection d'un serveur
    /// - `GET /select_section/{name}` - Sélection d'une section
    /// - `GET /list` - Métadonnées de la section (JSON)
    /// - `GET /plex_asset/{*path}` - Proxy des assets
    /// - `GET /health` - Sonde de vie
    async fn init_plex(&mut self) -> anyhow::Result<PlexState>;

    /// Initialise le parcours Plex avec des réglages explicites
    ///
    /// Le store est créé ici ; la purge périodique est rattachée au serveur si
    /// `store.sweep_interval` est défini.
    async fn init_plex_with_settings(
        &mut self,
        settings: PlexSettings,
        store: StoreSettings,
    ) -> anyhow::Result<PlexState>;
}

// L'implémentation du trait est dans pmoserver_impl.rs
