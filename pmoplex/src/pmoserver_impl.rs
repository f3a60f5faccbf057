//! Implémentation du trait PlexServerExt pour pmoserver::Server
//!
//! `pmoplex` étend `pmoserver::Server` sans que `pmoserver` connaisse `pmoplex`.

use crate::api_rest::create_router;
use crate::config_ext::{PlexConfigExt, PlexSettings};
use crate::pmoserver_ext::{PlexServerExt, PlexState};
use crate::session::{MemorySessionStore, SessionStore, StoreSettings, spawn_sweeper};
use anyhow::Result;
use pmoserver::Server;
use std::sync::Arc;
use tracing::info;

impl PlexServerExt for Server {
    async fn init_plex(&mut self) -> Result<PlexState> {
        let config = pmoconfig::get_config();
        let settings = config.plex_settings()?;
        let store = config.store_settings();
        self.init_plex_with_settings(settings, store).await
    }

    async fn init_plex_with_settings(
        &mut self,
        settings: PlexSettings,
        store: StoreSettings,
    ) -> Result<PlexState> {
        info!("Initializing Plex routes (plex.tv at {})...", settings.api_base);

        let sweep_interval = store.sweep_interval;
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new(store));
        let state = PlexState::new(&settings, store.clone())
            .map_err(|e| anyhow::anyhow!("Failed to create Plex client: {}", e))?;

        self.add_router("/", create_router(state.clone())).await;

        if let Some(interval) = sweep_interval {
            self.add_background_task(spawn_sweeper(store, interval));
            info!("Session sweep every {:?}", interval);
        }

        info!(
            "Plex routes ready ({} metadata workers, frontend at {})",
            state.aggregator.workers(),
            state.frontend_path
        );
        Ok(state)
    }
}
