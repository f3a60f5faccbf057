//! Agrégation des métadonnées d'une section
//!
//! Une requête de liste, puis une requête de métadonnées par média, exécutées en
//! parallèle dans un pool borné propre à chaque appel. Les échecs individuels
//! n'interrompent pas l'agrégation : ils sont rapportés dans `failed`.

use crate::api::PlexApi;
use crate::config_ext::PlexSettings;
use crate::error::{PlexError, Result};
use crate::models::{FailedItem, ItemRef, SectionItems};
use crate::session::SectionTarget;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

/// Motif d'échec des médias abandonnés à l'échéance
pub const TIMEOUT_REASON: &str = "timeout";

#[derive(Debug, Clone)]
pub struct MetadataAggregator {
    api: Arc<PlexApi>,
    workers: usize,
    timeout: Duration,
}

impl MetadataAggregator {
    pub fn new(api: Arc<PlexApi>, settings: &PlexSettings) -> Self {
        Self {
            api,
            workers: settings.metadata_workers.max(1),
            timeout: settings.fanout_timeout,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Récupère les métadonnées de tous les médias de la section ciblée
    ///
    /// L'ordre des résultats est celui de complétion. Abandonner le future
    /// annule toutes les requêtes en cours. Passé `fanout_timeout`, les médias
    /// restants sont rapportés en échec ; l'appel n'échoue en `Timeout` que si
    /// aucun média n'a abouti.
    pub async fn fetch_section_items(&self, target: &SectionTarget) -> Result<SectionItems> {
        let section = self
            .api
            .sections(&target.server, &target.token)
            .await?
            .into_iter()
            .find(|section| section.title == target.section)
            .ok_or_else(|| PlexError::not_found("section", &target.section))?;

        let items = self
            .api
            .section_items(&target.server, &target.token, &section.key)
            .await?;
        let expected = items.len();
        debug!(
            "Section '{}' has {} item(s), fetching metadata with {} workers",
            section.title, expected, self.workers
        );

        let (result, timed_out) = self.fan_out(target, items).await;
        if timed_out {
            warn!(
                "Metadata aggregation for '{}' exceeded {:?}, {} item(s) abandoned",
                section.title,
                self.timeout,
                result.failed.iter().filter(|f| f.reason == TIMEOUT_REASON).count()
            );
            // Rien n'a abouti : le délai est une erreur, sinon un résultat partiel
            if result.items.is_empty() {
                return Err(PlexError::Timeout(format!("section '{}'", section.title)));
            }
        }

        info!(
            "Section '{}': {} item(s) fetched, {} failed",
            section.title,
            result.items.len(),
            result.failed.len()
        );
        Ok(result)
    }

    /// Exécute les requêtes par média, dans la limite de `workers` simultanées
    ///
    /// À l'échéance, les tâches restantes sont annulées et leurs médias rapportés
    /// en échec ; les résultats déjà obtenus sont conservés. Le booléen indique si
    /// l'échéance a été atteinte.
    async fn fan_out(&self, target: &SectionTarget, items: Vec<ItemRef>) -> (SectionItems, bool) {
        let deadline = Instant::now() + self.timeout;
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        let mut pending: HashMap<task::Id, ItemRef> = HashMap::with_capacity(items.len());

        for item in items {
            let api = self.api.clone();
            let sem = semaphore.clone();
            let server = target.server.clone();
            let token = target.token.clone();
            let rating_key = item.rating_key.clone();

            let handle = tasks.spawn(async move {
                match sem.acquire_owned().await {
                    Ok(_permit) => api.item_metadata(&server, &token, &rating_key).await,
                    Err(_) => Err(PlexError::Timeout("worker pool closed".to_string())),
                }
            });
            pending.insert(handle.id(), item);
        }

        let mut result = SectionItems::default();
        let mut timed_out = false;
        loop {
            match timeout_at(deadline, tasks.join_next_with_id()).await {
                Ok(None) => break,
                Ok(Some(Ok((id, Ok(meta))))) => {
                    pending.remove(&id);
                    result.items.push(meta);
                }
                Ok(Some(Ok((id, Err(e))))) => {
                    if let Some(item) = pending.remove(&id) {
                        warn!("Metadata for item {} failed: {}", item.rating_key, e);
                        result.failed.push(failed(item, e.to_string()));
                    }
                }
                Ok(Some(Err(e))) => {
                    if let Some(item) = pending.remove(&e.id()) {
                        warn!("Metadata task for item {} aborted: {}", item.rating_key, e);
                        result.failed.push(failed(item, e.to_string()));
                    }
                }
                Err(_) => {
                    timed_out = true;
                    tasks.abort_all();
                    result.failed.extend(
                        pending
                            .drain()
                            .map(|(_, item)| failed(item, TIMEOUT_REASON.to_string())),
                    );
                    break;
                }
            }
        }

        (result, timed_out)
    }
}

fn failed(item: ItemRef, reason: String) -> FailedItem {
    FailedItem {
        rating_key: item.rating_key,
        title: item.title,
        reason,
    }
}
