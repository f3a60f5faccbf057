//! Extension pour intégrer Plex dans pmoconfig
//!
//! Ce module fournit le trait `PlexConfigExt` qui ajoute à `pmoconfig::Config`
//! les getters des sections `plex` et `sessions`, et construit les structures
//! de réglages consommées par le reste de la crate.
//!
//! # Exemple
//!
//! ```no_run
//! use pmoconfig::get_config;
//! use pmoplex::PlexConfigExt;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = get_config();
//! let settings = config.plex_settings()?;
//! println!("plex.tv endpoint: {}", settings.api_base);
//! # Ok(())
//! # }
//! ```

use crate::session::StoreSettings;
use anyhow::Result;
use pmoconfig::Config;
use serde_yaml::Value;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_API_BASE: &str = "https://plex.tv";
pub const DEFAULT_PRODUCT: &str = "PMOPlex Web";
pub const DEFAULT_DEVICE_NAME: &str = "PMOPlex";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_METADATA_WORKERS: usize = 100;
pub const DEFAULT_FANOUT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_FRONTEND_PATH: &str = "/app/";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 3600;
pub const DEFAULT_SESSION_CAPACITY: usize = 10_000;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Réglages du client Plex et de l'agrégation
#[derive(Debug, Clone)]
pub struct PlexSettings {
    /// Racine des appels plex.tv (surchargée dans les tests)
    pub api_base: String,
    pub client_identifier: String,
    pub product: String,
    pub version: String,
    pub device_name: String,
    /// Timeout de chaque requête amont
    pub request_timeout: Duration,
    /// Largeur du pool de récupération des métadonnées
    pub metadata_workers: usize,
    /// Timeout global d'une agrégation
    pub fanout_timeout: Duration,
    /// Redirection une fois serveur et section choisis
    pub frontend_path: String,
}

impl Default for PlexSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            client_identifier: uuid::Uuid::new_v4().to_string(),
            product: DEFAULT_PRODUCT.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            metadata_workers: DEFAULT_METADATA_WORKERS,
            fanout_timeout: Duration::from_secs(DEFAULT_FANOUT_TIMEOUT_SECS),
            frontend_path: DEFAULT_FRONTEND_PATH.to_string(),
        }
    }
}

/// Trait d'extension pour gérer la configuration Plex dans pmoconfig
///
/// Les getters numériques retombent sur la valeur par défaut quand la clé est
/// absente ou invalide. Seul l'identifiant client est persisté à la première lecture.
pub trait PlexConfigExt {
    fn get_plex_api_base(&self) -> String;

    /// Identifiant client envoyé à plex.tv (`X-Plex-Client-Identifier`)
    ///
    /// Généré (UUID v4) et sauvegardé s'il n'existe pas encore.
    fn get_plex_client_identifier(&self) -> Result<String>;

    fn get_plex_product(&self) -> String;
    fn get_plex_version(&self) -> String;
    fn get_plex_device_name(&self) -> String;
    fn get_plex_request_timeout_secs(&self) -> u64;
    fn get_plex_metadata_workers(&self) -> usize;
    fn get_plex_fanout_timeout_secs(&self) -> u64;
    fn get_plex_frontend_path(&self) -> String;

    fn get_session_ttl_secs(&self) -> u64;
    fn get_session_capacity(&self) -> usize;

    /// Intervalle de la purge des sessions expirées (0 désactive la tâche)
    fn get_session_sweep_interval_secs(&self) -> u64;

    /// Construit les réglages du client Plex
    fn plex_settings(&self) -> Result<PlexSettings>;

    /// Construit les réglages du store de sessions
    fn store_settings(&self) -> StoreSettings;
}

fn get_u64_or(config: &Config, path: &[&str], default: u64) -> u64 {
    match config.get_value(path) {
        Ok(Value::Number(n)) => n.as_u64().unwrap_or(default),
        Ok(Value::String(s)) => s.parse().unwrap_or(default),
        _ => default,
    }
}

impl PlexConfigExt for Config {
    fn get_plex_api_base(&self) -> String {
        self.get_string_or(&["plex", "api_base"], DEFAULT_API_BASE)
            .trim_end_matches('/')
            .to_string()
    }

    fn get_plex_client_identifier(&self) -> Result<String> {
        match self.get_value(&["plex", "client_identifier"]) {
            Ok(Value::String(id)) if !id.is_empty() => Ok(id),
            _ => {
                let id = uuid::Uuid::new_v4().to_string();
                info!("Generated new Plex client identifier: {}", id);
                self.set_value(&["plex", "client_identifier"], Value::String(id.clone()))?;
                Ok(id)
            }
        }
    }

    fn get_plex_product(&self) -> String {
        self.get_string_or(&["plex", "product"], DEFAULT_PRODUCT)
    }

    fn get_plex_version(&self) -> String {
        self.get_string_or(&["plex", "version"], env!("CARGO_PKG_VERSION"))
    }

    fn get_plex_device_name(&self) -> String {
        self.get_string_or(&["plex", "device_name"], DEFAULT_DEVICE_NAME)
    }

    fn get_plex_request_timeout_secs(&self) -> u64 {
        get_u64_or(
            self,
            &["plex", "request_timeout_secs"],
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )
    }

    fn get_plex_metadata_workers(&self) -> usize {
        match get_u64_or(
            self,
            &["plex", "metadata_workers"],
            DEFAULT_METADATA_WORKERS as u64,
        ) {
            0 => DEFAULT_METADATA_WORKERS,
            n => n as usize,
        }
    }

    fn get_plex_fanout_timeout_secs(&self) -> u64 {
        get_u64_or(
            self,
            &["plex", "fanout_timeout_secs"],
            DEFAULT_FANOUT_TIMEOUT_SECS,
        )
    }

    fn get_plex_frontend_path(&self) -> String {
        self.get_string_or(&["plex", "frontend_path"], DEFAULT_FRONTEND_PATH)
    }

    fn get_session_ttl_secs(&self) -> u64 {
        get_u64_or(self, &["sessions", "ttl_secs"], DEFAULT_SESSION_TTL_SECS)
    }

    fn get_session_capacity(&self) -> usize {
        get_u64_or(
            self,
            &["sessions", "capacity"],
            DEFAULT_SESSION_CAPACITY as u64,
        ) as usize
    }

    fn get_session_sweep_interval_secs(&self) -> u64 {
        get_u64_or(
            self,
            &["sessions", "sweep_interval_secs"],
            DEFAULT_SWEEP_INTERVAL_SECS,
        )
    }

    fn plex_settings(&self) -> Result<PlexSettings> {
        Ok(PlexSettings {
            api_base: self.get_plex_api_base(),
            client_identifier: self.get_plex_client_identifier()?,
            product: self.get_plex_product(),
            version: self.get_plex_version(),
            device_name: self.get_plex_device_name(),
            request_timeout: Duration::from_secs(self.get_plex_request_timeout_secs()),
            metadata_workers: self.get_plex_metadata_workers(),
            fanout_timeout: Duration::from_secs(self.get_plex_fanout_timeout_secs()),
            frontend_path: self.get_plex_frontend_path(),
        })
    }

    fn store_settings(&self) -> StoreSettings {
        let sweep = self.get_session_sweep_interval_secs();
        StoreSettings {
            ttl: Duration::from_secs(self.get_session_ttl_secs()),
            capacity: self.get_session_capacity(),
            sweep_interval: (sweep > 0).then(|| Duration::from_secs(sweep)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn load(yaml: Option<&str>) -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        if let Some(yaml) = yaml {
            fs::write(dir.path().join("config.yaml"), yaml).unwrap();
        }
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        (dir, config)
    }

    #[test]
    fn test_embedded_defaults() {
        let (_dir, config) = load(None);
        let settings = config.plex_settings().unwrap();

        assert_eq!(settings.api_base, "https://plex.tv");
        assert_eq!(settings.metadata_workers, 100);
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert_eq!(settings.frontend_path, "/app/");

        let store = config.store_settings();
        assert_eq!(store.ttl, Duration::from_secs(86400));
        assert_eq!(store.capacity, 10_000);
        assert_eq!(store.sweep_interval, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_client_identifier_is_persisted() {
        let (dir, config) = load(None);
        let first = config.get_plex_client_identifier().unwrap();
        assert_eq!(config.get_plex_client_identifier().unwrap(), first);

        let reloaded = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(reloaded.get_plex_client_identifier().unwrap(), first);
    }

    #[test]
    fn test_user_overrides() {
        let (_dir, config) = load(Some(
            "plex:\n  api_base: http://127.0.0.1:9000/\n  metadata_workers: 8\nsessions:\n  sweep_interval_secs: 0\n",
        ));

        assert_eq!(config.get_plex_api_base(), "http://127.0.0.1:9000");
        assert_eq!(config.get_plex_metadata_workers(), 8);
        assert!(config.store_settings().sweep_interval.is_none());
    }

    #[test]
    fn test_zero_workers_falls_back_to_default() {
        let (_dir, config) = load(Some("plex:\n  metadata_workers: 0\n"));
        assert_eq!(config.get_plex_metadata_workers(), DEFAULT_METADATA_WORKERS);
    }
}
