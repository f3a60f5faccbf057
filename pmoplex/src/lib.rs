//! # pmoplex - Accès Plex pour navigateur sans identité
//!
//! Cette crate relie un navigateur, identifié seulement par un cookie de session
//! aléatoire, à l'écosystème Plex :
//! - Appairage par code PIN (plex.tv/link) jusqu'à l'obtention d'un token
//! - Découverte des serveurs du compte et choix d'un serveur et d'une section
//! - Agrégation concurrente (pool borné) des métadonnées d'une section
//! - Proxy streaming des vignettes et affiches, sans mise en mémoire du corps
//!
//! ## Architecture
//!
//! La crate suit le pattern d'extension des autres crates PMO :
//! - `session` : Sessions navigateur et store en mémoire
//! - `api` : Couche d'accès à plex.tv et aux serveurs Plex
//! - `pairing`, `discovery`, `aggregator`, `proxy` : Le parcours lui-même
//! - `api_rest` : Handlers HTTP (axum)
//! - `PlexServerExt` / `PlexConfigExt` : Intégration avec pmoserver et pmoconfig
//!
//! ```text
//! pmoplex/
//! ├── src/
//! │   ├── lib.rs              # Module principal (ce fichier)
//! │   ├── error.rs            # Gestion des erreurs
//! │   ├── models.rs           # Structures de données
//! │   ├── session.rs          # Sessions et store
//! │   ├── api/
//! │   │   ├── mod.rs          # Client bas-niveau
//! │   │   ├── pins.rs         # Appairage (plex.tv)
//! │   │   ├── servers.rs      # Découverte (plex.tv)
//! │   │   ├── library.rs      # Sections et métadonnées (serveur)
//! │   │   └── assets.rs       # Assets bruts (serveur)
//! │   ├── pairing.rs          # Machine d'état d'appairage
//! │   ├── discovery.rs        # Choix du serveur et de la section
//! │   ├── aggregator.rs       # Fan-out des métadonnées
//! │   ├── proxy.rs            # Proxy streaming
//! │   ├── pages.rs            # Pages HTML
//! │   ├── api_rest.rs         # Routes HTTP
//! │   ├── config_ext.rs       # Extension pmoconfig
//! │   ├── pmoserver_ext.rs    # Extension pmoserver (trait)
//! │   └── pmoserver_impl.rs   # Extension pmoserver (impl)
//! ```
//!
//! ## Utilisation
//!
//! ```rust,no_run
//! use pmoplex::PlexServerExt;
//! use pmoserver::ServerBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = ServerBuilder::new_configured().build();
//!     server.init_plex().await?;
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod api;
pub mod api_rest;
pub mod config_ext;
pub mod discovery;
pub mod error;
pub mod models;
pub mod pages;
pub mod pairing;
pub mod pmoserver_ext;
pub mod proxy;
pub mod session;

mod pmoserver_impl;

pub use aggregator::MetadataAggregator;
pub use api::PlexApi;
pub use config_ext::{PlexConfigExt, PlexSettings};
pub use discovery::DiscoverySelection;
pub use error::{PlexError, Result};
pub use models::{
    AuthToken, FailedItem, ItemRef, MediaItemMeta, Pairing, SectionItems, SectionMeta, ServerMeta,
};
pub use pairing::{PairingFlow, PairingStatus};
pub use pmoserver_ext::{PlexServerExt, PlexState};
pub use proxy::{AssetProxy, AssetStream};
pub use session::{
    MemorySessionStore, Resolved, SectionTarget, ServerTarget, Session, SessionPhase,
    SessionStore, StoreSettings,
};
