//! # pmoserver - Serveur web haut niveau basé sur Axum
//!
//! Cette crate fournit une abstraction simple pour créer le serveur HTTP de PMOPlex
//! avec Axum.
//!
//! ## Fonctionnalités
//!
//! - **API de haut niveau** : composition de routers Axum avec `add_router()`
//! - **Traces HTTP** : chaque requête est tracée via `tower-http`
//! - **Logs** : initialisation de `tracing` depuis la configuration
//! - **Arrêt gracieux** : gestion propre de l'arrêt sur Ctrl+C
//!
//! ## Architecture
//!
//! - [`server`] : Implémentation du serveur principal et du builder
//! - [`logs`] : Initialisation du système de logs
//!
//! Les crates métier (ex: `pmoplex`) étendent [`Server`] par des traits d'extension,
//! sans que `pmoserver` ne dépende d'elles.
//!
//! ## Exemple d'utilisation
//!
//! ```rust,no_run
//! use pmoserver::{ServerBuilder, logs::LoggingOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = ServerBuilder::new("MyServer", "localhost", 8080).build();
//!     server.init_logging(LoggingOptions::default());
//!
//!     server.add_route("/info", || async {
//!         serde_json::json!({"status": "ok"})
//!     }).await;
//!
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

pub mod logs;
pub mod server;

pub use logs::LoggingOptions;
pub use server::{Server, ServerBuilder, ServerInfo};
