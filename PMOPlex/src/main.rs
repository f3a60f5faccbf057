use pmoconfig::get_config;
use pmoplex::PlexServerExt;
use pmoserver::{LoggingOptions, ServerBuilder};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ========== PHASE 1 : Infrastructure ==========

    let config = get_config();
    let mut server = ServerBuilder::new_configured().build();
    server.init_logging(LoggingOptions::from_config(&config));
    info!("📁 Configuration loaded from {}", config.dir());

    server
        .add_route("/info", || async {
            serde_json::json!({"name": "PMOPlex", "version": env!("CARGO_PKG_VERSION")})
        })
        .await;

    // ========== PHASE 2 : Parcours Plex ==========

    info!("🔑 Initializing Plex pairing and library routes...");
    let state = server.init_plex().await?;
    info!("✅ Plex routes ready, selected sessions redirect to {}", state.frontend_path);

    // ========== PHASE 3 : Démarrage du serveur ==========

    info!("🌐 Starting HTTP server...");
    server.start().await?;

    info!("✅ PMOPlex is ready!");
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    Ok(())
}
