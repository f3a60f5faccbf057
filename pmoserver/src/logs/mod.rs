//! Initialisation du système de logs
//!
//! Le subscriber `tracing` est composé d'un filtre de niveau et,
//! optionnellement, d'une sortie console.

use pmoconfig::Config;
use tracing::Level;
use tracing_subscriber::{
    Registry, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Options d'initialisation du système de logging
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Niveau minimum (ERROR, WARN, INFO, DEBUG, TRACE)
    pub min_level: String,
    /// Activer la sortie vers la console
    pub enable_console: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            min_level: "INFO".to_string(),
            enable_console: true,
        }
    }
}

impl LoggingOptions {
    /// Lit les options depuis la section `host.logger` de la configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_level: config.get_log_min_level(),
            enable_console: config.get_log_enable_console(),
        }
    }
}

/// Initialise le système de logging
///
/// Si un subscriber global est déjà installé (tests, double initialisation),
/// l'installation est ignorée. Retourne le niveau effectivement retenu.
///
/// # Exemple
/// ```rust,no_run
/// use pmoserver::logs::{init_logging, LoggingOptions};
///
/// let level = init_logging(LoggingOptions {
///     min_level: "DEBUG".to_string(),
///     enable_console: true,
/// });
/// ```
pub fn init_logging(options: LoggingOptions) -> Level {
    let level = string_to_level(&options.min_level).unwrap_or(Level::INFO);

    // Le filtre doit être appliqué avant la sortie console
    let subscriber = Registry::default().with(level_to_levelfilter(level));

    let result = if options.enable_console {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .try_init()
    } else {
        subscriber.try_init()
    };

    if let Err(e) = result {
        eprintln!("Logging already initialised: {}", e);
    }

    level
}

pub fn string_to_level(s: &str) -> Option<Level> {
    match s.to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}

fn level_to_levelfilter(level: Level) -> LevelFilter {
    match level {
        Level::ERROR => LevelFilter::ERROR,
        Level::WARN => LevelFilter::WARN,
        Level::INFO => LevelFilter::INFO,
        Level::DEBUG => LevelFilter::DEBUG,
        Level::TRACE => LevelFilter::TRACE,
    }
}
