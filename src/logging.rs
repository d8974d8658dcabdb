//! # Logging
//! src/logging.rs
//!
//! Inicializa `tracing` con un layer `fmt`. `RUST_LOG` tiene prioridad sobre
//! el nivel configurado (ej: `RUST_LOG=simple_web_server=debug`).

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Instala el subscriber global
///
/// Retorna `false` si ya había uno instalado (ej: en tests).
pub fn init(default_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .try_init()
        .is_ok()
}
