//! # Errores del servidor
//! src/error.rs
//!
//! Errores de arranque, configuración, registro de rutas y sesiones.
//! Los errores de parsing viven junto al parser (`http::request::ParseError`).

use crate::http::InvalidStatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Error que devuelve un handler. Cualquier error se convierte en un 500.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Configuración inválida
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("session lifetime must be > 0")]
    ZeroSessionLifetime,

    #[error("sweep interval must be > 0")]
    ZeroSweepInterval,

    #[error("invalid error page spec '{0}', expected CODE=FILE")]
    InvalidErrorPageSpec(String),

    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatusCode),

    #[error("cannot read error page {path}: {source}")]
    ErrorPage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Registro de ruta inválido (se detecta al arrancar, nunca por request)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route path must start with '/': {0}")]
    InvalidPath(String),

    #[error("route {0} must allow at least one HTTP method")]
    NoMethods(String),

    #[error("route {path} allows unsupported method {method}")]
    UnsupportedMethod { path: String, method: String },

    #[error("route {0} is already registered")]
    Duplicate(String),
}

/// Errores de sesión
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is expired")]
    Expired,

    #[error("request is not bound to a session store")]
    Unavailable,

    #[error("cannot serialize session value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errores fatales de arranque
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cannot bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
