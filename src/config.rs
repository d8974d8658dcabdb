//! # Configuración del Servidor
//! src/config.rs
//!
//! Este módulo define la configuración del servidor HTTP con soporte completo
//! para argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./simple_web_server --port 8081 \
//!   --compression gzip \
//!   --static-dir ./static \
//!   --session-lifetime-ms 60000 \
//!   --error-page 404=./pages/404.html
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8081 HTTP_HOST=0.0.0.0 COMPRESSION=deflate ./simple_web_server
//! ```

use crate::error::ConfigError;
use crate::http::{CompressionType, StatusCode};
use clap::Parser;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Página de error personalizada: `CODE=FILE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPageSpec {
    pub status: StatusCode,
    pub path: PathBuf,
}

/// Configuración del servidor HTTP/1.0
#[derive(Debug, Clone, Parser)]
#[command(name = "simple_web_server")]
#[command(about = "Servidor HTTP/1.0 con sesiones y compresión")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor (0 = puerto efímero)
    #[arg(short, long, default_value = "8081", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Timeout de lectura/escritura por conexión en milisegundos (0 = sin timeout)
    #[arg(long = "socket-timeout-ms", default_value = "30000", env = "SOCKET_TIMEOUT_MS")]
    pub socket_timeout_ms: u64,

    // === Respuestas ===

    /// Algoritmo de compresión (sin valor = no comprimir)
    #[arg(long, value_enum, env = "COMPRESSION")]
    pub compression: Option<CompressionType>,

    /// Directorio raíz de archivos estáticos
    #[arg(long = "static-dir", default_value = "./static", env = "STATIC_DIR")]
    pub static_dir: PathBuf,

    /// Página de error personalizada (repetible), ej: --error-page 404=./404.html
    #[arg(long = "error-page", value_name = "CODE=FILE", value_parser = parse_error_page)]
    pub error_pages: Vec<ErrorPageSpec>,

    // === Sesiones ===

    /// Vida de cada sesión en milisegundos (desde su creación)
    #[arg(long = "session-lifetime-ms", default_value = "60000", env = "SESSION_LIFETIME_MS")]
    pub session_lifetime_ms: u64,

    /// Intervalo entre barridos de sesiones vencidas en milisegundos
    #[arg(long = "sweep-interval-ms", default_value = "1000", env = "SWEEP_INTERVAL_MS")]
    pub sweep_interval_ms: u64,

    // === Logging ===

    /// Nivel de log por defecto (si `RUST_LOG` no está definida)
    #[arg(long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,
}

/// Parsea `CODE=FILE` para `--error-page`
fn parse_error_page(raw: &str) -> Result<ErrorPageSpec, ConfigError> {
    let (code, path) = raw
        .split_once('=')
        .filter(|(code, path)| !code.is_empty() && !path.is_empty())
        .ok_or_else(|| ConfigError::InvalidErrorPageSpec(raw.to_string()))?;
    let code: u16 = code
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidErrorPageSpec(raw.to_string()))?;

    Ok(ErrorPageSpec {
        status: StatusCode::try_from(code)?,
        path: PathBuf::from(path),
    })
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use simple_web_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8081");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Timeout por conexión; `None` si está deshabilitado
    pub fn socket_timeout(&self) -> Option<Duration> {
        match self.socket_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn session_lifetime(&self) -> Duration {
        Duration::from_millis(self.session_lifetime_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_lifetime_ms == 0 {
            return Err(ConfigError::ZeroSessionLifetime);
        }
        if self.sweep_interval_ms == 0 {
            return Err(ConfigError::ZeroSweepInterval);
        }
        Ok(())
    }

    /// Lee el contenido de cada `--error-page`
    ///
    /// Si un código aparece dos veces, gana la última.
    pub fn load_error_pages(&self) -> Result<HashMap<StatusCode, String>, ConfigError> {
        let mut pages = HashMap::new();
        for spec in &self.error_pages {
            let body = fs::read_to_string(&spec.path).map_err(|source| ConfigError::ErrorPage {
                path: spec.path.clone(),
                source,
            })?;
            pages.insert(spec.status, body);
        }
        Ok(pages)
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════════════════════╗");
        println!("║            Simple Web Server Configuration                   ║");
        println!("╚══════════════════════════════════════════════════════════════╝");
        println!();
        println!("🌐 Network:");
        println!("   Address:      {}", self.address());
        match self.socket_timeout() {
            Some(timeout) => println!("   Timeout:      {} ms", timeout.as_millis()),
            None => println!("   Timeout:      disabled"),
        }
        println!();
        println!("📦 Responses:");
        match self.compression {
            Some(algorithm) => println!("   Compression:  {}", algorithm),
            None => println!("   Compression:  disabled"),
        }
        println!("   Static dir:   {}", self.static_dir.display());
        for spec in &self.error_pages {
            println!("   Error page:   {} → {}", spec.status.as_u16(), spec.path.display());
        }
        println!();
        println!("🍪 Sessions:");
        println!("   Lifetime:     {} ms", self.session_lifetime_ms);
        println!("   Sweep every:  {} ms", self.sweep_interval_ms);
        println!();
        println!("═══════════════════════════════════════════════════════════════");
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8081,
            host: "127.0.0.1".to_string(),
            socket_timeout_ms: 30_000,
            compression: None,
            static_dir: PathBuf::from("./static"),
            error_pages: Vec::new(),
            session_lifetime_ms: 60_000,
            sweep_interval_ms: 1_000,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8081);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.compression, None);
        assert_eq!(config.session_lifetime(), Duration::from_secs(60));
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_address() {
        let config = Config::default();
        assert_eq!(config.address(), "127.0.0.1:8081");
    }

    #[test]
    fn test_address_custom() {
        let mut config = Config::default();
        config.host = "0.0.0.0".to_string();
        config.port = 3000;
        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_socket_timeout_zero_disables() {
        let mut config = Config::default();
        assert_eq!(config.socket_timeout(), Some(Duration::from_secs(30)));
        config.socket_timeout_ms = 0;
        assert_eq!(config.socket_timeout(), None);
    }

    // ==================== Validation ====================

    #[test]
    fn test_validate_success() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_lifetime() {
        let mut config = Config::default();
        config.session_lifetime_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroSessionLifetime)));
    }

    #[test]
    fn test_validate_zero_sweep_interval() {
        let mut config = Config::default();
        config.sweep_interval_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroSweepInterval)));
    }

    // ==================== CLI ====================

    #[test]
    fn test_parse_cli_flags() {
        let config = Config::try_parse_from([
            "simple_web_server",
            "-p",
            "9000",
            "--compression",
            "deflate",
            "--static-dir",
            "/srv/www",
            "--error-page",
            "404=/tmp/404.html",
            "--error-page",
            "500=/tmp/500.html",
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.compression, Some(CompressionType::Deflate));
        assert_eq!(config.static_dir, PathBuf::from("/srv/www"));
        assert_eq!(config.error_pages.len(), 2);
        assert_eq!(config.error_pages[0].status, StatusCode::NotFound);
        assert_eq!(config.error_pages[1].path, PathBuf::from("/tmp/500.html"));
    }

    #[test]
    fn test_parse_error_page_spec() {
        assert!(matches!(
            parse_error_page("404"),
            Err(ConfigError::InvalidErrorPageSpec(_))
        ));
        assert!(matches!(
            parse_error_page("abc=x.html"),
            Err(ConfigError::InvalidErrorPageSpec(_))
        ));
        assert!(matches!(parse_error_page("302=x.html"), Err(ConfigError::InvalidStatus(_))));
        assert_eq!(
            parse_error_page("501=pages/501.html").unwrap(),
            ErrorPageSpec {
                status: StatusCode::NotImplemented,
                path: PathBuf::from("pages/501.html"),
            }
        );
    }

    #[test]
    fn test_parse_rejects_unknown_compression() {
        assert!(Config::try_parse_from(["simple_web_server", "--compression", "brotli"]).is_err());
    }

    // ==================== Error pages ====================

    #[test]
    fn test_load_error_pages() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("404.html");
        fs::write(&path, "<h1>perdido</h1>").unwrap();

        let mut config = Config::default();
        config.error_pages.push(ErrorPageSpec {
            status: StatusCode::NotFound,
            path,
        });

        let pages = config.load_error_pages().unwrap();
        assert_eq!(pages.get(&StatusCode::NotFound).map(String::as_str), Some("<h1>perdido</h1>"));
    }

    #[test]
    fn test_load_error_pages_missing_file() {
        let mut config = Config::default();
        config.error_pages.push(ErrorPageSpec {
            status: StatusCode::InternalServerError,
            path: PathBuf::from("/definitely/not/here.html"),
        });

        assert!(matches!(config.load_error_pages(), Err(ConfigError::ErrorPage { .. })));
    }

    // ==================== Print Summary ====================

    #[test]
    fn test_config_print_summary() {
        let mut config = Config::default();
        config.compression = Some(CompressionType::Gzip);
        // Should not panic
        config.print_summary();
    }
}
