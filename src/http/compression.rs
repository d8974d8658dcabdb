//! # Compresión de respuestas
//! src/http/compression.rs
//!
//! La compresión se aplica solo si:
//! 1. el servidor está configurado con un algoritmo (gzip o deflate), y
//! 2. el header `Accept-Encoding` del request contiene el token de ese algoritmo.
//!
//! El header se tokeniza reemplazando la puntuación por espacios y se compara
//! sin distinguir mayúsculas (`gzip;q=1.0, br` → `gzip`, `q`, `1`, `0`, `br`).

use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use std::io::{self, Write};

/// Algoritmos de compresión soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CompressionType {
    /// `Content-Encoding: gzip`
    Gzip,

    /// `Content-Encoding: deflate` (formato zlib, RFC 1950)
    Deflate,
}

impl CompressionType {
    /// Token usado en `Accept-Encoding` / `Content-Encoding`
    pub fn token(&self) -> &'static str {
        match self {
            CompressionType::Gzip => "gzip",
            CompressionType::Deflate => "deflate",
        }
    }

    /// Verifica si el cliente acepta este algoritmo
    ///
    /// # Ejemplo
    /// ```
    /// use simple_web_server::http::CompressionType;
    ///
    /// assert!(CompressionType::Gzip.is_accepted_by("deflate, GZIP;q=0.5"));
    /// assert!(!CompressionType::Deflate.is_accepted_by("gzip, br"));
    /// ```
    pub fn is_accepted_by(&self, accept_encoding: &str) -> bool {
        accept_encoding
            .split(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .any(|token| token.eq_ignore_ascii_case(self.token()))
    }

    /// Comprime el body completo
    pub fn compress(&self, body: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            CompressionType::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(body)?;
                encoder.finish()
            }
            CompressionType::Deflate => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(body)?;
                encoder.finish()
            }
        }
    }
}

impl std::fmt::Display for CompressionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Decide qué algoritmo usar para una respuesta
///
/// Retorna `None` si el servidor no comprime o el cliente no lo acepta.
pub fn negotiate(
    configured: Option<CompressionType>,
    accept_encoding: Option<&str>,
) -> Option<CompressionType> {
    let algorithm = configured?;
    let accepted = accept_encoding?;
    algorithm.is_accepted_by(accepted).then_some(algorithm)
}
