//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Este módulo implementa el protocolo HTTP/1.0 desde cero, sin usar
//! librerías de alto nivel. Incluye:
//!
//! - Parsing de requests HTTP/1.0 (argumentos, headers, cookies, body)
//! - Construcción y serialización de responses
//! - Cookies de salida (`Set-Cookie`)
//! - Compresión gzip / deflate negociada con `Accept-Encoding`
//! - Manejo de status codes
//!
//! ## Especificación HTTP/1.0
//!
//! El protocolo HTTP/1.0 (RFC 1945) es más simple que HTTP/1.1:
//! - No requiere el header `Host`
//! - No tiene chunked transfer encoding
//! - Una sola petición por conexión
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.0\r\n
//! Header-Name: Header-Value\r\n
//! Another-Header: Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: text/plain\r\n
//! Content-Length: 5\r\n
//! \r\n
//! Hello
//! ```

pub mod compression; // gzip / deflate
pub mod cookie;      // Cookies de salida
pub mod request;     // Parsing de HTTP requests
pub mod response;    // Construcción de HTTP responses
pub mod status;      // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
// Esto permite usar `http::Request` en vez de `http::request::Request`
pub use compression::CompressionType;
pub use cookie::Cookie;
pub use request::{Method, ParseError, Request};
pub use response::{BodyWriter, Response, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE};
pub use status::{InvalidStatusCode, StatusCode};

/// Header con los algoritmos de compresión que acepta el cliente
pub const ACCEPT_ENCODING: &str = "Accept-Encoding";

/// Cuerpo HTML de las páginas de error por defecto
///
/// # Ejemplo
/// ```
/// use simple_web_server::http::html_message;
///
/// assert_eq!(html_message("404 Not found"), "<html><body><h1>404 Not found</h1></body></html>");
/// ```
pub fn html_message(message: &str) -> String {
    format!("<html><body><h1>{}</h1></body></html>", message)
}
