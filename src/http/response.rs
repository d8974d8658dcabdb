//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! `Response` acumula status, headers, cookies y body mientras corre el
//! handler. Al final el pipeline la serializa directo al socket.
//!
//! ## Formato de una respuesta
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: text/plain\r\n
//! Content-Length: 5\r\n
//! Set-Cookie: JSESSIONID=abc\r\n
//! \r\n
//! Hello
//! ```
//!
//! ## Ejemplo de uso
//!
//! ```
//! use simple_web_server::http::{Cookie, Response, StatusCode};
//! use std::fmt::Write;
//!
//! let mut response = Response::new();
//! response.set_status(StatusCode::Ok);
//! response.set_content_type("text/plain");
//! response.add_cookie(Cookie::new("tasty", "strawberry"));
//! write!(response.writer(), "Hello {}", "World").unwrap();
//!
//! let bytes = response.to_bytes(None, true).unwrap();
//! assert!(bytes.ends_with(b"Hello World"));
//! ```

use super::{CompressionType, Cookie, InvalidStatusCode, StatusCode};
use indexmap::IndexMap;
use std::fmt;
use std::io::{self, BufWriter, Write};

/// Prefijo literal de la status line
const STATUS_LINE_PREFIX: &[u8] = b"HTTP/1.0 ";

const CRLF: &[u8] = b"\r\n";

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_ENCODING: &str = "Content-Encoding";

/// Respuesta HTTP en construcción
#[derive(Debug, Clone, Default)]
pub struct Response {
    /// `None` hasta que el handler fije uno; se envía 200 por defecto
    status: Option<StatusCode>,

    /// Headers (el último valor escrito gana)
    headers: IndexMap<String, String>,

    /// Cookies de salida por nombre
    cookies: IndexMap<String, Cookie>,

    /// Body acumulado
    body: Vec<u8>,
}

/// Vista de texto sobre el body de una respuesta
///
/// Escribe en el mismo buffer que `Response` como `io::Write`.
pub struct BodyWriter<'a> {
    body: &'a mut Vec<u8>,
}

impl fmt::Write for BodyWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.body.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

impl Response {
    /// Crea una respuesta vacía (sin status explícito)
    pub fn new() -> Self {
        Self::default()
    }

    /// Respuesta de error con body HTML
    pub fn error_page(status: StatusCode, body: &str) -> Self {
        let mut response = Self::new();
        response.set_status(status);
        response.set_content_type("text/html");
        response.set_body(body);
        response
    }

    /// Status efectivo (200 si el handler no fijó ninguno)
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::Ok)
    }

    /// `true` si el handler fijó un status
    pub fn has_explicit_status(&self) -> bool {
        self.status.is_some()
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Fija el status desde un número; falla fuera del conjunto soportado
    pub fn set_status_code(&mut self, code: u16) -> Result<(), InvalidStatusCode> {
        self.status = Some(StatusCode::try_from(code)?);
        Ok(())
    }

    /// Agrega o sobrescribe un header
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Agrega varios headers
    pub fn set_headers<I, K, V>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.headers.insert(name.into(), value.into());
        }
    }

    pub fn set_content_type(&mut self, content_type: &str) {
        self.set_header(CONTENT_TYPE, content_type);
    }

    /// Obtiene un header (el nombre no distingue mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    /// Agrega una cookie (reemplaza otra con el mismo nombre)
    pub fn add_cookie(&mut self, cookie: Cookie) {
        self.cookies.insert(cookie.name().to_string(), cookie);
    }

    pub fn cookies(&self) -> &IndexMap<String, Cookie> {
        &self.cookies
    }

    /// Reemplaza el body completo
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    /// Agrega texto al body
    pub fn write_text(&mut self, text: &str) {
        self.body.extend_from_slice(text.as_bytes());
    }

    /// Vista `fmt::Write` del body, para usar con `write!`
    pub fn writer(&mut self) -> BodyWriter<'_> {
        BodyWriter {
            body: &mut self.body,
        }
    }

    /// Obtiene el body acumulado
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Serializa la respuesta y la escribe en `out`
    ///
    /// 1. Si hay `encoding` y el body no está vacío, lo comprime y fija
    ///    `Content-Encoding`.
    /// 2. Fija `Content-Length` con el tamaño final del body.
    /// 3. Escribe status line, headers, cookies, línea vacía y body
    ///    (el body se omite con `include_body == false`, ej: HEAD).
    pub fn write_to<W: Write>(
        mut self,
        out: W,
        encoding: Option<CompressionType>,
        include_body: bool,
    ) -> io::Result<()> {
        if let Some(algorithm) = encoding {
            if !self.body.is_empty() {
                self.body = algorithm.compress(&self.body)?;
                self.replace_header(CONTENT_ENCODING, algorithm.token().to_string());
            }
        }
        self.replace_header(CONTENT_LENGTH, self.body.len().to_string());

        let mut writer = BufWriter::new(out);

        // 1. Status line: HTTP/1.0 200 OK\r\n
        writer.write_all(STATUS_LINE_PREFIX)?;
        write!(writer, "{}", self.status())?;
        writer.write_all(CRLF)?;

        // 2. Headers
        for (name, value) in &self.headers {
            write!(writer, "{}: {}", name, value)?;
            writer.write_all(CRLF)?;
        }

        // 3. Cookies
        for cookie in self.cookies.values() {
            write!(writer, "Set-Cookie: {}", cookie.header_value())?;
            writer.write_all(CRLF)?;
        }

        // 4. Línea vacía y body
        writer.write_all(CRLF)?;
        if include_body {
            writer.write_all(&self.body)?;
        }
        writer.flush()
    }

    /// Igual que `write_to`, pero a un buffer en memoria
    pub fn to_bytes(self, encoding: Option<CompressionType>, include_body: bool) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes, encoding, include_body)?;
        Ok(bytes)
    }

    /// Sobrescribe un header sin importar mayúsculas en el nombre previo
    fn replace_header(&mut self, name: &str, value: String) {
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value);
    }
}

/// Vista `io::Write` del body (bytes crudos)
impl Write for Response {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
