//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Parser hecho a mano que lee el request línea por línea desde el socket.
//!
//! ## Formato de un Request
//!
//! ```text
//! POST /form?debug HTTP/1.0\r\n
//! Content-Type: application/x-www-form-urlencoded\r\n
//! Content-Length: 3\r\n
//! Cookie: JSESSIONID=abc; theme=dark\r\n
//! \r\n
//! x=5
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD /path?query [VERSION]` (la versión se ignora)
//! 2. **Headers**: Pares `Name: Value` hasta la línea vacía
//! 3. **Body**: solo POST/PUT con `Content-Length` y un `Content-Type` de
//!    formulario o texto plano
//!
//! Las líneas terminan en `\n`; un `\r` final se descarta. No se hace
//! percent-decoding de path ni argumentos.

use crate::error::SessionError;
use crate::http::StatusCode;
use crate::session::{Session, SessionStore, SESSION_COOKIE_NAME};
use indexmap::IndexMap;
use std::io::{self, BufRead, Read};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// `Content-Type` de formularios
pub const URL_ENCODED: &str = "application/x-www-form-urlencoded";

/// `Content-Type` de texto plano
pub const TEXT_PLAIN: &str = "text/plain";

/// Largo máximo de una línea (request line o header)
const MAX_LINE_BYTES: usize = 8192;

/// Tamaño máximo de body aceptado
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Métodos HTTP reconocidos por el parser
///
/// Solo GET, POST, PUT y HEAD se atienden; el resto se contesta con 501.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    OPTIONS,
    TRACE,
    CONNECT,
    PATCH,
}

impl Method {
    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
            Method::CONNECT => "CONNECT",
            Method::PATCH => "PATCH",
        }
    }

    /// `true` para los métodos que el servidor atiende
    pub fn is_supported(&self) -> bool {
        matches!(self, Method::GET | Method::POST | Method::PUT | Method::HEAD)
    }

    /// Métodos que llevan body
    fn has_body(&self) -> bool {
        matches!(self, Method::POST | Method::PUT)
    }
}

impl FromStr for Method {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "DELETE" => Ok(Method::DELETE),
            "OPTIONS" => Ok(Method::OPTIONS),
            "TRACE" => Ok(Method::TRACE),
            "CONNECT" => Ok(Method::CONNECT),
            "PATCH" => Ok(Method::PATCH),
            _ => Err(ParseError::UnknownMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Error)]
pub enum ParseError {
    /// El cliente cerró la conexión sin enviar nada
    #[error("empty request")]
    EmptyRequest,

    /// Request line incompleta o demasiado larga
    #[error("malformed request line: {0}")]
    Malformed(String),

    /// Token de método desconocido
    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),

    /// Path/query con caracteres inválidos
    #[error("malformed URI: {0}")]
    InvalidUri(String),

    /// Header sin ':'
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Línea de header más larga que `MAX_LINE_BYTES`
    #[error("header line too long")]
    HeaderTooLong,

    /// `Content-Length` no numérico o demasiado grande
    #[error("invalid Content-Length: {0}")]
    InvalidContentLength(String),

    /// Falla de lectura en el socket
    #[error("I/O error while reading request: {0}")]
    Io(#[from] io::Error),
}

impl ParseError {
    /// Código con el que se contesta cada error
    ///
    /// Solo la request line y la URI dan 400. Un método desconocido da 501
    /// y cualquier falla en headers, body o socket da 500.
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::EmptyRequest | ParseError::Malformed(_) | ParseError::InvalidUri(_) => {
                StatusCode::BadRequest
            }
            ParseError::UnknownMethod(_) => StatusCode::NotImplemented,
            ParseError::InvalidHeader(_)
            | ParseError::HeaderTooLong
            | ParseError::InvalidContentLength(_)
            | ParseError::Io(_) => StatusCode::InternalServerError,
        }
    }
}

/// Representa un request HTTP parseado
///
/// Es inmutable una vez parseado; solo la sesión asociada cambia a través
/// de `session()` / `session_with()`.
#[derive(Debug)]
pub struct Request {
    /// Método HTTP
    method: Method,

    /// Path sin query (ej: "/echo")
    path: String,

    /// Argumentos de query string y de formularios; `None` si no hay '='
    arguments: IndexMap<String, Option<String>>,

    /// Headers tal como llegaron
    headers: IndexMap<String, String>,

    /// Cookies del header `Cookie`
    cookies: IndexMap<String, String>,

    /// Body para POST/PUT con tipo reconocido
    body: Option<String>,

    /// Dirección del cliente
    peer_addr: Option<SocketAddr>,

    /// Almacén de sesiones del servidor
    sessions: Option<Arc<SessionStore>>,

    /// Sesión tocada durante este request
    session: Mutex<Option<Arc<Session>>>,
}

impl Request {
    /// Parsea un request completo desde bytes
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use simple_web_server::http::Request;
    ///
    /// let raw = b"GET /echo?a=1&a=2&flag HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/echo");
    /// assert_eq!(request.argument("a"), Some("2"));
    /// assert!(request.has_argument("flag"));
    /// assert_eq!(request.argument("flag"), None);
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        let mut reader = buffer;
        Self::read_from(&mut reader)
    }

    /// Lee y parsea un request desde un stream
    pub fn read_from<R: BufRead>(reader: &mut R) -> Result<Self, ParseError> {
        // 1. Request line
        let line = match read_line(reader)? {
            Some(line) => line,
            None => return Err(ParseError::EmptyRequest),
        };
        let (method, target) = parse_request_line(&line)?;
        let (path, query) = split_target(target)?;

        let mut request = Request {
            method,
            path,
            arguments: IndexMap::new(),
            headers: IndexMap::new(),
            cookies: IndexMap::new(),
            body: None,
            peer_addr: None,
            sessions: None,
            session: Mutex::new(None),
        };
        if let Some(query) = query {
            parse_arguments(query, &mut request.arguments);
        }

        // 2. Headers (hasta la línea vacía o EOF)
        while let Some(line) = read_line(reader).map_err(|e| match e {
            ParseError::Malformed(_) => ParseError::HeaderTooLong,
            e => e,
        })? {
            if line.is_empty() {
                break;
            }
            request.parse_header(&line)?;
        }

        // 3. Body
        if let Some(length) = request.body_length()? {
            let mut bytes = Vec::with_capacity(length);
            reader.take(length as u64).read_to_end(&mut bytes)?;
            let body = String::from_utf8_lossy(&bytes).into_owned();

            if request.content_type_is(URL_ENCODED) {
                parse_arguments(&body, &mut request.arguments);
            }
            request.body = Some(body);
        }

        Ok(request)
    }

    /// Parsea un header `Name: Value` y registra las cookies
    fn parse_header(&mut self, line: &str) -> Result<(), ParseError> {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;
        let name = name.trim();
        let value = value.trim();

        if name.eq_ignore_ascii_case("Cookie") {
            for pair in value.split("; ") {
                if let Some((key, val)) = pair.split_once('=') {
                    self.cookies.insert(key.trim().to_string(), val.to_string());
                }
            }
        }

        self.headers.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Largo del body a leer, si corresponde leer uno
    fn body_length(&self) -> Result<Option<usize>, ParseError> {
        if !self.method.has_body() {
            return Ok(None);
        }
        if !(self.content_type_is(URL_ENCODED) || self.content_type_is(TEXT_PLAIN)) {
            return Ok(None);
        }
        let raw = match self.header("Content-Length") {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let length: usize = raw
            .trim()
            .parse()
            .map_err(|_| ParseError::InvalidContentLength(raw.to_string()))?;
        if length > MAX_BODY_BYTES {
            return Err(ParseError::InvalidContentLength(raw.to_string()));
        }
        Ok(Some(length))
    }

    fn content_type_is(&self, mime: &str) -> bool {
        self.header("Content-Type")
            .map(|value| value.contains(mime))
            .unwrap_or(false)
    }

    /// Asocia el request a la conexión y al almacén de sesiones del servidor
    pub(crate) fn bind(&mut self, peer_addr: Option<SocketAddr>, sessions: Arc<SessionStore>) {
        self.peer_addr = peer_addr;
        self.sessions = Some(sessions);
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> Method {
        self.method
    }

    /// Obtiene el path del request (sin query)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene todos los argumentos (query + formulario)
    pub fn arguments(&self) -> &IndexMap<String, Option<String>> {
        &self.arguments
    }

    /// Obtiene el valor de un argumento
    ///
    /// Retorna `None` si no existe o si vino sin valor (`?flag`).
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).and_then(|value| value.as_deref())
    }

    /// `true` si el argumento existe, tenga o no valor
    pub fn has_argument(&self, name: &str) -> bool {
        self.arguments.contains_key(name)
    }

    /// Obtiene todos los headers
    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    /// Obtiene un header (el nombre no distingue mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Obtiene todas las cookies del request
    pub fn cookies(&self) -> &IndexMap<String, String> {
        &self.cookies
    }

    /// Obtiene una cookie
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|s| s.as_str())
    }

    /// Obtiene el body (solo POST/PUT con formulario o texto plano)
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    // === Sesiones ===

    /// Sesión del cliente; la crea si no trae una válida
    ///
    /// Llamadas repetidas durante el mismo request devuelven la misma sesión.
    pub fn session(&self) -> Result<Arc<Session>, SessionError> {
        self.session_with(false)
    }

    /// Como `session()`, pero con `open == true` siempre abre una sesión nueva
    pub fn session_with(&self, open: bool) -> Result<Arc<Session>, SessionError> {
        let store = self.sessions.as_ref().ok_or(SessionError::Unavailable)?;
        let mut current = self.session.lock().unwrap_or_else(PoisonError::into_inner);

        if !open {
            if let Some(session) = current.as_ref().filter(|s| !s.is_expired()) {
                return Ok(Arc::clone(session));
            }
        }

        let session = store.resolve(self.cookie(SESSION_COOKIE_NAME), open);
        *current = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Invalida la sesión del request (la tocada o la de la cookie)
    pub fn invalidate_session(&self) -> bool {
        let store = match self.sessions.as_ref() {
            Some(store) => store,
            None => return false,
        };
        let mut current = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let id = current
            .take()
            .map(|session| session.id().to_string())
            .or_else(|| self.cookie(SESSION_COOKIE_NAME).map(str::to_string));

        match id {
            Some(id) => store.invalidate(&id),
            None => false,
        }
    }

    /// Sesión viva que el handler tocó, si alguna
    pub(crate) fn touched_session(&self) -> Option<Arc<Session>> {
        let current = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        current.as_ref().filter(|s| !s.is_expired()).cloned()
    }
}

/// Lee una línea terminada en `\n`, descartando `\r` final
///
/// Retorna `None` en EOF sin datos.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>, ParseError> {
    let mut buf = Vec::new();
    let read = reader
        .by_ref()
        .take(MAX_LINE_BYTES as u64 + 1)
        .read_until(b'\n', &mut buf)?;
    if read == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
    } else if buf.len() > MAX_LINE_BYTES {
        return Err(ParseError::Malformed("line too long".to_string()));
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }

    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Parsea la request line: `METHOD target [VERSION]`
fn parse_request_line(line: &str) -> Result<(Method, &str), ParseError> {
    let mut parts = line.split(' ').filter(|part| !part.is_empty());

    let method = parts
        .next()
        .ok_or_else(|| ParseError::Malformed(line.to_string()))?;
    let target = parts
        .next()
        .ok_or_else(|| ParseError::Malformed(line.to_string()))?;

    Ok((method.parse()?, target))
}

/// Valida el target y lo separa en path y query
///
/// Acepta la forma de origen (`/a?b`) y la absoluta (`http://host/a?b`).
/// El fragmento (`#...`) se descarta.
fn split_target(target: &str) -> Result<(String, Option<&str>), ParseError> {
    validate_uri(target)?;

    let target = target.split_once('#').map_or(target, |(before, _)| before);
    let target = strip_authority(target);

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };

    let path = if path.is_empty() { "/" } else { path };
    if !path.starts_with('/') {
        return Err(ParseError::InvalidUri(target.to_string()));
    }

    Ok((path.to_string(), query))
}

/// Quita `scheme://authority` de un target absoluto
fn strip_authority(target: &str) -> &str {
    let lower = target.get(..8).unwrap_or(target).to_ascii_lowercase();
    let scheme_len = if lower.starts_with("http://") {
        7
    } else if lower.starts_with("https://") {
        8
    } else {
        return target;
    };

    let rest = &target[scheme_len..];
    match rest.find(|c: char| c == '/' || c == '?') {
        Some(pos) => &rest[pos..],
        None => "",
    }
}

/// Verifica que el target solo tenga caracteres válidos de URI
/// y secuencias `%XX` bien formadas
fn validate_uri(target: &str) -> Result<(), ParseError> {
    let bytes = target.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(ParseError::InvalidUri(target.to_string()));
            }
            i += 3;
            continue;
        }
        let allowed = b >= 0x80
            || b.is_ascii_alphanumeric()
            || b"-._~:/?#[]@!$&'()*+,;=".contains(&b);
        if !allowed {
            return Err(ParseError::InvalidUri(target.to_string()));
        }
        i += 1;
    }
    Ok(())
}

/// Parsea argumentos `k1=v1&k2&k3=v3`
///
/// Cada segmento se corta en el primer '='. Un segmento sin '=' queda sin
/// valor. Las claves repetidas se sobrescriben.
pub fn parse_arguments(query: &str, arguments: &mut IndexMap<String, Option<String>>) {
    for segment in query.split('&').filter(|s| !s.is_empty()) {
        match segment.split_once('=') {
            Some((key, value)) => {
                arguments.insert(key.to_string(), Some(value.to_string()));
            }
            None => {
                arguments.insert(segment.to_string(), None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_simple_get() {
        let raw = b"GET / HTTP/1.0\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.path(), "/");
        assert!(request.arguments().is_empty());
        assert!(request.body().is_none());
    }

    #[test]
    fn test_version_is_optional() {
        let request = Request::parse(b"GET /index\r\n\r\n").unwrap();
        assert_eq!(request.path(), "/index");

        let request = Request::parse(b"GET /index HTTP/2.0 extra\r\n\r\n").unwrap();
        assert_eq!(request.path(), "/index");
    }

    #[test]
    fn test_parse_with_query_params() {
        let raw = b"GET /test?num=42&text=hello&empty= HTTP/1.0\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.path(), "/test");
        assert_eq!(request.argument("num"), Some("42"));
        assert_eq!(request.argument("text"), Some("hello"));
        assert_eq!(request.argument("empty"), Some(""));
    }

    #[test]
    fn test_duplicate_arguments_last_wins() {
        let raw = b"GET /echo?a=1&b=x&a=2 HTTP/1.0\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.argument("a"), Some("2"));
        let keys: Vec<&str> = request.arguments().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_argument_without_value() {
        let request = Request::parse(b"GET /x?debug&n=1 HTTP/1.0\r\n\r\n").unwrap();
        assert!(request.has_argument("debug"));
        assert_eq!(request.arguments().get("debug"), Some(&None));
        assert_eq!(request.argument("n"), Some("1"));
    }

    #[test]
    fn test_value_keeps_extra_equals() {
        let request = Request::parse(b"GET /x?expr=a=b HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(request.argument("expr"), Some("a=b"));
    }

    #[test]
    fn test_no_percent_decoding() {
        let request = Request::parse(b"GET /a%20b?text=hello%20world HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(request.path(), "/a%20b");
        assert_eq!(request.argument("text"), Some("hello%20world"));
    }

    #[test]
    fn test_parse_with_headers() {
        let raw = b"GET / HTTP/1.0\r\nHost: localhost:8081\r\nUser-Agent:  test \r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.header("Host"), Some("localhost:8081"));
        assert_eq!(request.header("user-agent"), Some("test"));
        let names: Vec<&str> = request.headers().keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["Host", "User-Agent"]);
    }

    #[test]
    fn test_bare_lf_lines() {
        let raw = b"GET /lf?x=1 HTTP/1.0\nHost: a\n\n";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.path(), "/lf");
        assert_eq!(request.header("Host"), Some("a"));
    }

    #[test]
    fn test_cookies() {
        let raw = b"GET / HTTP/1.0\r\nCookie: JSESSIONID=abc; theme=dark; broken\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.cookie("JSESSIONID"), Some("abc"));
        assert_eq!(request.cookie("theme"), Some("dark"));
        assert_eq!(request.cookies().len(), 2);
    }

    #[test]
    fn test_post_form_body_merges_arguments() {
        let raw = b"POST /form?x=1&y=2 HTTP/1.0\r\n\
            Content-Type: application/x-www-form-urlencoded\r\n\
            Content-Length: 3\r\n\r\nx=5";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.body(), Some("x=5"));
        assert_eq!(request.argument("x"), Some("5"));
        assert_eq!(request.argument("y"), Some("2"));
    }

    #[test]
    fn test_put_text_body() {
        let raw = b"PUT /doc HTTP/1.0\r\n\
            Content-Type: text/plain; charset=UTF-8\r\n\
            Content-Length: 9\r\n\r\nSome body and more";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.body(), Some("Some body"));
        assert!(request.arguments().is_empty());
    }

    #[test]
    fn test_body_ignored_for_other_content_types() {
        let raw = b"POST /upload HTTP/1.0\r\n\
            Content-Type: application/json\r\n\
            Content-Length: 2\r\n\r\n{}";
        let request = Request::parse(raw).unwrap();
        assert!(request.body().is_none());
    }

    #[test]
    fn test_body_ignored_for_get() {
        let raw = b"GET /x HTTP/1.0\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n\r\nhi";
        let request = Request::parse(raw).unwrap();
        assert!(request.body().is_none());
    }

    #[test]
    fn test_short_body_at_eof() {
        let raw = b"POST /x HTTP/1.0\r\nContent-Type: text/plain\r\nContent-Length: 10\r\n\r\nabc";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.body(), Some("abc"));
    }

    #[test]
    fn test_invalid_content_length() {
        let raw = b"POST /x HTTP/1.0\r\nContent-Type: text/plain\r\nContent-Length: ten\r\n\r\n";
        let result = Request::parse(raw);
        assert!(matches!(result, Err(ParseError::InvalidContentLength(_))));
        assert_eq!(result.unwrap_err().status(), StatusCode::InternalServerError);
    }

    #[test]
    fn test_body_over_limit_is_500() {
        let raw = format!(
            "POST /x HTTP/1.0\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n",
            MAX_BODY_BYTES + 1
        );
        let err = Request::parse(raw.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidContentLength(_)));
        assert_eq!(err.status(), StatusCode::InternalServerError);
    }

    #[test]
    fn test_unsupported_but_known_method() {
        let request = Request::parse(b"DELETE /echo HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(request.method(), Method::DELETE);
        assert!(!request.method().is_supported());
    }

    #[test]
    fn test_unknown_method() {
        let result = Request::parse(b"FETCH / HTTP/1.0\r\n\r\n");
        assert!(matches!(result, Err(ParseError::UnknownMethod(ref m)) if m == "FETCH"));
        assert_eq!(result.unwrap_err().status(), StatusCode::NotImplemented);
    }

    #[test]
    fn test_malformed_uri() {
        for raw in [
            &b"GET /bad|x HTTP/1.0\r\n\r\n"[..],
            b"GET /a%zz HTTP/1.0\r\n\r\n",
            b"GET /a%2 HTTP/1.0\r\n\r\n",
            b"GET /a{b} HTTP/1.0\r\n\r\n",
            b"GET relative HTTP/1.0\r\n\r\n",
        ] {
            let result = Request::parse(raw);
            assert!(matches!(result, Err(ParseError::InvalidUri(_))), "{:?}", result);
            assert_eq!(result.unwrap_err().status(), StatusCode::BadRequest);
        }
    }

    #[test]
    fn test_absolute_form_target() {
        let request = Request::parse(b"GET http://localhost:8081/echo?a=1#frag HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(request.path(), "/echo");
        assert_eq!(request.argument("a"), Some("1"));

        let request = Request::parse(b"GET http://localhost HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(request.path(), "/");
    }

    #[test]
    fn test_empty_request() {
        let result = Request::parse(b"");
        assert!(matches!(result, Err(ParseError::EmptyRequest)));
    }

    #[test]
    fn test_invalid_request_line() {
        let result = Request::parse(b"GET\r\n\r\n");
        assert!(matches!(result, Err(ParseError::Malformed(_))));
        assert_eq!(result.unwrap_err().status(), StatusCode::BadRequest);
    }

    #[test]
    fn test_invalid_header() {
        let result = Request::parse(b"GET / HTTP/1.0\r\nNoColonHere\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidHeader(_))));
        assert_eq!(result.unwrap_err().status(), StatusCode::InternalServerError);
    }

    #[test]
    fn test_line_too_long() {
        let mut raw = b"GET /".to_vec();
        raw.extend(std::iter::repeat(b'a').take(MAX_LINE_BYTES + 10));
        raw.extend_from_slice(b" HTTP/1.0\r\n\r\n");
        assert!(matches!(Request::parse(&raw), Err(ParseError::Malformed(_))));
    }

    #[test]
    fn test_header_too_long_is_500() {
        let mut raw = b"GET / HTTP/1.0\r\nX-Big: ".to_vec();
        raw.extend(std::iter::repeat(b'a').take(MAX_LINE_BYTES + 10));
        raw.extend_from_slice(b"\r\n\r\n");
        let err = Request::parse(&raw).unwrap_err();
        assert!(matches!(err, ParseError::HeaderTooLong));
        assert_eq!(err.status(), StatusCode::InternalServerError);
    }

    #[test]
    fn test_io_error_maps_to_500() {
        let err = ParseError::Io(io::Error::new(io::ErrorKind::TimedOut, "timeout"));
        assert_eq!(err.status(), StatusCode::InternalServerError);
    }

    #[test]
    fn test_session_requires_store() {
        let request = Request::parse(b"GET / HTTP/1.0\r\n\r\n").unwrap();
        assert!(matches!(request.session(), Err(SessionError::Unavailable)));
        assert!(!request.invalidate_session());
    }

    #[test]
    fn test_session_is_stable_within_request() {
        let store = Arc::new(SessionStore::new(Duration::from_secs(60)));
        let mut request = Request::parse(b"GET / HTTP/1.0\r\n\r\n").unwrap();
        request.bind(None, Arc::clone(&store));

        assert!(request.touched_session().is_none());
        let first = request.session().unwrap();
        let second = request.session().unwrap();
        assert_eq!(first.id(), second.id());
        assert_eq!(store.len(), 1);
        assert_eq!(request.touched_session().unwrap().id(), first.id());

        let opened = request.session_with(true).unwrap();
        assert_ne!(opened.id(), first.id());
        assert_eq!(request.session().unwrap().id(), opened.id());
    }

    #[test]
    fn test_session_from_cookie() {
        let store = Arc::new(SessionStore::new(Duration::from_secs(60)));
        let existing = store.create();
        let raw = format!("GET / HTTP/1.0\r\nCookie: JSESSIONID={}\r\n\r\n", existing.id());
        let mut request = Request::parse(raw.as_bytes()).unwrap();
        request.bind(None, Arc::clone(&store));

        assert_eq!(request.session().unwrap().id(), existing.id());
    }

    #[test]
    fn test_invalidate_session_from_cookie() {
        let store = Arc::new(SessionStore::new(Duration::from_secs(60)));
        let existing = store.create();
        let raw = format!("GET / HTTP/1.0\r\nCookie: JSESSIONID={}\r\n\r\n", existing.id());
        let mut request = Request::parse(raw.as_bytes()).unwrap();
        request.bind(None, Arc::clone(&store));

        assert!(request.invalidate_session());
        assert!(existing.is_expired());
        assert!(store.is_empty());
        assert!(request.touched_session().is_none());
    }
}
