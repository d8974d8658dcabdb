//! # Pipeline por Conexión
//! src/server/connection.rs
//!
//! Cada conexión atiende exactamente un request:
//!
//! ```text
//! parse → método soportado? → router → handler → cookie de sesión → encode → close
//! ```
//!
//! Los errores de parsing se contestan con 400 (o 500 si falló la lectura),
//! los métodos no soportados con 501, los fallos del handler con 500 y las
//! rutas inexistentes con 404.

use crate::http::compression::negotiate;
use crate::http::{
    html_message, CompressionType, Cookie, Method, ParseError, Request, Response, StatusCode,
    ACCEPT_ENCODING,
};
use crate::router::{Route, Router, StaticFiles};
use crate::session::{SessionStore, SESSION_COOKIE_NAME};
use std::any::Any;
use std::collections::HashMap;
use std::io::{self, BufReader};
use std::net::TcpStream;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Estado compartido por todos los workers
pub(crate) struct Shared {
    pub router: Router,
    pub sessions: Arc<SessionStore>,
    pub compression: Option<CompressionType>,
    pub error_pages: HashMap<StatusCode, String>,
}

impl Shared {
    /// Respuesta de error con la página configurada o el mensaje por defecto
    fn error_response(&self, status: StatusCode, default_message: &str) -> Response {
        match self.error_pages.get(&status) {
            Some(page) => Response::error_page(status, page),
            None => Response::error_page(status, &html_message(default_message)),
        }
    }
}

/// Atiende una conexión completa
///
/// Los errores de I/O al responder se propagan; los del protocolo se
/// contestan al cliente.
pub(crate) fn handle_connection(stream: &TcpStream, shared: &Shared) -> io::Result<()> {
    let start = Instant::now();
    let mut reader = BufReader::new(stream);

    // 1. Parse
    let mut request = match Request::read_from(&mut reader) {
        Ok(request) => request,
        Err(ParseError::EmptyRequest) => {
            debug!("Conexión cerrada sin request");
            return Ok(());
        }
        Err(e) => {
            let status = e.status();
            warn!(error = %e, status = status.as_u16(), "Request inválido");
            let message = match &e {
                ParseError::UnknownMethod(token) => {
                    let method: String = token
                        .chars()
                        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                        .collect();
                    format!("501 Method \"{}\" is not supported", method)
                }
                _ if status == StatusCode::BadRequest => "400 Malformed URL".to_string(),
                _ => "500 Server error".to_string(),
            };
            return shared.error_response(status, &message).write_to(stream, None, true);
        }
    };

    let method = request.method();
    let encoding = negotiate(shared.compression, request.header(ACCEPT_ENCODING));

    // 2. Métodos no soportados
    if !method.is_supported() {
        warn!(%method, path = %request.path(), "Método no soportado");
        let message = format!("501 Method \"{}\" is not supported", method);
        return shared
            .error_response(StatusCode::NotImplemented, &message)
            .write_to(stream, encoding, true);
    }

    request.bind(stream.peer_addr().ok(), Arc::clone(&shared.sessions));

    // 3-4. Resolver e invocar
    let response = dispatch(&request, shared);
    let status = response.status();

    // 6. Encode (HEAD: solo headers)
    response.write_to(stream, encoding, method != Method::HEAD)?;

    debug!(
        %method,
        path = %request.path(),
        status = status.as_u16(),
        latency_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Request atendido"
    );
    Ok(())
}

/// Resuelve la ruta, corre el handler y agrega la cookie de sesión
fn dispatch(request: &Request, shared: &Shared) -> Response {
    let mut response = Response::new();

    let resolved = panic::catch_unwind(AssertUnwindSafe(|| {
        shared.router.resolve(request, &mut response)
    }));
    let route = match resolved {
        Ok(route) => route,
        Err(payload) => {
            error!(panic = %panic_message(payload.as_ref()), "Panic en el dispatcher");
            return shared.error_response(StatusCode::InternalServerError, "500 Server error");
        }
    };

    match route {
        Route::Handler(handler) => {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                handler.handle(request, &mut response)
            }));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(error = %e, path = %request.path(), "Error en el handler");
                    return shared.error_response(StatusCode::InternalServerError, "500 Server error");
                }
                Err(payload) => {
                    error!(
                        panic = %panic_message(payload.as_ref()),
                        path = %request.path(),
                        "Panic en el handler"
                    );
                    return shared.error_response(StatusCode::InternalServerError, "500 Server error");
                }
            }
        }
        Route::Static(file) => {
            if let Err(e) = StaticFiles::serve(&file, &mut response) {
                error!(error = %e, file = %file.display(), "No se pudo leer el archivo");
                return shared.error_response(StatusCode::InternalServerError, "500 Server error");
            }
        }
        Route::NotFound => {
            return shared.error_response(StatusCode::NotFound, "404 Not found");
        }
    }

    // 5. Cookie de sesión
    if let Some(session) = request.touched_session() {
        response.add_cookie(Cookie::new(SESSION_COOKIE_NAME, session.id()));
    }
    response
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
