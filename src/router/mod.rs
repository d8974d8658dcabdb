//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Este módulo implementa el router que mapea paths HTTP a handlers específicos.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → Router → Handler → Response
//! ```
//!
//! ## Orden de resolución (gana el primero)
//!
//! 1. Handler directo con el path exacto
//! 2. Dispatcher: si existe y devuelve otro path, se busca ese path entre
//!    los handlers directos (un solo nivel, sin recursión)
//! 3. Ruta por método: path exacto y método permitido
//! 4. Archivo bajo la raíz estática
//! 5. 404

pub mod static_files;

pub use static_files::StaticFiles;

use crate::error::{HandlerError, RouteError};
use crate::http::{Method, Request, Response};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Handler de un path
///
/// Recibe el request y la respuesta a completar. Un `Err` (o un panic)
/// se contesta con 500.
pub trait Handler: Send + Sync {
    fn handle(&self, request: &Request, response: &mut Response) -> Result<(), HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&Request, &mut Response) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, request: &Request, response: &mut Response) -> Result<(), HandlerError> {
        self(request, response)
    }
}

/// Redirección en tiempo de request hacia otro path registrado
///
/// `None` significa "seguir con la resolución normal".
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, request: &Request, response: &mut Response) -> Option<String>;
}

impl<F> Dispatcher for F
where
    F: Fn(&Request, &mut Response) -> Option<String> + Send + Sync,
{
    fn dispatch(&self, request: &Request, response: &mut Response) -> Option<String> {
        self(request, response)
    }
}

/// Handler restringido a un conjunto de métodos
#[derive(Clone)]
pub struct MethodRoute {
    methods: Vec<Method>,
    handler: Arc<dyn Handler>,
}

impl MethodRoute {
    pub fn allows(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }
}

/// Resultado de resolver un request
#[derive(Clone)]
pub enum Route {
    /// Handler a invocar
    Handler(Arc<dyn Handler>),
    /// Archivo estático a servir
    Static(PathBuf),
    /// Nada coincide: 404
    NotFound,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Handler(_) => f.write_str("Handler"),
            Route::Static(path) => f.debug_tuple("Static").field(path).finish(),
            Route::NotFound => f.write_str("NotFound"),
        }
    }
}

/// Tabla de rutas del servidor
///
/// Se arma antes de arrancar y luego solo se lee.
pub struct Router {
    /// path → handler directo
    handlers: HashMap<String, Arc<dyn Handler>>,

    /// path → handler con métodos permitidos
    method_routes: HashMap<String, MethodRoute>,

    dispatcher: Option<Arc<dyn Dispatcher>>,

    static_files: Option<StaticFiles>,
}

impl Router {
    /// Crea un nuevo router vacío
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            method_routes: HashMap::new(),
            dispatcher: None,
            static_files: None,
        }
    }

    /// Registra un handler directo (cualquier método soportado)
    ///
    /// Registrar dos veces el mismo path reemplaza el handler anterior.
    ///
    /// # Ejemplo
    /// ```
    /// use simple_web_server::router::Router;
    /// use simple_web_server::http::{Request, Response};
    ///
    /// let mut router = Router::new();
    /// router
    ///     .register("/hello", |_req: &Request, res: &mut Response| {
    ///         res.write_text("Hello");
    ///         Ok(())
    ///     })
    ///     .unwrap();
    /// assert!(router.has_route("/hello"));
    /// ```
    pub fn register<F>(&mut self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&Request, &mut Response) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.register_handler(path, Arc::new(handler))
    }

    /// Registra un handler directo ya construido
    pub fn register_handler(&mut self, path: &str, handler: Arc<dyn Handler>) -> Result<(), RouteError> {
        validate_path(path)?;
        self.handlers.insert(path.to_string(), handler);
        Ok(())
    }

    /// Registra un handler que solo atiende `methods`
    ///
    /// Falla si el conjunto está vacío, incluye un método que el servidor
    /// no atiende, o el path ya tiene una ruta por método.
    pub fn register_methods<F>(&mut self, path: &str, methods: &[Method], handler: F) -> Result<(), RouteError>
    where
        F: Fn(&Request, &mut Response) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        validate_path(path)?;
        if methods.is_empty() {
            return Err(RouteError::NoMethods(path.to_string()));
        }
        if let Some(method) = methods.iter().find(|m| !m.is_supported()) {
            return Err(RouteError::UnsupportedMethod {
                path: path.to_string(),
                method: method.to_string(),
            });
        }
        if self.method_routes.contains_key(path) {
            return Err(RouteError::Duplicate(path.to_string()));
        }

        let mut allowed = methods.to_vec();
        allowed.dedup();
        self.method_routes.insert(
            path.to_string(),
            MethodRoute {
                methods: allowed,
                handler: Arc::new(handler),
            },
        );
        Ok(())
    }

    /// Configura el dispatcher (reemplaza al anterior)
    pub fn set_dispatcher<F>(&mut self, dispatcher: F)
    where
        F: Fn(&Request, &mut Response) -> Option<String> + Send + Sync + 'static,
    {
        self.dispatcher = Some(Arc::new(dispatcher));
    }

    /// Configura la raíz de archivos estáticos
    pub fn set_static_root<P: Into<PathBuf>>(&mut self, root: P) {
        self.static_files = Some(StaticFiles::new(root));
    }

    pub fn static_files(&self) -> Option<&StaticFiles> {
        self.static_files.as_ref()
    }

    /// `true` si el path tiene un handler directo o una ruta por método
    pub fn has_route(&self, path: &str) -> bool {
        self.handlers.contains_key(path) || self.method_routes.contains_key(path)
    }

    /// Resuelve el request siguiendo el orden del router
    ///
    /// El dispatcher puede escribir en `response` antes de la redirección.
    pub fn resolve(&self, request: &Request, response: &mut Response) -> Route {
        let path = request.path();

        // 1. Handler directo
        if let Some(handler) = self.handlers.get(path) {
            return Route::Handler(Arc::clone(handler));
        }

        // 2. Dispatcher (un nivel)
        if let Some(dispatcher) = &self.dispatcher {
            if let Some(target) = dispatcher.dispatch(request, response) {
                if let Some(handler) = self.handlers.get(&target) {
                    return Route::Handler(Arc::clone(handler));
                }
            }
        }

        // 3. Ruta por método
        if let Some(route) = self.method_routes.get(path) {
            if route.allows(request.method()) {
                return Route::Handler(Arc::clone(&route.handler));
            }
        }

        // 4. Archivo estático
        if let Some(file) = self.static_files.as_ref().and_then(|files| files.lookup(path)) {
            return Route::Static(file);
        }

        // 5. Nada
        Route::NotFound
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_path(path: &str) -> Result<(), RouteError> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(RouteError::InvalidPath(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn hello_handler(_req: &Request, res: &mut Response) -> Result<(), HandlerError> {
        res.write_text("hello");
        Ok(())
    }

    fn other_handler(_req: &Request, res: &mut Response) -> Result<(), HandlerError> {
        res.write_text("other");
        Ok(())
    }

    fn request(raw: &str) -> Request {
        Request::parse(raw.as_bytes()).unwrap()
    }

    /// Resuelve e invoca; devuelve el body o `None` si no hubo handler
    fn run(router: &Router, raw: &str) -> Option<String> {
        let req = request(raw);
        let mut res = Response::new();
        match router.resolve(&req, &mut res) {
            Route::Handler(handler) => {
                handler.handle(&req, &mut res).unwrap();
                Some(String::from_utf8(res.body().to_vec()).unwrap())
            }
            _ => None,
        }
    }

    #[test]
    fn test_router_creation() {
        let router = Router::new();
        assert!(router.handlers.is_empty());
        assert!(router.method_routes.is_empty());
    }

    #[test]
    fn test_register_route() {
        let mut router = Router::new();
        router.register("/test", hello_handler).unwrap();

        assert!(router.has_route("/test"));
        assert_eq!(router.register("test", hello_handler), Err(RouteError::InvalidPath("test".into())));
    }

    #[test]
    fn test_route_found() {
        let mut router = Router::new();
        router.register("/test", hello_handler).unwrap();

        assert_eq!(run(&router, "GET /test HTTP/1.0\r\n\r\n").as_deref(), Some("hello"));
        assert_eq!(run(&router, "POST /test HTTP/1.0\r\n\r\n").as_deref(), Some("hello"));
    }

    #[test]
    fn test_route_not_found() {
        let router = Router::new();
        let req = request("GET /nonexistent HTTP/1.0\r\n\r\n");
        let mut res = Response::new();

        assert!(matches!(router.resolve(&req, &mut res), Route::NotFound));
    }

    #[test]
    fn test_method_route_checks_method() {
        let mut router = Router::new();
        router.register_methods("/index", &[Method::GET], hello_handler).unwrap();

        assert_eq!(run(&router, "GET /index HTTP/1.0\r\n\r\n").as_deref(), Some("hello"));
        assert_eq!(run(&router, "POST /index HTTP/1.0\r\n\r\n"), None);
    }

    #[test]
    fn test_direct_handler_wins_over_method_route() {
        let mut router = Router::new();
        router.register_methods("/same", &[Method::GET], other_handler).unwrap();
        router.register("/same", hello_handler).unwrap();

        assert_eq!(run(&router, "GET /same HTTP/1.0\r\n\r\n").as_deref(), Some("hello"));
    }

    #[test]
    fn test_register_methods_validation() {
        let mut router = Router::new();

        assert_eq!(
            router.register_methods("/a", &[], hello_handler),
            Err(RouteError::NoMethods("/a".into()))
        );
        assert_eq!(
            router.register_methods("/a", &[Method::GET, Method::DELETE], hello_handler),
            Err(RouteError::UnsupportedMethod {
                path: "/a".into(),
                method: "DELETE".into()
            })
        );

        router.register_methods("/a", &[Method::GET], hello_handler).unwrap();
        assert_eq!(
            router.register_methods("/a", &[Method::POST], hello_handler),
            Err(RouteError::Duplicate("/a".into()))
        );
    }

    #[test]
    fn test_dispatcher_redirects_once() {
        let mut router = Router::new();
        router.register("/target", other_handler).unwrap();
        router.set_dispatcher(|req: &Request, _res: &mut Response| match req.path() {
            "/dispatch" => Some("/target".to_string()),
            "/loop" => Some("/dispatch".to_string()),
            _ => None,
        });

        assert_eq!(run(&router, "GET /dispatch HTTP/1.0\r\n\r\n").as_deref(), Some("other"));
        // "/dispatch" no es un handler directo: no hay segundo salto
        assert_eq!(run(&router, "GET /loop HTTP/1.0\r\n\r\n"), None);
    }

    #[test]
    fn test_dispatcher_target_must_be_direct_handler() {
        let mut router = Router::new();
        router.register_methods("/only-method", &[Method::GET], hello_handler).unwrap();
        router.set_dispatcher(|_req: &Request, _res: &mut Response| Some("/only-method".to_string()));

        assert_eq!(run(&router, "GET /elsewhere HTTP/1.0\r\n\r\n"), None);
    }

    #[test]
    fn test_static_fallback() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("page.html"), "<p>hi</p>").unwrap();

        let mut router = Router::new();
        router.register_methods("/page.html", &[Method::POST], hello_handler).unwrap();
        router.set_static_root(dir.path());

        let req = request("GET /page.html HTTP/1.0\r\n\r\n");
        let mut res = Response::new();
        match router.resolve(&req, &mut res) {
            Route::Static(path) => assert_eq!(path, dir.path().join("page.html")),
            other => panic!("unexpected route: {:?}", other),
        }

        let req = request("GET /missing.html HTTP/1.0\r\n\r\n");
        assert!(matches!(router.resolve(&req, &mut res), Route::NotFound));
    }
}
