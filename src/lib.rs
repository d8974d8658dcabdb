//! # Simple Web Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 implementado desde cero: parser hecho a mano, router,
//! respuestas comprimidas con gzip/deflate y sesiones con expiración.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: Parsing y serialización del protocolo HTTP/1.0
//! - `router`: Enrutamiento de peticiones a handlers y archivos estáticos
//! - `session`: Almacén de sesiones y sweeper de sesiones vencidas
//! - `server`: Acceptor TCP y pipeline por conexión
//! - `config`: Configuración por CLI / variables de entorno
//! - `error`: Errores de arranque, rutas y sesiones
//! - `logging`: Inicialización de `tracing`
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use simple_web_server::config::Config;
//! use simple_web_server::http::{Request, Response};
//! use simple_web_server::router::Router;
//! use simple_web_server::server::Server;
//!
//! let mut router = Router::new();
//! router
//!     .register("/echo", |req: &Request, res: &mut Response| {
//!         res.write_text(req.argument("a").unwrap_or(""));
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let server = Server::start(Config::default(), router).expect("Error al iniciar servidor");
//! server.wait();
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod router;
pub mod server;
pub mod session;
