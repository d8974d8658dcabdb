//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Un thread acepta conexiones y lanza un thread por conexión (sin límite
//! ni cola). Un segundo thread, el sweeper, barre las sesiones vencidas.
//!
//! `stop()` despierta al acceptor, corta todas las conexiones vivas, detiene
//! el sweeper y descarta las sesiones.

use super::connection::{handle_connection, Shared};
use crate::config::Config;
use crate::error::ServerError;
use crate::router::Router;
use crate::session::{SessionStore, Sweeper};
use dashmap::DashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn};

/// Pausa tras un error de `accept()` (p.ej. EMFILE) para no girar en vacío
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Conexiones vivas, para poder cortarlas al detener el servidor
type Connections = DashMap<u64, TcpStream>;

/// Servidor HTTP/1.0 en ejecución
pub struct Server {
    local_addr: SocketAddr,
    running: Arc<AtomicBool>,
    sessions: Arc<SessionStore>,
    connections: Arc<Connections>,
    acceptor: Option<JoinHandle<()>>,
    sweeper: Sweeper,
}

impl Server {
    /// Valida la configuración, hace bind y arranca acceptor y sweeper
    ///
    /// La raíz estática del router se toma de `config.static_dir`.
    ///
    /// # Ejemplo
    /// ```no_run
    /// use simple_web_server::config::Config;
    /// use simple_web_server::http::{Request, Response};
    /// use simple_web_server::router::Router;
    /// use simple_web_server::server::Server;
    ///
    /// let mut router = Router::new();
    /// router
    ///     .register("/hello", |_req: &Request, res: &mut Response| {
    ///         res.write_text("Hello");
    ///         Ok(())
    ///     })
    ///     .unwrap();
    ///
    /// let server = Server::start(Config::default(), router).unwrap();
    /// server.wait();
    /// ```
    pub fn start(config: Config, mut router: Router) -> Result<Self, ServerError> {
        config.validate()?;
        let error_pages = config.load_error_pages()?;
        router.set_static_root(config.static_dir.clone());

        let address = config.address();
        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;
        let local_addr = listener.local_addr()?;

        let sessions = Arc::new(SessionStore::new(config.session_lifetime()));
        let sweeper = Sweeper::spawn(Arc::clone(&sessions), config.sweep_interval())?;

        let shared = Arc::new(Shared {
            router,
            sessions: Arc::clone(&sessions),
            compression: config.compression,
            error_pages,
        });
        let running = Arc::new(AtomicBool::new(true));
        let connections = Arc::new(Connections::new());

        let acceptor = thread::Builder::new().name("acceptor".to_string()).spawn({
            let running = Arc::clone(&running);
            let connections = Arc::clone(&connections);
            let timeout = config.socket_timeout();
            move || accept_loop(listener, shared, running, connections, timeout)
        })?;

        info!(address = %local_addr, "Servidor escuchando");
        Ok(Self {
            local_addr,
            running,
            sessions,
            connections,
            acceptor: Some(acceptor),
            sweeper,
        })
    }

    /// Dirección real del listener (útil con puerto 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Almacén de sesiones de esta instancia
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Conexiones que están siendo atendidas
    pub fn active_connections(&self) -> usize {
        self.connections.len()
    }

    /// Detiene el servidor. Idempotente.
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        info!("Deteniendo servidor");

        if let Some(handle) = self.acceptor.take() {
            release_acceptor(handle, self.wake_addr());
        }

        for entry in self.connections.iter() {
            let _ = entry.value().shutdown(Shutdown::Both);
        }
        self.connections.clear();

        self.sweeper.stop();
        self.sessions.clear();
        info!("Servidor detenido");
    }

    /// Bloquea hasta que el acceptor termine
    pub fn wait(mut self) {
        if let Some(handle) = self.acceptor.take() {
            let _ = handle.join();
        }
    }

    fn wake_addr(&self) -> SocketAddr {
        let ip = match self.local_addr.ip() {
            IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
            ip => ip,
        };
        SocketAddr::new(ip, self.local_addr.port())
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Despierta al acceptor (bloqueado en `accept()`) con una conexión y lo espera
///
/// Si no se lo pudo despertar el thread queda suelto; retorna `false`.
fn release_acceptor(handle: JoinHandle<()>, wake_addr: SocketAddr) -> bool {
    match TcpStream::connect_timeout(&wake_addr, Duration::from_secs(1)) {
        Ok(_) => {
            let _ = handle.join();
            true
        }
        Err(e) => {
            warn!(error = %e, "No se pudo despertar al acceptor, se lo abandona");
            false
        }
    }
}

fn accept_loop(
    listener: TcpListener,
    shared: Arc<Shared>,
    running: Arc<AtomicBool>,
    connections: Arc<Connections>,
    timeout: Option<Duration>,
) {
    let mut next_id: u64 = 0;

    for stream in listener.incoming() {
        if !running.load(Ordering::Acquire) {
            break;
        }
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "Error al aceptar conexión");
                thread::sleep(ACCEPT_BACKOFF);
                continue;
            }
        };

        if let Err(e) = stream
            .set_read_timeout(timeout)
            .and_then(|_| stream.set_write_timeout(timeout))
        {
            warn!(error = %e, "No se pudo configurar el timeout");
            continue;
        }

        let id = next_id;
        next_id += 1;
        match stream.try_clone() {
            Ok(tracked) => {
                connections.insert(id, tracked);
            }
            Err(e) => warn!(error = %e, "No se pudo registrar la conexión"),
        }

        let spawned = thread::Builder::new().name(format!("conn-{}", id)).spawn({
            let shared = Arc::clone(&shared);
            let connections = Arc::clone(&connections);
            move || {
                let peer = stream
                    .peer_addr()
                    .map(|addr| addr.to_string())
                    .unwrap_or_else(|_| "unknown".to_string());
                let span = info_span!("connection", id, %peer);
                let _guard = span.enter();

                if let Err(e) = handle_connection(&stream, &shared) {
                    error!(error = %e, "Error en la conexión");
                }
                let _ = stream.shutdown(Shutdown::Both);
                connections.remove(&id);
            }
        });
        if let Err(e) = spawned {
            error!(error = %e, "No se pudo lanzar el thread de la conexión");
            connections.remove(&id);
        }
    }
    debug!("Acceptor detenido");
}
