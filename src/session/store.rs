//! # Almacén de Sesiones
//! src/session/store.rs
//!
//! Mapa concurrente `id → Session` compartido por todos los workers y por
//! el sweeper. Se usa `DashMap` para no necesitar un lock global.

use crate::error::SessionError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Nombre de la cookie que transporta el id de sesión
pub const SESSION_COOKIE_NAME: &str = "JSESSIONID";

/// Alfabeto de los ids de sesión
const ID_SYMBOLS: &[u8] = b"123456789abcdefghijklmnopqrstuvwxyz";

/// Largo de los ids de sesión
pub const ID_LENGTH: usize = 32;

/// Estado del servidor asociado a un cliente
///
/// El vencimiento es absoluto: se fija al crear la sesión y no se renueva.
#[derive(Debug)]
pub struct Session {
    id: String,
    created_at: Instant,
    expires_at: Instant,
    /// Las escrituras toman el lock de lectura y el vencimiento el de escritura,
    /// así ninguna escritura queda en una sesión ya vencida
    expired: RwLock<bool>,
    data: DashMap<String, Value>,
}

impl Session {
    fn new(id: String, lifetime: Duration) -> Self {
        let now = Instant::now();
        Self {
            id,
            created_at: now,
            expires_at: now + lifetime,
            expired: RwLock::new(false),
            data: DashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// `true` si la sesión fue invalidada o barrida
    pub fn is_expired(&self) -> bool {
        *self.expired.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// `true` si `now` ya pasó el vencimiento
    pub fn is_past_deadline(&self, now: Instant) -> bool {
        now > self.expires_at
    }

    fn mark_expired(&self) {
        *self.expired.write().unwrap_or_else(PoisonError::into_inner) = true;
    }

    /// Guarda un valor en la sesión
    ///
    /// Falla con `SessionError::Expired` si la sesión ya expiró.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)?;
        let expired = self.expired.read().unwrap_or_else(PoisonError::into_inner);
        if *expired {
            return Err(SessionError::Expired);
        }
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    /// Lee un valor. Retorna `None` si no existe o no tiene el tipo pedido.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.data.get(key).map(|entry| entry.value().clone())?;
        serde_json::from_value(value).ok()
    }

    /// Elimina un valor de la sesión
    pub fn remove(&self, key: &str) -> Result<Option<Value>, SessionError> {
        let expired = self.expired.read().unwrap_or_else(PoisonError::into_inner);
        if *expired {
            return Err(SessionError::Expired);
        }
        Ok(self.data.remove(key).map(|(_, value)| value))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }
}

/// Genera un id aleatorio de `ID_LENGTH` caracteres
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| ID_SYMBOLS[rng.gen_range(0..ID_SYMBOLS.len())] as char)
        .collect()
}

/// Almacén de sesiones de una instancia del servidor
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Arc<Session>>,
    lifetime: Duration,
}

impl SessionStore {
    /// Crea un almacén vacío. Cada sesión vive `lifetime` desde su creación.
    pub fn new(lifetime: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Crea e inserta una sesión nueva con id único
    pub fn create(&self) -> Arc<Session> {
        loop {
            let id = generate_id();
            if let Entry::Vacant(slot) = self.sessions.entry(id.clone()) {
                let session = Arc::new(Session::new(id, self.lifetime));
                slot.insert(Arc::clone(&session));
                info!(session_id = %session.id(), "Nueva sesión abierta");
                return session;
            }
        }
    }

    /// Busca una sesión viva por id
    ///
    /// Una sesión vencida que el sweeper aún no barrió se elimina aquí.
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        let session = self.sessions.get(id).map(|entry| Arc::clone(entry.value()))?;
        if session.is_expired() || session.is_past_deadline(Instant::now()) {
            self.evict(id, &session);
            return None;
        }
        Some(session)
    }

    /// Resuelve la sesión de un request
    ///
    /// Con `open == true` siempre crea una nueva. Si no, usa la del id de la
    /// cookie y, si ya no existe, crea una nueva (un solo intento).
    pub fn resolve(&self, cookie_id: Option<&str>, open: bool) -> Arc<Session> {
        if !open {
            if let Some(session) = cookie_id.and_then(|id| self.get(id)) {
                return session;
            }
        }
        self.create()
    }

    /// Marca la sesión como expirada y la quita del almacén
    pub fn invalidate(&self, id: &str) -> bool {
        match self.sessions.remove(id) {
            Some((_, session)) => {
                session.mark_expired();
                info!(session_id = %id, "Sesión invalidada");
                true
            }
            None => false,
        }
    }

    /// Barre todas las sesiones vencidas a `now`
    pub fn sweep(&self, now: Instant) -> usize {
        self.sweep_while(now, || true)
    }

    /// Barre las sesiones vencidas mientras `keep_going()` sea verdadero
    ///
    /// Itera sobre una copia de las entradas, así los workers pueden insertar
    /// o borrar sesiones durante el barrido.
    pub fn sweep_while(&self, now: Instant, keep_going: impl Fn() -> bool) -> usize {
        let snapshot: Vec<(String, Arc<Session>)> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_past_deadline(now))
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut removed = 0;
        for (id, session) in snapshot {
            if !keep_going() {
                break;
            }
            if self.evict(&id, &session) {
                removed += 1;
            }
        }
        removed
    }

    /// Quita `session` solo si sigue siendo la misma instancia registrada
    fn evict(&self, id: &str, session: &Arc<Session>) -> bool {
        session.mark_expired();
        let removed = self
            .sessions
            .remove_if(id, |_, current| Arc::ptr_eq(current, session))
            .is_some();
        if removed {
            debug!(session_id = %id, "Sesión vencida eliminada");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Descarta todas las sesiones (al detener el servidor)
    pub fn clear(&self) {
        for entry in self.sessions.iter() {
            entry.value().mark_expired();
        }
        self.sessions.clear();
    }
}
