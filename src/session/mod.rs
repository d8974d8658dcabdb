//! # Sesiones del servidor
//! src/session/mod.rs
//!
//! Estado del lado servidor asociado a un cliente mediante la cookie
//! `JSESSIONID`:
//! - `store`: el mapa concurrente de sesiones y sus operaciones
//! - `sweeper`: el thread que elimina sesiones vencidas

pub mod store;
pub mod sweeper;

pub use store::{Session, SessionStore, SESSION_COOKIE_NAME};
pub use sweeper::Sweeper;
