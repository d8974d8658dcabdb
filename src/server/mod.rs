//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones entrantes (un thread por conexión)
//! 3. Lee y parsea un request por conexión
//! 4. Genera y envía la response, y cierra la conexión

mod connection;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use tcp::Server;
