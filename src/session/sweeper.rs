//! # Sweeper de Sesiones
//! src/session/sweeper.rs
//!
//! Thread de fondo que, cada `interval`, elimina las sesiones vencidas.
//! Se detiene apenas se llama a `stop()` (o al hacer drop), incluso a mitad
//! de un barrido.

use super::SessionStore;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Handle del thread sweeper
pub struct Sweeper {
    stop_tx: Option<Sender<()>>,
    stopping: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Lanza el sweeper sobre `store`
    pub fn spawn(store: Arc<SessionStore>, interval: Duration) -> io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let stopping = Arc::new(AtomicBool::new(false));

        let handle = thread::Builder::new()
            .name("session-sweeper".to_string())
            .spawn({
                let stopping = Arc::clone(&stopping);
                move || {
                    info!(interval_ms = interval.as_millis() as u64, "Sweeper de sesiones iniciado");
                    loop {
                        match stop_rx.recv_timeout(interval) {
                            Err(RecvTimeoutError::Timeout) => {
                                let removed = store.sweep_while(Instant::now(), || {
                                    !stopping.load(Ordering::Acquire)
                                });
                                if removed > 0 {
                                    debug!(removed, remaining = store.len(), "Barrido de sesiones");
                                }
                            }
                            // Señal explícita o sender descartado
                            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                        }
                    }
                    info!("Sweeper de sesiones detenido");
                }
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            stopping,
            handle: Some(handle),
        })
    }

    /// Detiene el sweeper y espera a que termine. Idempotente.
    pub fn stop(&mut self) {
        self.stopping.store(true, Ordering::Release);
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}
