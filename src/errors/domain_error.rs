use thiserror::Error;

/// Errores del dominio de sesiones vistos desde el harness local.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Sesión no encontrada: {0}")]
    SessionNotFound(String),
    #[error("Validación fallida: {0}")]
    Validation(String),
    #[error("El nodo {0} no está en marcha")]
    NodeStopped(String),
}
