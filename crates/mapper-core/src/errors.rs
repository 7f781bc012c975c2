//! Errores del mapper.
//!
//! Todas las variantes salvo `Publish` son fatales para el lote o la clave en
//! curso: el transporte debe tratarlas como evento envenenado y no reintentar.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum MapperError {
    /// Combinación evento/estado que el ejecutor no admite.
    #[error("unexpected event for key {key}: {detail}")]
    UnexpectedEvent { key: String, detail: String },
    /// Estado `Closing` sin `expiry_time`.
    #[error("consistency violation: CLOSING state without expiry for key {key}")]
    ConsistencyViolation { key: String },
    /// Payload que no se pudo decodificar (desajuste de protocolo/versión).
    #[error("unknown payload kind: {0}")]
    UnknownPayload(String),
    #[error("publish failed: {0}")]
    Publish(String),
    #[error("subscription error: {0}")]
    Subscription(String),
}

impl MapperError {
    pub fn unexpected(key: &str, detail: impl Into<String>) -> Self {
        Self::UnexpectedEvent { key: key.to_string(),
                                detail: detail.into() }
    }

    pub fn is_fatal(&self) -> bool {
        !matches!(self, MapperError::Publish(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_publish_errors_are_recoverable() {
        assert!(!MapperError::Publish("down".into()).is_fatal());
        assert!(MapperError::ConsistencyViolation { key: "k".into() }.is_fatal());
        assert!(MapperError::unexpected("k", "x").is_fatal());
        assert!(MapperError::UnknownPayload("x".into()).is_fatal());
    }

    #[test]
    fn display_includes_key() {
        let e = MapperError::ConsistencyViolation { key: "sessionId".into() };
        assert_eq!(e.to_string(), "consistency violation: CLOSING state without expiry for key sessionId");
    }
}
