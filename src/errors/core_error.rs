use mapper_core::MapperError;
use mapper_service::ServiceError;
use thiserror::Error;

use super::domain_error::DomainError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Error interno: {0}")]
    Internal(String),
    #[error("Error del mapper: {0}")]
    Mapper(#[from] MapperError),
    #[error("Error del servicio: {0}")]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("Error de configuración: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_internal_variant_format() {
        let err = CoreError::Internal("algo malo".into());
        assert_eq!(err.to_string(), "Error interno: algo malo");
    }

    #[test]
    fn test_mapper_variant_from() {
        let err: CoreError = MapperError::Publish("cerrado".into()).into();
        assert_eq!(err.to_string(), "Error del mapper: publish failed: cerrado");
    }

    #[test]
    fn test_service_variant_from() {
        let err: CoreError = ServiceError::AlreadyStopped.into();
        assert!(matches!(err, CoreError::Service(ServiceError::AlreadyStopped)));
    }

    #[test]
    fn test_config_variant_format() {
        let err = CoreError::Config("mala configuración".into());
        assert_eq!(err.to_string(), "Error de configuración: mala configuración");
    }
}
