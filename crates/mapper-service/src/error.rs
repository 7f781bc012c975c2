use mapper_core::MapperError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error(transparent)]
    Mapper(#[from] MapperError),
    #[error("El servicio no está en marcha")]
    AlreadyStopped,
    #[error("Error creando el runtime de limpieza: {0}")]
    Runtime(String),
}
