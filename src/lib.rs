//! Flow Mapper Rust Library
//!
//! Este crate agrupa el workspace del Flow Mapper:
//! - Expone `errors` para los errores de nivel superior (núcleo y dominio).
//! - Expone `node` con un nodo local (bus en memoria + servicio) para
//!   ejercitar sesiones de punta a punta.
//! - Re-exporta `mapper_core`, `mapper_bus` y `mapper_service`.

pub mod errors;
pub mod node;

pub use mapper_bus;
pub use mapper_core;
pub use mapper_service;

#[cfg(test)]
mod tests {
	use super::errors::{core_error::CoreError, domain_error::DomainError};

	#[test]
	fn core_error_tests() {
		let i = CoreError::Internal("fallo".into()).to_string();
		assert_eq!(i, "Error interno: fallo");
	}

	#[test]
	fn domain_error_tests() {
		let d = DomainError::Validation("x".into()).to_string();
		assert_eq!(d, "Validación fallida: x");
	}
}
