//! mapper-bus: implementación en memoria del contrato de transporte.
//!
//! Reproduce lo que el mapper necesita del log particionado externo:
//! - tópicos append-only y un store de estado por clave (`InMemoryBus`);
//! - asignación/revocación de particiones con callbacks de sync y pérdida;
//! - procesamiento secuencial por clave con commit atómico de estado +
//!   registros seguido del callback post-commit;
//! - un publisher que escribe en los mismos tópicos.
//!
//! Paridad con un transporte real: el orden por clave se respeta (orden del
//! log) y un error del procesador detiene el avance del offset de esa
//! partición (evento envenenado).

mod bus;
mod factory;
mod publisher;
mod subscription;

pub use bus::InMemoryBus;
pub use factory::InMemorySubscriptionFactory;
pub use publisher::InMemoryPublisher;
pub use subscription::{InMemoryStateAndEventSubscription, SubscriptionHandle};
