//! mapper-service: ciclo de vida del Flow Mapper y timers de limpieza.
//!
//! - `scheduler`: mapa de timers por clave (uno como máximo) sobre un runtime tokio propio.
//! - `listener`: callbacks de partición que programan/cancelan timers.
//! - `service`: start / stop / reconfigure sobre un `SubscriptionFactory`.
pub mod config;
pub mod error;
pub mod listener;
pub mod scheduler;
pub mod service;

pub use config::FlowMapperConfig;
pub use error::ServiceError;
pub use listener::FlowMapperListener;
pub use scheduler::ScheduledTaskState;
pub use service::{FlowMapperService, LifecycleStatus};
