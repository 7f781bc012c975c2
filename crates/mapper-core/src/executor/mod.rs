//! Ejecutores de eventos del mapper.
//!
//! Cada tipo de payload tiene su ejecutor; todos son funciones puras de
//! `(clave, estado actual, evento, instante)` a `(estado siguiente, registros)`.
//! `executor_for` elige el ejecutor con un `match` exhaustivo sobre el payload.

mod cleanup;
mod factory;
mod session_event;
mod session_init;
mod start_flow;

pub use cleanup::{ExecuteCleanupExecutor, ScheduleCleanupExecutor};
pub use factory::executor_for;
pub use session_event::SessionEventExecutor;
pub use session_init::SessionInitExecutor;
pub use start_flow::StartFlowExecutor;

use chrono::{DateTime, Utc};

use crate::errors::MapperError;
use crate::logging::MapperLogger;
use crate::model::{FlowMapperState, MapperTopics, Record};

/// Resultado de una transición.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowMapperResult {
    pub state: Option<FlowMapperState>,
    pub records: Vec<Record>,
}

impl FlowMapperResult {
    pub fn new(state: Option<FlowMapperState>, records: Vec<Record>) -> Self {
        Self { state, records }
    }

    /// Estado sin cambios y sin salida (eventos descartados).
    pub fn unchanged(state: Option<&FlowMapperState>) -> Self {
        Self { state: state.cloned(),
               records: vec![] }
    }
}

/// Entradas comunes a todos los ejecutores.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorContext<'a> {
    pub key: &'a str,
    pub state: Option<&'a FlowMapperState>,
    pub topics: &'a MapperTopics,
    pub now: DateTime<Utc>,
    pub logger: &'a MapperLogger,
}

pub trait MapperEventExecutor {
    fn execute(&self) -> Result<FlowMapperResult, MapperError>;
}
