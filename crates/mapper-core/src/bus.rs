//! Contrato con el transporte externo (log particionado pub/sub con estado
//! por clave y semántica exactly-once).
//!
//! - `StateAndEventProcessor`: primitiva `estado + evento -> (estado, registros)`.
//! - `PartitionCallbacks`: tres callbacks independientes de ciclo de vida de
//!   particiones (sync, pérdida, post-commit).
//! - `Publisher`: emisión asíncrona de registros.
//! - `SubscriptionFactory` / `Subscription`: registro bajo `(grupo, tópico, instancia)`.
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::MapperError;
use crate::model::{FlowMapperEvent, FlowMapperState, Record};

/// Respuesta del procesador: el transporte hace commit de `updated_state` y
/// publica `response_events` de forma atómica.
#[derive(Debug, Clone, PartialEq)]
pub struct StateAndEventResponse<S> {
    pub updated_state: Option<S>,
    pub response_events: Vec<Record>,
}

pub trait StateAndEventProcessor: Send + Sync {
    type State: Clone + Send + Sync + 'static;
    type Event: Clone + Send + Sync + 'static;

    fn on_next(&self, key: &str, state: Option<Self::State>, event: Self::Event)
               -> Result<StateAndEventResponse<Self::State>, MapperError>;
}

/// Procesador del mapper tal como lo ve el transporte.
pub type MapperProcessor = dyn StateAndEventProcessor<State = FlowMapperState, Event = FlowMapperEvent>;

pub type StatesCallback<S> = Box<dyn Fn(&HashMap<String, S>) -> Result<(), MapperError> + Send + Sync>;
pub type CommitCallback<S> = Box<dyn Fn(&HashMap<String, Option<S>>) -> Result<(), MapperError> + Send + Sync>;

/// Callbacks de ciclo de vida de particiones. Se ejecutan en el hilo de
/// procesamiento del transporte.
pub struct PartitionCallbacks<S> {
    /// Snapshot de estados de particiones recién asignadas. Debe terminar
    /// antes de procesar eventos vivos de esas particiones.
    pub on_synced: StatesCallback<S>,
    /// Estados de particiones que dejaron de pertenecer a este nodo.
    pub on_lost: StatesCallback<S>,
    /// Estados de un lote ya comiteado (`None` = borrado).
    pub on_post_commit: CommitCallback<S>,
}

impl<S: 'static> PartitionCallbacks<S> {
    pub fn noop() -> Self {
        Self { on_synced: Box::new(|_: &HashMap<String, S>| -> Result<(), MapperError> { Ok(()) }),
               on_lost: Box::new(|_: &HashMap<String, S>| -> Result<(), MapperError> { Ok(()) }),
               on_post_commit: Box::new(|_: &HashMap<String, Option<S>>| -> Result<(), MapperError> { Ok(()) }) }
    }
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, records: Vec<Record>) -> Result<(), MapperError>;
    fn close(&self);
}

pub trait Subscription: Send {
    fn start(&mut self) -> Result<(), MapperError>;
    fn close(&mut self);
}

/// Coordenadas bajo las que se registra el procesador.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionConfig {
    pub group_name: String,
    pub topic: String,
    pub instance_id: i32,
}

pub trait SubscriptionFactory: Send + Sync {
    fn create_publisher(&self, client_id: &str) -> Result<Arc<dyn Publisher>, MapperError>;

    fn create_state_and_event_subscription(&self, config: SubscriptionConfig, processor: Arc<MapperProcessor>,
                                           callbacks: PartitionCallbacks<FlowMapperState>)
                                           -> Result<Box<dyn Subscription>, MapperError>;
}
