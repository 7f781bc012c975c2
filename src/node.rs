//! Nodo local: un bus en memoria con su servicio de mapper.
//!
//! Permite ejercitar el mapper de punta a punta sin transporte externo:
//! `submit` escribe en el tópico del mapper, `pump` procesa lo pendiente y
//! `exchange` mueve el tráfico peer-to-peer entre dos nodos hasta que ambos
//! quedan en reposo.
use mapper_bus::{InMemoryBus, InMemorySubscriptionFactory, SubscriptionHandle};
use mapper_core::{FlowEvent, FlowMapperEvent, FlowMapperState, MapperLogger, Record, RecordKey, RecordValue};
use mapper_service::{FlowMapperConfig, FlowMapperService, LifecycleStatus};
use std::sync::Arc;

use crate::errors::{CoreError, DomainError};

pub const DEFAULT_PARTITIONS: u32 = 4;

pub struct LocalNode {
    name: String,
    bus: InMemoryBus,
    factory: Arc<InMemorySubscriptionFactory>,
    service: FlowMapperService<InMemorySubscriptionFactory>,
    config: FlowMapperConfig,
    /// Próximo índice de `p2p_out_topic` aún no entregado al peer.
    p2p_cursor: usize,
}

impl LocalNode {
    pub fn start(name: impl Into<String>, config: FlowMapperConfig) -> Result<Self, CoreError> {
        Self::start_with(name, config, InMemoryBus::new(DEFAULT_PARTITIONS), MapperLogger::global("flow_mapper"))
    }

    /// Arranca sobre un bus ya existente (p. ej. con estado sembrado).
    pub fn start_with(name: impl Into<String>, config: FlowMapperConfig, bus: InMemoryBus, logger: MapperLogger)
                      -> Result<Self, CoreError> {
        let factory = Arc::new(InMemorySubscriptionFactory::with_logger(bus.clone(), logger.with_target("flow_mapper::bus")));
        let mut service = FlowMapperService::new(factory.clone(), logger);
        service.start(config.clone())?;
        Ok(Self { name: name.into(),
                  bus,
                  factory,
                  service,
                  config,
                  p2p_cursor: 0 })
    }

    pub fn bus(&self) -> &InMemoryBus {
        &self.bus
    }

    fn handle(&self) -> Result<SubscriptionHandle, CoreError> {
        if self.service.status() != LifecycleStatus::Up {
            return Err(DomainError::NodeStopped(self.name.clone()).into());
        }
        self.factory
            .subscription(&self.config.group_name)
            .ok_or_else(|| DomainError::NodeStopped(self.name.clone()).into())
    }

    /// Encola un evento del mapper para `key`.
    pub fn submit(&self, key: &str, event: FlowMapperEvent) {
        self.bus.append(vec![Record::new(self.config.topics.mapper_topic.clone(),
                                         RecordKey::Session(key.to_string()),
                                         RecordValue::Mapper(event))]);
    }

    /// Procesa todo lo pendiente en el tópico del mapper.
    pub fn pump(&self) -> Result<usize, CoreError> {
        Ok(self.handle()?.poll()?)
    }

    /// Registros peer-to-peer emitidos desde la última llamada.
    pub fn take_outbound(&mut self) -> Vec<Record> {
        let out = self.bus.records(&self.config.topics.p2p_out_topic);
        let fresh = out.into_iter().skip(self.p2p_cursor).collect::<Vec<_>>();
        self.p2p_cursor += fresh.len();
        fresh
    }

    /// Entrega registros del peer re-publicándolos en el tópico del mapper.
    pub fn deliver(&self, records: Vec<Record>) -> usize {
        let inbound: Vec<Record> = records.into_iter()
                                          .filter(|r| r.mapper_event().is_some())
                                          .map(|r| Record::new(self.config.topics.mapper_topic.clone(), r.key, r.value))
                                          .collect();
        let n = inbound.len();
        self.bus.append(inbound);
        n
    }

    pub fn state(&self, key: &str) -> Option<FlowMapperState> {
        self.bus.state(key)
    }

    pub fn require_state(&self, key: &str) -> Result<FlowMapperState, DomainError> {
        self.state(key).ok_or_else(|| DomainError::SessionNotFound(key.to_string()))
    }

    /// Eventos entregados a los flows locales, en orden.
    pub fn flow_events(&self) -> Vec<FlowEvent> {
        self.bus
            .records(&self.config.topics.flow_event_topic)
            .iter()
            .filter_map(|r| r.flow_event().cloned())
            .collect()
    }

    pub fn stop(&mut self) -> Result<(), CoreError> {
        Ok(self.service.stop()?)
    }
}

/// Procesa ambos nodos y cruza su tráfico p2p hasta que ninguno avanza.
/// Devuelve el total de eventos procesados.
pub fn exchange(a: &mut LocalNode, b: &mut LocalNode) -> Result<usize, CoreError> {
    let mut total = 0;
    loop {
        let processed = a.pump()? + b.pump()?;
        let to_b = a.take_outbound();
        let to_a = b.take_outbound();
        let delivered = b.deliver(to_b) + a.deliver(to_a);
        total += processed;
        if processed == 0 && delivered == 0 {
            return Ok(total);
        }
    }
}
