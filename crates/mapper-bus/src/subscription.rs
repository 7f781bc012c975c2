use mapper_core::bus::MapperProcessor;
use mapper_core::{FlowMapperState, MapperError, MapperLogger, PartitionCallbacks, RecordKey, Subscription, SubscriptionConfig};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::bus::InMemoryBus;

struct SubscriptionState {
    bus: InMemoryBus,
    config: SubscriptionConfig,
    processor: Arc<MapperProcessor>,
    callbacks: PartitionCallbacks<FlowMapperState>,
    assigned: BTreeSet<u32>,
    /// Particiones detenidas por un callback post-commit fatal.
    halted: BTreeMap<u32, MapperError>,
    auto_assign: bool,
    started: bool,
    closed: bool,
    logger: MapperLogger,
}

/// Handle compartido de una suscripción en memoria; permite a los tests
/// conducir el procesamiento (`poll`) y simular rebalanceos (`assign`/`revoke`).
#[derive(Clone)]
pub struct SubscriptionHandle {
    inner: Arc<Mutex<SubscriptionState>>,
}

impl SubscriptionHandle {
    pub(crate) fn new(bus: InMemoryBus, config: SubscriptionConfig, processor: Arc<MapperProcessor>,
                      callbacks: PartitionCallbacks<FlowMapperState>, auto_assign: bool, logger: MapperLogger)
                      -> Self {
        let state = SubscriptionState { bus,
                                        config,
                                        processor,
                                        callbacks,
                                        assigned: BTreeSet::new(),
                                        halted: BTreeMap::new(),
                                        auto_assign,
                                        started: false,
                                        closed: false,
                                        logger };
        Self { inner: Arc::new(Mutex::new(state)) }
    }

    fn lock(&self) -> MutexGuard<'_, SubscriptionState> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn config(&self) -> SubscriptionConfig {
        self.lock().config.clone()
    }

    pub fn is_started(&self) -> bool {
        self.lock().started
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn assigned(&self) -> BTreeSet<u32> {
        self.lock().assigned.clone()
    }

    pub(crate) fn start(&self) -> Result<(), MapperError> {
        let all = {
            let mut s = self.lock();
            if s.closed {
                return Err(MapperError::Subscription(format!("subscription {} is closed", s.config.group_name)));
            }
            if s.started {
                return Ok(());
            }
            s.started = true;
            if !s.auto_assign {
                return Ok(());
            }
            s.bus.all_partitions()
        };
        self.assign(&all)
    }

    /// Asigna particiones: corre el callback de sync con el snapshot de sus
    /// estados antes de que `poll` procese eventos de esas particiones. Si
    /// el callback falla la asignación no se aplica.
    pub fn assign(&self, partitions: &BTreeSet<u32>) -> Result<(), MapperError> {
        let mut s = self.lock();
        let fresh: BTreeSet<u32> = partitions.difference(&s.assigned).copied().collect();
        if fresh.is_empty() {
            return Ok(());
        }
        let snapshot = s.bus.states_in(&fresh);
        s.logger.info(format_args!("group={} assigned partitions={:?} synced_states={}",
                                   s.config.group_name,
                                   fresh,
                                   snapshot.len()));
        (s.callbacks.on_synced)(&snapshot)?;
        s.assigned.extend(fresh);
        Ok(())
    }

    /// Revoca particiones y entrega sus estados al callback de pérdida.
    pub fn revoke(&self, partitions: &BTreeSet<u32>) -> Result<(), MapperError> {
        let mut s = self.lock();
        let lost: BTreeSet<u32> = partitions.intersection(&s.assigned).copied().collect();
        if lost.is_empty() {
            return Ok(());
        }
        for p in &lost {
            s.assigned.remove(p);
            s.halted.remove(p);
        }
        let snapshot = s.bus.states_in(&lost);
        s.logger.info(format_args!("group={} lost partitions={:?} states={}", s.config.group_name, lost, snapshot.len()));
        (s.callbacks.on_lost)(&snapshot)
    }

    /// Procesa todos los eventos pendientes del tópico de particiones
    /// asignadas, incluidos los que se agreguen durante el propio `poll`.
    /// Devuelve cuántos eventos se procesaron.
    ///
    /// Los offsets viven en el bus por `(grupo, partición)`: una suscripción
    /// nueva del mismo grupo retoma donde quedó la anterior.
    pub fn poll(&self) -> Result<usize, MapperError> {
        let mut s = self.lock();
        if s.closed {
            return Err(MapperError::Subscription(format!("subscription {} is closed", s.config.group_name)));
        }
        if let Some((partition, err)) = s.halted.iter().next() {
            s.logger.warn(format_args!("group={} partition={partition} halted: {err}", s.config.group_name));
            return Err(err.clone());
        }
        let group = s.config.group_name.clone();
        let mut processed = 0;
        loop {
            let from = s.assigned.iter().map(|p| s.bus.committed_offset(&group, *p)).min();
            let Some(from) = from else {
                return Ok(processed);
            };
            let pending = s.bus.records_from(&s.config.topic, from);
            let mut progressed = false;
            for (index, record) in pending {
                let key = match &record.key {
                    RecordKey::Session(k) => k.clone(),
                    RecordKey::Flow(fk) => fk.id.clone(),
                };
                let partition = s.bus.partition_for(&key);
                if !s.assigned.contains(&partition) || index < s.bus.committed_offset(&group, partition) {
                    continue;
                }
                let Some(event) = record.mapper_event().cloned() else {
                    s.logger.warn(format_args!("skipping non-mapper record at {}#{index}", s.config.topic));
                    s.bus.advance_offset(&group, partition, index + 1);
                    progressed = true;
                    continue;
                };

                let current = s.bus.state(&key);
                let response = s.processor.on_next(&key, current, event)?;
                s.bus.commit(&group,
                             partition,
                             index + 1,
                             &key,
                             response.updated_state.clone(),
                             response.response_events);
                processed += 1;
                progressed = true;

                // El lote ya está comiteado: un error aquí detiene la partición
                // en vez de reprocesar (y duplicar) el evento.
                let committed: HashMap<String, Option<FlowMapperState>> = HashMap::from([(key, response.updated_state)]);
                if let Err(e) = (s.callbacks.on_post_commit)(&committed) {
                    s.logger.error(format_args!("group={group} partition={partition} post-commit failed: {e}"));
                    s.halted.insert(partition, e.clone());
                    return Err(e);
                }
            }
            if !progressed {
                return Ok(processed);
            }
        }
    }

    pub(crate) fn close(&self) {
        let assigned = {
            let s = self.lock();
            if s.closed {
                return;
            }
            s.assigned.clone()
        };
        if let Err(e) = self.revoke(&assigned) {
            self.lock().logger.warn(format_args!("revoke on close failed: {e}"));
        }
        let mut s = self.lock();
        s.closed = true;
        s.started = false;
        s.logger.info(format_args!("group={} subscription closed", s.config.group_name));
    }
}

/// Suscripción `estado + evento` que el factory entrega al servicio.
pub struct InMemoryStateAndEventSubscription {
    handle: SubscriptionHandle,
}

impl InMemoryStateAndEventSubscription {
    pub fn new(handle: SubscriptionHandle) -> Self {
        Self { handle }
    }
}

impl Subscription for InMemoryStateAndEventSubscription {
    fn start(&mut self) -> Result<(), MapperError> {
        self.handle.start()
    }

    fn close(&mut self) {
        self.handle.close()
    }
}
