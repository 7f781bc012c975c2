//! Listener de particiones: traduce sync / pérdida / post-commit en
//! programación o cancelación de timers de limpieza.
use mapper_core::{Clock, FlowMapperState, MapperError, MapperLogger, PartitionCallbacks};
use std::collections::HashMap;
use std::sync::Arc;

use crate::scheduler::ScheduledTaskState;

pub struct FlowMapperListener {
    scheduler: Arc<ScheduledTaskState>,
    clock: Arc<dyn Clock>,
    logger: MapperLogger,
}

impl FlowMapperListener {
    pub fn new(scheduler: Arc<ScheduledTaskState>, clock: Arc<dyn Clock>, logger: MapperLogger) -> Self {
        Self { scheduler, clock, logger }
    }

    /// Particiones recién asignadas. Se validan todos los estados antes de
    /// tocar timers: un `Closing` sin expiración aborta el sync completo.
    pub fn on_partition_synced(&self, states: &HashMap<String, FlowMapperState>) -> Result<(), MapperError> {
        let mut closing = Vec::new();
        for (key, state) in states.iter().filter(|(_, s)| s.is_closing()) {
            let expiry = self.require_expiry(key, state)?;
            closing.push((key, expiry));
        }

        let now = self.clock.now();
        let mut expired = 0;
        for (key, expiry) in &closing {
            if *expiry <= now {
                self.scheduler.publish_now(key);
                expired += 1;
            } else {
                self.scheduler.schedule(key, *expiry);
            }
        }
        self.logger.info(format_args!("partition synced states={} closing={} expired={}",
                                      states.len(),
                                      closing.len(),
                                      expired));
        Ok(())
    }

    pub fn on_partition_lost(&self, states: &HashMap<String, FlowMapperState>) -> Result<(), MapperError> {
        let cancelled = states.keys().filter(|k| self.scheduler.cancel(k)).count();
        self.logger.info(format_args!("partition lost states={} cancelled_timers={cancelled}", states.len()));
        Ok(())
    }

    pub fn on_post_commit(&self, updated: &HashMap<String, Option<FlowMapperState>>) -> Result<(), MapperError> {
        for (key, state) in updated {
            match state {
                Some(s) if s.is_closing() => {
                    let expiry = self.require_expiry(key, s)?;
                    self.scheduler.schedule(key, expiry);
                }
                Some(_) => {}
                None => {
                    self.scheduler.cancel(key);
                }
            }
        }
        Ok(())
    }

    fn require_expiry(&self, key: &str, state: &FlowMapperState) -> Result<chrono::DateTime<chrono::Utc>, MapperError> {
        state.expiry_time.ok_or_else(|| {
                             self.logger.error(format_args!("CLOSING state without expiry key={key}"));
                             MapperError::ConsistencyViolation { key: key.to_string() }
                         })
    }

    /// Empaqueta el listener como los tres callbacks que espera el transporte.
    pub fn into_callbacks(self: Arc<Self>) -> PartitionCallbacks<FlowMapperState> {
        let (synced, lost, committed) = (self.clone(), self.clone(), self);
        PartitionCallbacks { on_synced: Box::new(move |states: &HashMap<String, FlowMapperState>| synced.on_partition_synced(states)),
                             on_lost: Box::new(move |states: &HashMap<String, FlowMapperState>| lost.on_partition_lost(states)),
                             on_post_commit: Box::new(move |states: &HashMap<String, Option<FlowMapperState>>| {
                                                 committed.on_post_commit(states)
                                             }) }
    }
}
