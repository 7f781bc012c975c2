//! Procesador de mensajes del mapper: punto de entrada único del transporte.
//!
//! No guarda estado propio ni se recupera de errores: elige el ejecutor para
//! el payload, lo ejecuta y devuelve su resultado tal cual.

use std::sync::Arc;

use crate::bus::{StateAndEventProcessor, StateAndEventResponse};
use crate::clock::Clock;
use crate::errors::MapperError;
use crate::executor::{executor_for, ExecutorContext};
use crate::logging::MapperLogger;
use crate::model::{FlowMapperEvent, FlowMapperState, MapperTopics};
use crate::wire::decode_event;

pub struct FlowMapperMessageProcessor {
    topics: MapperTopics,
    clock: Arc<dyn Clock>,
    logger: MapperLogger,
}

impl FlowMapperMessageProcessor {
    pub fn new(topics: MapperTopics, clock: Arc<dyn Clock>, logger: MapperLogger) -> Self {
        Self { topics, clock, logger }
    }

    /// Variante para eventos todavía codificados.
    pub fn on_next_bytes(&self, key: &str, state: Option<FlowMapperState>, bytes: &[u8])
                         -> Result<StateAndEventResponse<FlowMapperState>, MapperError> {
        let event = decode_event(bytes).map_err(|e| {
                                           self.logger.error(format_args!("undecodable event for key={key}: {e}"));
                                           e
                                       })?;
        self.on_next(key, state, event)
    }
}

impl StateAndEventProcessor for FlowMapperMessageProcessor {
    type State = FlowMapperState;
    type Event = FlowMapperEvent;

    fn on_next(&self, key: &str, state: Option<FlowMapperState>, event: FlowMapperEvent)
               -> Result<StateAndEventResponse<FlowMapperState>, MapperError> {
        let ctx = ExecutorContext { key,
                                    state: state.as_ref(),
                                    topics: &self.topics,
                                    now: self.clock.now(),
                                    logger: &self.logger };
        let result = executor_for(ctx, &event).execute().map_err(|e| {
                                                             self.logger.error(format_args!("processing {} for key={key} failed: {e}",
                                                                                            event.kind_name()));
                                                             e
                                                         })?;
        Ok(StateAndEventResponse { updated_state: result.state,
                                   response_events: result.records })
    }
}
