use serde_json::json;

use super::{ExecutorContext, FlowMapperResult, MapperEventExecutor};
use crate::errors::MapperError;
use crate::model::{FlowEvent, FlowEventPayload, FlowKey, FlowMapperEvent, FlowMapperState, MapperDirection, MapperPayload, Record,
                   RecordKey, RecordValue, SessionEvent, SessionInit, SessionPayload};
use crate::session_key::{is_initiated_key, to_initiated};

/// Primer mensaje de una sesión.
///
/// - OUTBOUND: la mitad iniciadora crea su estado con el `FlowKey` del flow
///   local y reenvía el init a la clave `-INITIATED`.
/// - INBOUND: la contraparte asigna un `FlowKey` nuevo para el flow
///   respondedor y le entrega el init.
pub struct SessionInitExecutor<'a> {
    pub ctx: ExecutorContext<'a>,
    pub direction: MapperDirection,
    pub event: &'a SessionEvent,
    pub init: &'a SessionInit,
}

impl SessionInitExecutor<'_> {
    fn outbound(&self) -> Result<FlowMapperResult, MapperError> {
        let key = self.ctx.key;
        if is_initiated_key(key) {
            return Err(MapperError::unexpected(key, "outbound SessionInit on an initiated session key"));
        }
        let flow_key = self.init
                           .flow_key
                           .clone()
                           .ok_or_else(|| MapperError::unexpected(key, "outbound SessionInit without flow key"))?;

        let relay_key = to_initiated(key);
        let relayed_init = SessionInit { flow_key: None,
                                         ..self.init.clone() };
        let relayed = SessionEvent::new(relay_key.clone(), self.event.sequence_num, SessionPayload::Init(relayed_init));
        let record = Record::new(self.ctx.topics.p2p_out_topic.clone(),
                                 RecordKey::Session(relay_key.clone()),
                                 RecordValue::Mapper(FlowMapperEvent::inbound(MapperPayload::Session(relayed))));
        self.ctx.logger.debug(format_args!("session_init:outbound key={key} flow={flow_key} relay={relay_key}"));
        Ok(FlowMapperResult::new(Some(FlowMapperState::open(flow_key)), vec![record]))
    }

    fn inbound(&self) -> Result<FlowMapperResult, MapperError> {
        let key = self.ctx.key;
        let seed = json!({
            "kind": "session_init",
            "session_id": self.event.session_id,
            "flow_name": self.init.flow_name,
            "initiating_identity": self.init.initiating_identity,
        });
        let flow_key = FlowKey::allocate(key, &self.init.initiated_identity, &seed);
        let record = Record::new(self.ctx.topics.flow_event_topic.clone(),
                                 RecordKey::Flow(flow_key.clone()),
                                 RecordValue::Flow(FlowEvent { flow_key: flow_key.clone(),
                                                               payload: FlowEventPayload::Session(self.event.clone()) }));
        self.ctx.logger.debug(format_args!("session_init:inbound key={key} -> flow={flow_key}"));
        Ok(FlowMapperResult::new(Some(FlowMapperState::open(flow_key)), vec![record]))
    }
}

impl MapperEventExecutor for SessionInitExecutor<'_> {
    fn execute(&self) -> Result<FlowMapperResult, MapperError> {
        if let Some(state) = self.ctx.state {
            self.ctx.logger.warn(format_args!("duplicate SessionInit for key={} status={:?}, ignoring",
                                              self.ctx.key, state.status));
            return Ok(FlowMapperResult::unchanged(self.ctx.state));
        }
        match self.direction {
            MapperDirection::Outbound => self.outbound(),
            MapperDirection::Inbound => self.inbound(),
        }
    }
}
