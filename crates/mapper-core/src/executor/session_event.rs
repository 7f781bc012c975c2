use super::{ExecutorContext, FlowMapperResult, MapperEventExecutor};
use crate::errors::MapperError;
use crate::model::{FlowEvent, FlowEventPayload, FlowMapperEvent, FlowMapperState, FlowMapperStateType, MapperDirection,
                   MapperPayload, Record, RecordKey, RecordValue, SessionEvent, SessionPayload};
use crate::session_key::counterpart_key;

/// Mensajes de sesión posteriores al init (data, ack, close, error).
///
/// Sólo se rutean con el estado en `Open`. Un `SessionPayload::Error` se
/// rutea igual que data y deja el estado en `Error`.
pub struct SessionEventExecutor<'a> {
    pub ctx: ExecutorContext<'a>,
    pub direction: MapperDirection,
    pub event: &'a SessionEvent,
}

impl SessionEventExecutor<'_> {
    fn route(&self, state: &FlowMapperState) -> Record {
        match self.direction {
            MapperDirection::Outbound => {
                let relay_key = counterpart_key(self.ctx.key);
                let relayed = self.event.readdressed(&relay_key);
                Record::new(self.ctx.topics.p2p_out_topic.clone(),
                            RecordKey::Session(relay_key),
                            RecordValue::Mapper(FlowMapperEvent::inbound(MapperPayload::Session(relayed))))
            }
            MapperDirection::Inbound => Record::new(self.ctx.topics.flow_event_topic.clone(),
                                                    RecordKey::Flow(state.flow_key.clone()),
                                                    RecordValue::Flow(FlowEvent { flow_key: state.flow_key.clone(),
                                                                                  payload: FlowEventPayload::Session(self.event.clone()) })),
        }
    }
}

impl MapperEventExecutor for SessionEventExecutor<'_> {
    fn execute(&self) -> Result<FlowMapperResult, MapperError> {
        let key = self.ctx.key;
        let state = self.ctx
                        .state
                        .ok_or_else(|| MapperError::unexpected(key, format!("{} without session state", self.event.payload_name())))?;

        if state.status != FlowMapperStateType::Open {
            self.ctx.logger.warn(format_args!("dropping {} {:?} for key={key}: session is {:?}",
                                              self.event.payload_name(), self.direction, state.status));
            return Ok(FlowMapperResult::unchanged(Some(state)));
        }

        let record = self.route(state);
        let next = match self.event.payload {
            SessionPayload::Error(ref msg) => {
                self.ctx.logger.warn(format_args!("session error for key={key}: {msg}"));
                state.errored()
            }
            _ => state.clone(),
        };
        self.ctx.logger.debug(format_args!("session_event key={key} kind={} dir={:?}",
                                           self.event.payload_name(), self.direction));
        Ok(FlowMapperResult::new(Some(next), vec![record]))
    }
}
