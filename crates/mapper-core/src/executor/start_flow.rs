use serde_json::json;

use super::{ExecutorContext, FlowMapperResult, MapperEventExecutor};
use crate::errors::MapperError;
use crate::model::{FlowEvent, FlowEventPayload, FlowKey, FlowMapperState, Record, RecordKey, RecordValue, StartFlowRequest};

/// Inicio de flow: asigna un `FlowKey` y envía el request al tópico de flows.
pub struct StartFlowExecutor<'a> {
    pub ctx: ExecutorContext<'a>,
    pub request: &'a StartFlowRequest,
}

impl MapperEventExecutor for StartFlowExecutor<'_> {
    fn execute(&self) -> Result<FlowMapperResult, MapperError> {
        let key = self.ctx.key;
        if let Some(state) = self.ctx.state {
            self.ctx.logger.warn(format_args!("duplicate StartFlow for key={key} flow={} status={:?}, ignoring",
                                              state.flow_key, state.status));
            return Ok(FlowMapperResult::unchanged(self.ctx.state));
        }

        let seed = json!({
            "kind": "start_flow",
            "client_request_id": self.request.client_request_id,
            "flow_name": self.request.flow_name,
        });
        let flow_key = FlowKey::allocate(key, &self.request.identity, &seed);
        self.ctx.logger.debug(format_args!("start_flow key={key} -> flow={flow_key}"));

        let record = Record::new(self.ctx.topics.flow_event_topic.clone(),
                                 RecordKey::Flow(flow_key.clone()),
                                 RecordValue::Flow(FlowEvent { flow_key: flow_key.clone(),
                                                               payload: FlowEventPayload::StartFlow(self.request.clone()) }));
        Ok(FlowMapperResult::new(Some(FlowMapperState::open(flow_key)), vec![record]))
    }
}
