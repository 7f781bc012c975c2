use super::{ExecuteCleanupExecutor, ExecutorContext, MapperEventExecutor, ScheduleCleanupExecutor, SessionEventExecutor,
            SessionInitExecutor, StartFlowExecutor};
use crate::model::{FlowMapperEvent, MapperPayload, SessionPayload};

/// Construye el ejecutor correspondiente al payload de `event`.
pub fn executor_for<'a>(ctx: ExecutorContext<'a>, event: &'a FlowMapperEvent) -> Box<dyn MapperEventExecutor + 'a> {
    match &event.payload {
        MapperPayload::StartFlow(request) => Box::new(StartFlowExecutor { ctx, request }),
        MapperPayload::Session(session_event) => match &session_event.payload {
            SessionPayload::Init(init) => Box::new(SessionInitExecutor { ctx,
                                                                         direction: event.direction,
                                                                         event: session_event,
                                                                         init }),
            SessionPayload::Data(_) | SessionPayload::Ack | SessionPayload::Close | SessionPayload::Error(_) => {
                Box::new(SessionEventExecutor { ctx,
                                                direction: event.direction,
                                                event: session_event })
            }
        },
        MapperPayload::ScheduleCleanup { timeout_millis } => Box::new(ScheduleCleanupExecutor { ctx,
                                                                                                 timeout_millis: *timeout_millis }),
        MapperPayload::ExecuteCleanup => Box::new(ExecuteCleanupExecutor { ctx }),
    }
}
