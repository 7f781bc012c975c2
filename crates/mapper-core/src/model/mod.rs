//! Modelo del mapper: estado por sesión, eventos de entrada, registros de
//! salida y nombres de tópicos.

mod event;
mod flow_key;
mod record;
mod state;
mod topics;

pub use event::{FlowEvent, FlowEventPayload, FlowMapperEvent, MapperDirection, MapperPayload, SessionEvent, SessionInit,
                SessionPayload, StartFlowRequest};
pub use flow_key::{FlowKey, HoldingIdentity};
pub use record::{Record, RecordKey, RecordValue};
pub use state::{FlowMapperState, FlowMapperStateType};
pub use topics::MapperTopics;
