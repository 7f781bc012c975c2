//! mapper-core: máquina de estados del Flow Mapper.
//!
//! Contiene las piezas puras del mapper (codec de claves de sesión, modelo de
//! estado/eventos, ejecutores por tipo de payload y el procesador) junto con
//! los contratos que el transporte externo debe cumplir (`bus`).
pub mod bus;
pub mod clock;
pub mod constants;
pub mod errors;
pub mod executor;
pub mod hashing;
pub mod logging;
pub mod model;
pub mod processor;
pub mod session_key;
pub mod wire;

pub use bus::{PartitionCallbacks, Publisher, StateAndEventProcessor, StateAndEventResponse, Subscription, SubscriptionConfig,
              SubscriptionFactory};
pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::MapperError;
pub use logging::MapperLogger;
pub use model::{FlowEvent, FlowEventPayload, FlowKey, FlowMapperEvent, FlowMapperState, FlowMapperStateType, HoldingIdentity,
                MapperDirection, MapperPayload, MapperTopics, Record, RecordKey, RecordValue, SessionEvent, SessionInit,
                SessionPayload, StartFlowRequest};
pub use processor::FlowMapperMessageProcessor;
pub use session_key::{is_initiated_key, to_base, to_initiated};
