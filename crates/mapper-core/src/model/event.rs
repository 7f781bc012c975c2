//! Eventos que consume el mapper y eventos que emite hacia los flows.
//!
//! - `FlowMapperEvent` es el sobre que llega por el tópico del mapper:
//!   dirección + payload.
//! - `FlowEvent` es el valor que se publica en el tópico de eventos de flow,
//!   direccionado por `FlowKey`.
use serde::{Deserialize, Serialize};

use super::{FlowKey, HoldingIdentity};

/// `Inbound`: llegó del peer remoto por el transporte de sesiones.
/// `Outbound`: se originó localmente y debe reenviarse hacia afuera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapperDirection {
    Inbound,
    Outbound,
}

/// Petición de inicio de flow (típicamente desde RPC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartFlowRequest {
    pub client_request_id: String,
    pub flow_name: String,
    pub identity: HoldingIdentity,
    pub start_args: serde_json::Value,
}

/// Primer mensaje de una sesión.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInit {
    pub flow_name: String,
    pub initiating_identity: HoldingIdentity,
    pub initiated_identity: HoldingIdentity,
    /// Sólo presente en la copia local (OUTBOUND); la contraparte asigna el suyo.
    pub flow_key: Option<FlowKey>,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionPayload {
    Init(SessionInit),
    Data(Vec<u8>),
    Ack,
    Close,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub session_id: String,
    pub sequence_num: u64,
    pub payload: SessionPayload,
}

impl SessionEvent {
    pub fn new(session_id: impl Into<String>, sequence_num: u64, payload: SessionPayload) -> Self {
        Self { session_id: session_id.into(),
               sequence_num,
               payload }
    }

    /// Copia del evento direccionada a otra clave de sesión.
    pub fn readdressed(&self, session_id: &str) -> Self {
        Self { session_id: session_id.to_string(),
               sequence_num: self.sequence_num,
               payload: self.payload.clone() }
    }

    pub fn payload_name(&self) -> &'static str {
        match self.payload {
            SessionPayload::Init(_) => "SessionInit",
            SessionPayload::Data(_) => "SessionData",
            SessionPayload::Ack => "SessionAck",
            SessionPayload::Close => "SessionClose",
            SessionPayload::Error(_) => "SessionError",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapperPayload {
    StartFlow(StartFlowRequest),
    Session(SessionEvent),
    ScheduleCleanup { timeout_millis: u64 },
    ExecuteCleanup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowMapperEvent {
    pub direction: MapperDirection,
    pub payload: MapperPayload,
}

impl FlowMapperEvent {
    pub fn new(direction: MapperDirection, payload: MapperPayload) -> Self {
        Self { direction, payload }
    }

    pub fn inbound(payload: MapperPayload) -> Self {
        Self::new(MapperDirection::Inbound, payload)
    }

    pub fn outbound(payload: MapperPayload) -> Self {
        Self::new(MapperDirection::Outbound, payload)
    }

    /// Evento sintetizado por los timers de limpieza.
    pub fn execute_cleanup() -> Self {
        Self::inbound(MapperPayload::ExecuteCleanup)
    }

    /// Nombre legible de la variante para logging/diagnóstico.
    pub fn kind_name(&self) -> &'static str {
        match &self.payload {
            MapperPayload::StartFlow(_) => "StartFlow",
            MapperPayload::Session(ev) => ev.payload_name(),
            MapperPayload::ScheduleCleanup { .. } => "ScheduleCleanup",
            MapperPayload::ExecuteCleanup => "ExecuteCleanup",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlowEventPayload {
    StartFlow(StartFlowRequest),
    Session(SessionEvent),
}

/// Valor publicado en el tópico de eventos de flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEvent {
    pub flow_key: FlowKey,
    pub payload: FlowEventPayload,
}
