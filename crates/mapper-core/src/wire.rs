//! Codificación JSON de eventos del mapper tal como viajan por el tópico.

use crate::errors::MapperError;
use crate::model::FlowMapperEvent;

pub fn encode_event(event: &FlowMapperEvent) -> Result<Vec<u8>, MapperError> {
    serde_json::to_vec(event).map_err(|e| MapperError::UnknownPayload(format!("encode {}: {e}", event.kind_name())))
}

/// Decodifica un evento. Un payload desconocido o mal formado indica un
/// desajuste de protocolo y es fatal.
pub fn decode_event(bytes: &[u8]) -> Result<FlowMapperEvent, MapperError> {
    serde_json::from_slice(bytes).map_err(|e| MapperError::UnknownPayload(e.to_string()))
}
