use serde::{Deserialize, Serialize};

use super::{FlowEvent, FlowKey, FlowMapperEvent};

/// Clave de un registro de salida.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKey {
    Session(String),
    Flow(FlowKey),
}

impl RecordKey {
    pub fn as_session(&self) -> Option<&str> {
        match self {
            RecordKey::Session(s) => Some(s),
            RecordKey::Flow(_) => None,
        }
    }

    pub fn as_flow(&self) -> Option<&FlowKey> {
        match self {
            RecordKey::Flow(k) => Some(k),
            RecordKey::Session(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordValue {
    Mapper(FlowMapperEvent),
    Flow(FlowEvent),
}

/// Registro `(topic, key, value)` a publicar por el transporte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub topic: String,
    pub key: RecordKey,
    pub value: RecordValue,
}

impl Record {
    pub fn new(topic: impl Into<String>, key: RecordKey, value: RecordValue) -> Self {
        Self { topic: topic.into(), key, value }
    }

    pub fn mapper_event(&self) -> Option<&FlowMapperEvent> {
        match &self.value {
            RecordValue::Mapper(ev) => Some(ev),
            RecordValue::Flow(_) => None,
        }
    }

    pub fn flow_event(&self) -> Option<&FlowEvent> {
        match &self.value {
            RecordValue::Flow(ev) => Some(ev),
            RecordValue::Mapper(_) => None,
        }
    }
}
