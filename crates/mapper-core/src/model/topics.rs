use serde::{Deserialize, Serialize};

/// Los tres tópicos lógicos con los que trabaja el mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperTopics {
    /// Tópico de entrada del propio mapper (también destino de `ExecuteCleanup`).
    pub mapper_topic: String,
    /// Tópico interno de eventos de flow, direccionado por `FlowKey`.
    pub flow_event_topic: String,
    /// Tópico de salida peer-to-peer.
    pub p2p_out_topic: String,
}

impl Default for MapperTopics {
    fn default() -> Self {
        Self { mapper_topic: "flow.mapper.event".to_string(),
               flow_event_topic: "flow.event".to_string(),
               p2p_out_topic: "p2p.out".to_string() }
    }
}
