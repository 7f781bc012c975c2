use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use crate::constants::{FLOW_ID_HEX_LEN, FLOW_KEY_VERSION};
use crate::hashing::hash_value;

/// Identidad de un nodo virtual (nombre X.500 + grupo de membresía).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HoldingIdentity {
    pub x500_name: String,
    pub group_id: String,
}

impl HoldingIdentity {
    pub fn new(x500_name: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self { x500_name: x500_name.into(),
               group_id: group_id.into() }
    }
}

/// Identidad local de una instancia de flow; direcciona el tópico de eventos
/// de flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowKey {
    pub id: String,
    pub identity: HoldingIdentity,
}

impl FlowKey {
    pub fn new(id: impl Into<String>, identity: HoldingIdentity) -> Self {
        Self { id: id.into(), identity }
    }

    /// Asigna un `FlowKey` para la clave `mapper_key` a partir de `seed`.
    ///
    /// El id es el prefijo del hash del JSON canónico de
    /// `(versión, clave, identidad, seed)`, de modo que reprocesar el mismo
    /// evento contra el mismo estado ausente produce el mismo `FlowKey`.
    pub fn allocate(mapper_key: &str, identity: &HoldingIdentity, seed: &Value) -> Self {
        let input = json!({
            "version": FLOW_KEY_VERSION,
            "mapper_key": mapper_key,
            "identity": identity,
            "seed": seed,
        });
        let digest = hash_value(&input);
        Self { id: digest[..FLOW_ID_HEX_LEN].to_string(),
               identity: identity.clone() }
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.identity.x500_name)
    }
}
