//! Estado persistido por clave de sesión.
//!
//! Transiciones válidas (las aplica sólo el ejecutor):
//! - ausente -> `Open` (inicio de flow o `SessionInit`)
//! - `Open` -> `Error` (error de sesión)
//! - `Open`/`Error` -> `Closing` (fija `expiry_time`)
//! - cualquiera -> ausente (`ExecuteCleanup`)
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FlowKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowMapperStateType {
    /// Sesión viva; el ruteo está activo.
    Open,
    /// Sesión terminada lógicamente, pendiente de limpieza. Requiere `expiry_time`.
    Closing,
    /// Falla local irrecuperable; el ruteo queda suspendido.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowMapperState {
    pub flow_key: FlowKey,
    pub expiry_time: Option<DateTime<Utc>>,
    pub status: FlowMapperStateType,
}

impl FlowMapperState {
    pub fn open(flow_key: FlowKey) -> Self {
        Self { flow_key,
               expiry_time: None,
               status: FlowMapperStateType::Open }
    }

    /// Copia del estado en `Closing` con la expiración indicada.
    pub fn closing(&self, expiry_time: DateTime<Utc>) -> Self {
        Self { flow_key: self.flow_key.clone(),
               expiry_time: Some(expiry_time),
               status: FlowMapperStateType::Closing }
    }

    pub fn errored(&self) -> Self {
        Self { flow_key: self.flow_key.clone(),
               expiry_time: self.expiry_time,
               status: FlowMapperStateType::Error }
    }

    pub fn is_closing(&self) -> bool {
        self.status == FlowMapperStateType::Closing
    }

    /// Expiración de un estado `Closing`. `None` si el estado no está en
    /// `Closing` o si viola el invariante (sin `expiry_time`); quien llama
    /// distingue ambos casos con `is_closing`.
    pub fn closing_expiry(&self) -> Option<DateTime<Utc>> {
        if self.is_closing() {
            self.expiry_time
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HoldingIdentity;

    #[test]
    fn closing_sets_expiry_and_keeps_flow_key() {
        let fk = FlowKey::new("f1", HoldingIdentity::new("O=Alice", "g"));
        let open = FlowMapperState::open(fk.clone());
        let now = Utc::now();
        let closing = open.closing(now);
        assert_eq!(closing.flow_key, fk);
        assert_eq!(closing.closing_expiry(), Some(now));
        assert_eq!(open.closing_expiry(), None);
    }
}
