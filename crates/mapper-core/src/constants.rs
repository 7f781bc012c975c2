//! Constantes del mapper.
//!
//! `FLOW_KEY_VERSION` forma parte del input del hash con el que se derivan
//! los `FlowKey`; cambiarlo altera los ids asignados en un replay.

/// Sufijo que identifica la mitad "initiated" (contraparte) de una sesión.
pub const INITIATED_SESSION_ID_SUFFIX: &str = "-INITIATED";

/// Versión lógica del esquema de asignación de `FlowKey`.
pub const FLOW_KEY_VERSION: &str = "FM1.0";

/// Longitud (en caracteres hex) del id de flow derivado del hash.
pub const FLOW_ID_HEX_LEN: usize = 32;
