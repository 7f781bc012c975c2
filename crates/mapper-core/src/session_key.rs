//! Codec de claves de sesión.
//!
//! Una sesión del wire se representa con dos claves locales independientes:
//! la del iniciador (`base`) y la de la contraparte (`base-INITIATED`). Así
//! cada mitad se procesa como estado particionado ordinario, sin locks entre
//! claves.

use crate::constants::INITIATED_SESSION_ID_SUFFIX;

/// Clave de la mitad iniciada (contraparte) de la sesión.
pub fn to_initiated(base: &str) -> String {
    format!("{base}{INITIATED_SESSION_ID_SUFFIX}")
}

/// Quita el sufijo si existe; en otro caso devuelve la clave tal cual.
pub fn to_base(key: &str) -> &str {
    key.strip_suffix(INITIATED_SESSION_ID_SUFFIX).unwrap_or(key)
}

pub fn is_initiated_key(key: &str) -> bool {
    key.ends_with(INITIATED_SESSION_ID_SUFFIX)
}

/// Clave de la otra mitad de la conversación: agrega el sufijo a una clave
/// base o lo quita de una clave ya sufijada.
pub fn counterpart_key(key: &str) -> String {
    if is_initiated_key(key) {
        to_base(key).to_string()
    } else {
        to_initiated(key)
    }
}
