//! Helpers de hash (blake3) para no acoplar el resto del crate al algoritmo.

use blake3::Hasher;
use serde_json::Value;

use super::to_canonical_json;

/// Hashea un string y devuelve hex.
pub fn hash_str(input: &str) -> String {
    let mut h = Hasher::new();
    h.update(input.as_bytes());
    h.finalize().to_hex().to_string()
}

/// Hash del JSON canónico de `value`.
pub fn hash_value(value: &Value) -> String {
    hash_str(&to_canonical_json(value))
}

/// Primeros 8 bytes del hash como entero (little endian). Útil para repartir
/// claves entre particiones.
pub fn hash_bytes_u64(input: &[u8]) -> u64 {
    let digest = blake3::hash(input);
    let mut first = [0u8; 8];
    first.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equal_values_hash_equal_regardless_of_key_order() {
        let a = json!({"x": 1, "y": 2});
        let b = json!({"y": 2, "x": 1});
        assert_eq!(hash_value(&a), hash_value(&b));
        assert_eq!(hash_value(&a).len(), 64);
    }

    #[test]
    fn u64_hash_is_stable() {
        assert_eq!(hash_bytes_u64(b"sessionId"), hash_bytes_u64(b"sessionId"));
        assert_ne!(hash_bytes_u64(b"a"), hash_bytes_u64(b"b"));
    }
}
