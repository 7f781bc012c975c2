//! Hashing y canonicalización JSON usados para derivar ids deterministas.

pub mod canonical_json;
pub mod hash;

pub use canonical_json::to_canonical_json;
pub use hash::{hash_bytes_u64, hash_str, hash_value};
