//! Content-based fingerprints of job configurations.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::StoreResult;

/// Hex SHA-256 over the JSON form of `config` and the engine version.
pub fn config_digest<T: Serialize>(config: &T, engine_version: &str) -> StoreResult<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_string(config)?.as_bytes());
    hasher.update(engine_version.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
