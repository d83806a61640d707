//! Configuration fingerprinting
//!
//! A fingerprint is the SHA-256 of the config's canonical JSON form (object
//! keys sorted recursively). Results carry it so exported tables can be
//! matched with the exact parameter bundle that produced them.

use crate::config::{ConfigError, SimConfig};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Compute the hex SHA-256 fingerprint of a configuration.
///
/// # Example
/// ```
/// use mobility_simulator_core_rs::{config_fingerprint, SimConfig};
///
/// let a = config_fingerprint(&SimConfig::default()).unwrap();
/// let b = config_fingerprint(&SimConfig::default()).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn config_fingerprint(config: &SimConfig) -> Result<String, ConfigError> {
    let value = serde_json::to_value(config)
        .map_err(|e| ConfigError::Serialization(e.to_string()))?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value))
        .map_err(|e| ConfigError::Serialization(e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
