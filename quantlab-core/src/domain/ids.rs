//! Hash-based identifiers for configs and runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// BLAKE3 fingerprint of a `BacktestConfig`.
///
/// Two configs with identical fields produce identical hashes, so external
/// layers can cache or deduplicate results without recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub [u8; 32]);

impl ConfigHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// First 8 hex chars, for logs and display.
    pub fn short(&self) -> String {
        self.to_hex()[..8].to_string()
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

/// Identity of one executed run: config fingerprint + dataset identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub [u8; 32]);

impl RunId {
    /// Derive from a config hash and a dataset hash.
    pub fn derive(config: &ConfigHash, dataset: &ConfigHash) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&config.0);
        hasher.update(&dataset.0);
        Self(*hasher.finalize().as_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    pub fn short(&self) -> String {
        self.0[..4].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}
