//! Binding configuration.

use serde::{Deserialize, Serialize};
use tagbind_map::DecodeOptions;
use tagbind_validate::DEFAULT_TAG;

/// Default in-memory limit for multipart bodies (32 MiB).
pub const DEFAULT_MAX_MEMORY: u64 = 32 << 20;

/// Settings shared by every binding a [`Binder`](crate::Binder) runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindConfig {
    /// Structured decoding switches.
    pub decode: DecodeOptions,
    /// Tag family the default validator reads rules from.
    pub validator_tag: String,
    /// Largest request body kept in memory, in bytes.
    pub max_memory: u64,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            decode: DecodeOptions::default(),
            validator_tag: DEFAULT_TAG.to_string(),
            max_memory: DEFAULT_MAX_MEMORY,
        }
    }
}
