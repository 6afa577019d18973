use serde::{Deserialize, Serialize};

use crate::error::{DeltaError, DeltaResult};

/// Configuration for a structural comparison.
///
/// Every field has a default, so a configuration document only needs to
/// name what it changes:
///
/// ```toml
/// detect_cycles = true
/// max_depth = 64
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaConfig {
    /// Record a circular-reference marker instead of re-entering a pair of
    /// values already open on the current comparison path.
    pub detect_cycles: bool,
    /// Maximum nesting of structured values below the compared pair.
    /// `None` means unbounded.
    pub max_depth: Option<usize>,
    /// Drop nested deltas that recorded no difference.
    pub prune_empty: bool,
}

impl Default for DeltaConfig {
    fn default() -> Self {
        Self {
            detect_cycles: true,
            max_depth: None,
            prune_empty: true,
        }
    }
}

impl DeltaConfig {
    /// Parse a configuration from a TOML document.
    pub fn from_toml_str(source: &str) -> DeltaResult<Self> {
        toml::from_str(source).map_err(|e| DeltaError::Config(e.to_string()))
    }

    /// Render this configuration as a TOML document.
    pub fn to_toml_string(&self) -> DeltaResult<String> {
        toml::to_string(self).map_err(|e| DeltaError::Config(e.to_string()))
    }

    /// Bound the nesting depth of a comparison.
    pub fn with_max_depth(self, max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
            ..self
        }
    }

    /// Disable the cycle guard. Only safe for acyclic values, or together
    /// with [`DeltaConfig::with_max_depth`].
    pub fn without_cycle_detection(self) -> Self {
        Self {
            detect_cycles: false,
            ..self
        }
    }
}
