//! Coalescing configuration types.
//!
//! Controls whether `RequestCoalescer` shares one collapsing window per
//! cache key. Disabling it gives every caller a private coordinator, which
//! is mostly useful for debugging duplicate fetches.
//!
//! Default: enabled.

use serde::{Deserialize, Serialize};

/// Default enabled state
fn default_enabled() -> bool {
    true
}

/// Request coalescing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoalescingConfig {
    /// Enable request coalescing (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for CoalescingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}
