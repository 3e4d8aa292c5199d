//! Freshness policy configuration.
//!
//! This module defines how `FreshnessPolicy` treats responses that carry no
//! explicit freshness information, and whether the cache behaves as a
//! shared cache (`proxy-revalidate` applies).
//!
//! Default values are sourced from `crate::constants`.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_HEURISTIC_COEFFICIENT, DEFAULT_HEURISTIC_LIFETIME_SECS};

fn default_heuristics_enabled() -> bool {
    true
}

fn default_heuristic_coefficient() -> f32 {
    DEFAULT_HEURISTIC_COEFFICIENT
}

fn default_heuristic_default_lifetime_secs() -> i64 {
    DEFAULT_HEURISTIC_LIFETIME_SECS
}

/// Freshness policy configuration (YAML format)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreshnessConfig {
    /// Allow heuristic freshness for responses without max-age/Expires (default: true)
    #[serde(default = "default_heuristics_enabled")]
    pub heuristics_enabled: bool,
    /// Fraction of `Date - Last-Modified` granted as lifetime (default: 0.1)
    #[serde(default = "default_heuristic_coefficient")]
    pub heuristic_coefficient: f32,
    /// Lifetime used when `Last-Modified` is unavailable (default: 0)
    #[serde(default = "default_heuristic_default_lifetime_secs")]
    pub heuristic_default_lifetime_secs: i64,
    /// Treat the cache as shared, so `proxy-revalidate` is honoured (default: false)
    #[serde(default)]
    pub shared_cache: bool,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            heuristics_enabled: default_heuristics_enabled(),
            heuristic_coefficient: default_heuristic_coefficient(),
            heuristic_default_lifetime_secs: default_heuristic_default_lifetime_secs(),
            shared_cache: false,
        }
    }
}

impl FreshnessConfig {
    /// Validate freshness configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.heuristic_coefficient.is_finite()
            || !(0.0..=1.0).contains(&self.heuristic_coefficient)
        {
            return Err(format!(
                "heuristic_coefficient ({}) must be between 0.0 and 1.0",
                self.heuristic_coefficient
            ));
        }
        if self.heuristic_default_lifetime_secs < 0 {
            return Err(format!(
                "heuristic_default_lifetime_secs ({}) cannot be negative",
                self.heuristic_default_lifetime_secs
            ));
        }
        Ok(())
    }
}
