//! Freshness policy
//!
//! Combines the validity engine queries into a single verdict a caching
//! client can act on, driven by [`FreshnessConfig`]:
//! - explicit freshness (`max-age`, `s-maxage`, `Expires`) is always preferred
//! - heuristic freshness is only considered when the origin gave none
//! - `must-revalidate` (and `proxy-revalidate` for shared caches) forbids
//!   serving stale content, even while revalidating or on error

use super::entry::CacheEntrySnapshot;
use super::freshness;
use crate::config::FreshnessConfig;
use http::HeaderMap;
use serde::Serialize;
use std::time::SystemTime;

/// What a caller may do with a stored entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "verdict")]
pub enum Freshness {
    /// Serve from cache without contacting the origin
    Fresh,
    /// Serve the stale entry now and revalidate in the background
    StaleWhileRevalidate,
    /// Revalidate (conditional request if `revalidatable`) or refetch first
    Stale { revalidatable: bool },
}

impl Freshness {
    /// Whether the stored entry may be returned to the caller right away
    pub fn can_serve(&self) -> bool {
        !matches!(self, Freshness::Stale { .. })
    }

    /// Whether an origin request is needed (now or in the background)
    pub fn needs_origin(&self) -> bool {
        !matches!(self, Freshness::Fresh)
    }
}

/// Config-driven freshness decisions
#[derive(Debug, Clone, Default)]
pub struct FreshnessPolicy {
    config: FreshnessConfig,
}

impl FreshnessPolicy {
    pub fn new(config: FreshnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FreshnessConfig {
        &self.config
    }

    /// Evaluate `snapshot` at `now`.
    pub fn evaluate(&self, snapshot: &CacheEntrySnapshot, now: SystemTime) -> Freshness {
        let age = freshness::current_age_secs(snapshot, now);
        let lifetime = self.lifetime_secs(snapshot);

        let verdict = if age < lifetime {
            Freshness::Fresh
        } else if !self.forbids_stale(snapshot)
            && freshness::may_return_stale_while_revalidating(snapshot, now)
        {
            Freshness::StaleWhileRevalidate
        } else {
            Freshness::Stale {
                revalidatable: freshness::is_revalidatable(snapshot),
            }
        };

        tracing::debug!(
            age_secs = age,
            lifetime_secs = lifetime,
            verdict = ?verdict,
            "Evaluated cache entry freshness"
        );
        verdict
    }

    /// Whether the stale entry may be served because the origin request failed.
    pub fn stale_on_error(
        &self,
        snapshot: &CacheEntrySnapshot,
        request_headers: &HeaderMap,
        now: SystemTime,
    ) -> bool {
        if self.forbids_stale(snapshot) {
            return false;
        }
        let allowed = freshness::may_return_stale_if_error(snapshot, request_headers, now);
        tracing::debug!(
            staleness_secs = freshness::staleness_secs(snapshot, now),
            allowed,
            "Evaluated stale-if-error"
        );
        allowed
    }

    fn lifetime_secs(&self, snapshot: &CacheEntrySnapshot) -> i64 {
        if self.config.heuristics_enabled && !freshness::has_explicit_freshness(snapshot) {
            freshness::heuristic_freshness_lifetime_secs(
                snapshot,
                self.config.heuristic_coefficient,
                self.config.heuristic_default_lifetime_secs,
            )
        } else {
            freshness::freshness_lifetime_secs(snapshot)
        }
    }

    fn forbids_stale(&self, snapshot: &CacheEntrySnapshot) -> bool {
        freshness::must_revalidate(snapshot)
            || (self.config.shared_cache && freshness::proxy_revalidate(snapshot))
    }
}
