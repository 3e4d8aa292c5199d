// Constants module - centralized default values and well-known names
//
// Numeric fallbacks used by the validity engine and defaults used by the
// configuration layer live here instead of being scattered as magic numbers.

// =============================================================================
// Age arithmetic
// =============================================================================

/// Age reported when a response's age cannot be trusted (missing `Date`,
/// malformed or negative `Age`). Large enough to make any entry stale.
pub const MAX_AGE_SENTINEL: i64 = 2_147_483_648;

// =============================================================================
// Heuristic freshness defaults
// =============================================================================

/// Default fraction of `Date - Last-Modified` used as heuristic lifetime
pub const DEFAULT_HEURISTIC_COEFFICIENT: f32 = 0.1;

/// Default heuristic lifetime in seconds when `Last-Modified` is unavailable
pub const DEFAULT_HEURISTIC_LIFETIME_SECS: i64 = 0;

// =============================================================================
// Cache-Control directive names
// =============================================================================

pub const MAX_AGE: &str = "max-age";
pub const S_MAXAGE: &str = "s-maxage";
pub const MUST_REVALIDATE: &str = "must-revalidate";
pub const PROXY_REVALIDATE: &str = "proxy-revalidate";
pub const STALE_WHILE_REVALIDATE: &str = "stale-while-revalidate";
pub const STALE_IF_ERROR: &str = "stale-if-error";
