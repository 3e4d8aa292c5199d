//! Cache validity engine.
//!
//! Pure age and freshness arithmetic over a [`CacheEntrySnapshot`],
//! following the corrected-age algorithm of RFC 2616 §13.2.3 / RFC 7234 §4.2.3.
//! Nothing here keeps state between calls, so every function is safe to
//! call concurrently against shared snapshots.
//!
//! Malformed header values never produce errors. Each query degrades to a
//! documented conservative answer instead:
//! - missing or unparseable `Date`: apparent age is [`MAX_AGE_SENTINEL`]
//! - malformed or negative `Age`: that header counts as [`MAX_AGE_SENTINEL`]
//! - malformed `max-age` / `s-maxage`: that directive counts as `0`
//! - malformed `stale-while-revalidate` / `stale-if-error`: the directive is skipped
//!
//! All results are whole seconds. Time differences are truncated toward zero.

use super::control::{directives, Directive};
use super::entry::CacheEntrySnapshot;
use crate::constants::{
    MAX_AGE, MAX_AGE_SENTINEL, MUST_REVALIDATE, PROXY_REVALIDATE, STALE_IF_ERROR,
    STALE_WHILE_REVALIDATE, S_MAXAGE,
};
use http::header::{AGE, ETAG, LAST_MODIFIED};
use http::HeaderMap;
use std::time::SystemTime;

/// Signed whole seconds from `earlier` to `later`, truncated toward zero.
fn secs_between(later: SystemTime, earlier: SystemTime) -> i64 {
    match later.duration_since(earlier) {
        Ok(elapsed) => i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX),
        Err(err) => i64::try_from(err.duration().as_secs()).map_or(i64::MIN, |secs| -secs),
    }
}

fn apparent_age_secs(snapshot: &CacheEntrySnapshot) -> i64 {
    match snapshot.date() {
        Some(date) => secs_between(snapshot.response_received_at(), date).max(0),
        None => MAX_AGE_SENTINEL,
    }
}

/// Largest `Age` value; any malformed or negative header forces the sentinel.
fn age_value_secs(snapshot: &CacheEntrySnapshot) -> i64 {
    snapshot
        .headers()
        .get_all(AGE)
        .iter()
        .map(|value| {
            value
                .to_str()
                .ok()
                .and_then(|text| text.trim().parse::<i64>().ok())
                .filter(|age| *age >= 0)
                .unwrap_or(MAX_AGE_SENTINEL)
        })
        .fold(0, i64::max)
}

fn corrected_initial_age_secs(snapshot: &CacheEntrySnapshot) -> i64 {
    let corrected_received_age = apparent_age_secs(snapshot).max(age_value_secs(snapshot));
    let response_delay = secs_between(snapshot.response_received_at(), snapshot.request_sent_at());
    corrected_received_age.saturating_add(response_delay)
}

fn resident_time_secs(snapshot: &CacheEntrySnapshot, now: SystemTime) -> i64 {
    secs_between(now, snapshot.response_received_at())
}

/// Current age of the entry at `now`.
///
/// `now` should not be earlier than the response receipt time. If it is,
/// the resident time goes negative rather than being clamped.
pub fn current_age_secs(snapshot: &CacheEntrySnapshot, now: SystemTime) -> i64 {
    corrected_initial_age_secs(snapshot).saturating_add(resident_time_secs(snapshot, now))
}

/// Smallest `max-age` / `s-maxage` across all `Cache-Control` headers.
///
/// Names must match exactly; `Max-Age` is not a lifetime directive here.
/// An unparseable value counts as `0`.
fn explicit_max_age_secs(snapshot: &CacheEntrySnapshot) -> Option<i64> {
    directives(snapshot.headers())
        .filter(|d| d.is_exact(MAX_AGE) || d.is_exact(S_MAXAGE))
        .map(|d| d.value().and_then(|v| v.parse::<i64>().ok()).unwrap_or(0))
        .min()
}

/// Freshness lifetime granted by the origin.
///
/// `max-age` and `s-maxage` are treated alike and the minimum wins. Without
/// them, `Expires - Date` is used, which may be negative. Anything else
/// yields `0`.
pub fn freshness_lifetime_secs(snapshot: &CacheEntrySnapshot) -> i64 {
    if let Some(max_age) = explicit_max_age_secs(snapshot) {
        return max_age;
    }

    match (snapshot.date(), snapshot.expires()) {
        (Some(date), Some(expires)) => secs_between(expires, date),
        _ => 0,
    }
}

/// Whether the origin supplied any explicit freshness information:
/// a `max-age`/`s-maxage` directive, or both a valid `Date` and `Expires`.
pub fn has_explicit_freshness(snapshot: &CacheEntrySnapshot) -> bool {
    explicit_max_age_secs(snapshot).is_some()
        || (snapshot.date().is_some() && snapshot.expires().is_some())
}

pub fn is_fresh(snapshot: &CacheEntrySnapshot, now: SystemTime) -> bool {
    current_age_secs(snapshot, now) < freshness_lifetime_secs(snapshot)
}

/// Seconds past the freshness lifetime; `0` while fresh.
pub fn staleness_secs(snapshot: &CacheEntrySnapshot, now: SystemTime) -> i64 {
    current_age_secs(snapshot, now)
        .saturating_sub(freshness_lifetime_secs(snapshot))
        .max(0)
}

/// Estimated lifetime for responses without explicit freshness.
///
/// With both `Date` and `Last-Modified`, returns
/// `coefficient * (Date - Last-Modified)`, floored at `0` when the
/// modification time is after `Date`. Otherwise returns `default_lifetime`.
///
/// This is never substituted for [`freshness_lifetime_secs`] automatically.
pub fn heuristic_freshness_lifetime_secs(
    snapshot: &CacheEntrySnapshot,
    coefficient: f32,
    default_lifetime: i64,
) -> i64 {
    match (snapshot.date(), snapshot.last_modified()) {
        (Some(date), Some(last_modified)) => {
            let since_modified = secs_between(date, last_modified);
            if since_modified < 0 {
                return 0;
            }
            (coefficient * since_modified as f32) as i64
        }
        _ => default_lifetime,
    }
}

pub fn is_heuristically_fresh(
    snapshot: &CacheEntrySnapshot,
    now: SystemTime,
    coefficient: f32,
    default_lifetime: i64,
) -> bool {
    current_age_secs(snapshot, now)
        < heuristic_freshness_lifetime_secs(snapshot, coefficient, default_lifetime)
}

/// Whether a conditional request could revalidate the entry.
pub fn is_revalidatable(snapshot: &CacheEntrySnapshot) -> bool {
    snapshot.has_header(ETAG) || snapshot.has_header(LAST_MODIFIED)
}

/// Whether any `Cache-Control` header carries `name`, ignoring case and value.
pub fn has_cache_control_directive(snapshot: &CacheEntrySnapshot, name: &str) -> bool {
    directives(snapshot.headers()).any(|d| d.is(name))
}

pub fn must_revalidate(snapshot: &CacheEntrySnapshot) -> bool {
    has_cache_control_directive(snapshot, MUST_REVALIDATE)
}

pub fn proxy_revalidate(snapshot: &CacheEntrySnapshot) -> bool {
    has_cache_control_directive(snapshot, PROXY_REVALIDATE)
}

/// True if some `name` directive in `headers` allows `staleness` seconds.
///
/// Values that do not parse as a 32-bit integer are skipped.
fn any_allows(headers: &HeaderMap, name: &str, staleness: i64) -> bool {
    directives(headers)
        .filter(|d: &Directive<'_>| d.is(name))
        .filter_map(|d| d.value().and_then(|v| v.parse::<i32>().ok()))
        .any(|allowed| staleness <= i64::from(allowed))
}

/// Whether the stale entry may be served while a revalidation runs.
pub fn may_return_stale_while_revalidating(snapshot: &CacheEntrySnapshot, now: SystemTime) -> bool {
    any_allows(
        snapshot.headers(),
        STALE_WHILE_REVALIDATE,
        staleness_secs(snapshot, now),
    )
}

/// Whether the stale entry may be served because fetching failed.
///
/// `stale-if-error` is honoured from the request's own headers and from the
/// stored response independently.
pub fn may_return_stale_if_error(
    snapshot: &CacheEntrySnapshot,
    request_headers: &HeaderMap,
    now: SystemTime,
) -> bool {
    let staleness = staleness_secs(snapshot, now);
    any_allows(request_headers, STALE_IF_ERROR, staleness)
        || any_allows(snapshot.headers(), STALE_IF_ERROR, staleness)
}
