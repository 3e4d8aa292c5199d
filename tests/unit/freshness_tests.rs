// Validity engine tests against the public API

use http::header::CACHE_CONTROL;
use http::{HeaderMap, HeaderValue, StatusCode};
use staleguard::cache::freshness::*;
use staleguard::cache::{CacheEntrySnapshot, Freshness, FreshnessPolicy};
use staleguard::constants::MAX_AGE_SENTINEL;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_650_000_000 + secs)
}

/// Response received at `at(0)` carrying a matching `Date` plus `extra` headers.
fn response(extra: &[(&'static str, &str)]) -> CacheEntrySnapshot {
    let mut builder = http::Response::builder()
        .status(StatusCode::OK)
        .header("date", httpdate::fmt_http_date(at(0)));
    for (name, value) in extra {
        builder = builder.header(*name, *value);
    }
    let (parts, _) = builder.body(()).unwrap().into_parts();
    CacheEntrySnapshot::from_response_parts(at(0), at(0), &parts)
}

#[test]
fn test_current_age_equals_resident_time_without_age_header() {
    let snap = response(&[]);
    for elapsed in [0, 1, 59, 3600] {
        assert_eq!(current_age_secs(&snap, at(elapsed)), elapsed as i64);
    }
}

#[test]
fn test_staleness_matches_definition() {
    let snap = response(&[("cache-control", "max-age=100"), ("age", "20")]);
    for elapsed in [0, 50, 80, 81, 500] {
        let now = at(elapsed);
        let expected = (current_age_secs(&snap, now) - freshness_lifetime_secs(&snap)).max(0);
        assert_eq!(staleness_secs(&snap, now), expected);
    }
}

#[test]
fn test_minimum_of_max_age_and_s_maxage_wins() {
    let snap = response(&[("cache-control", "max-age=60, s-maxage=30")]);
    assert_eq!(freshness_lifetime_secs(&snap), 30);
}

#[test]
fn test_mixed_case_max_age_falls_back_to_expires() {
    let expires = httpdate::fmt_http_date(at(10));
    let snap = response(&[("cache-control", "Max-Age=600"), ("expires", expires.as_str())]);
    assert_eq!(freshness_lifetime_secs(&snap), 10);
    assert!(!is_fresh(&snap, at(10)));
}

#[test]
fn test_opaque_cache_control_bytes_keep_max_age() {
    let mut headers = HeaderMap::new();
    headers.insert("date", HeaderValue::from_str(&httpdate::fmt_http_date(at(0))).unwrap());
    headers.append(
        CACHE_CONTROL,
        HeaderValue::from_bytes(b"max-age=60, ext=\"\xff\"").unwrap(),
    );
    let snap = CacheEntrySnapshot::new(at(0), at(0), StatusCode::OK, headers);
    assert_eq!(freshness_lifetime_secs(&snap), 60);
}

#[test]
fn test_unparseable_max_age_is_zero() {
    let snap = response(&[("cache-control", "max-age=abc")]);
    assert_eq!(freshness_lifetime_secs(&snap), 0);
    assert!(!is_fresh(&snap, at(0)));
}

#[test]
fn test_stale_while_revalidate_thresholds() {
    let snap = response(&[("cache-control", "max-age=0, stale-while-revalidate=120")]);
    assert_eq!(staleness_secs(&snap, at(100)), 100);
    assert!(may_return_stale_while_revalidating(&snap, at(100)));
    assert_eq!(staleness_secs(&snap, at(150)), 150);
    assert!(!may_return_stale_while_revalidating(&snap, at(150)));
}

#[test]
fn test_heuristic_lifetime_examples() {
    let older = httpdate::fmt_http_date(at(0) - Duration::from_secs(100));
    let snap = response(&[("last-modified", older.as_str())]);
    assert_eq!(heuristic_freshness_lifetime_secs(&snap, 0.1, 0), 10);

    let newer = httpdate::fmt_http_date(at(100));
    let snap = response(&[("last-modified", newer.as_str())]);
    assert_eq!(heuristic_freshness_lifetime_secs(&snap, 0.1, 500), 0);
}

#[test]
fn test_single_malformed_age_forces_maximal_age() {
    let snap = response(&[("age", "5"), ("age", "five")]);
    assert_eq!(current_age_secs(&snap, at(0)), MAX_AGE_SENTINEL);
    assert!(!is_fresh(&snap, at(0)));
}

#[test]
fn test_stale_if_error_either_source() {
    let snap = response(&[("cache-control", "max-age=10"), ("cache-control", "stale-if-error=30")]);
    assert!(may_return_stale_if_error(&snap, &HeaderMap::new(), at(40)));
    assert!(!may_return_stale_if_error(&snap, &HeaderMap::new(), at(41)));

    let mut request = HeaderMap::new();
    request.append(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    request.append(CACHE_CONTROL, HeaderValue::from_static("stale-if-error=3600"));
    assert!(may_return_stale_if_error(&snap, &request, at(41)));
}

#[test]
fn test_engine_is_shareable_across_threads() {
    let snap = std::sync::Arc::new(response(&[("cache-control", "max-age=60")]));
    let handles: Vec<_> = (0..4u64)
        .map(|i| {
            let snap = std::sync::Arc::clone(&snap);
            std::thread::spawn(move || is_fresh(&snap, at(i * 30)))
        })
        .collect();
    let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec![true, true, false, false]);
}

#[test]
fn test_policy_walkthrough() {
    let policy = FreshnessPolicy::default();
    let snap = response(&[
        ("cache-control", "max-age=60, stale-while-revalidate=60"),
        ("etag", "\"abc\""),
    ]);

    assert_eq!(policy.evaluate(&snap, at(10)), Freshness::Fresh);
    assert_eq!(policy.evaluate(&snap, at(90)), Freshness::StaleWhileRevalidate);
    assert_eq!(
        policy.evaluate(&snap, at(200)),
        Freshness::Stale {
            revalidatable: true
        }
    );
}
