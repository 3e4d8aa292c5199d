// Request coalescing tests against the public API

use staleguard::config::CoalescingConfig;
use staleguard::request_coalescing::{CoalescingError, RequestCoalescer, SingleFlight};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[derive(Debug)]
struct OriginDown;

impl std::fmt::Display for OriginDown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "origin unavailable")
    }
}

impl std::error::Error for OriginDown {}

/// Run `get()` from `threads` threads released together and collect outcomes.
fn race<T, E>(
    flight: &Arc<SingleFlight<T, E>>,
    threads: usize,
) -> Vec<Result<Arc<T>, CoalescingError<E>>>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let flight = Arc::clone(flight);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                flight.get()
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn test_single_caller_receives_result_once() {
    let flight: SingleFlight<Vec<u8>, OriginDown> = SingleFlight::new(|| Ok(b"payload".to_vec()));
    assert!(!flight.is_finished());
    assert_eq!(flight.get().unwrap().as_slice(), b"payload");
    assert!(flight.is_finished());
}

#[test]
fn test_finished_coordinator_always_too_late() {
    let runs = Arc::new(AtomicUsize::new(0));
    let runs_clone = Arc::clone(&runs);
    let flight: SingleFlight<u32, OriginDown> = SingleFlight::new(move || {
        runs_clone.fetch_add(1, Ordering::SeqCst);
        Ok(1)
    });

    flight.get().unwrap();
    for _ in 0..3 {
        assert!(matches!(flight.get(), Err(CoalescingError::TooLate)));
    }
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_two_concurrent_callers_share_identical_result() {
    let runs = Arc::new(AtomicUsize::new(0));
    let runs_clone = Arc::clone(&runs);
    let flight: Arc<SingleFlight<String, OriginDown>> = Arc::new(SingleFlight::new(move || {
        thread::sleep(Duration::from_millis(50));
        runs_clone.fetch_add(1, Ordering::SeqCst);
        Ok("revalidated".to_string())
    }));

    let outcomes = race(&flight, 2);
    let first = outcomes[0].as_ref().unwrap();
    let second = outcomes[1].as_ref().unwrap();

    assert!(Arc::ptr_eq(first, second));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failure_is_broadcast_to_all_waiters() {
    let flight: Arc<SingleFlight<String, OriginDown>> = Arc::new(SingleFlight::new(|| {
        thread::sleep(Duration::from_millis(50));
        Err(OriginDown)
    }));

    let outcomes = race(&flight, 3);
    let errors: Vec<Arc<OriginDown>> = outcomes
        .into_iter()
        .map(|outcome| match outcome {
            Err(CoalescingError::Failed(err)) => err,
            other => panic!("Expected Failed, got {:?}", other),
        })
        .collect();

    for err in &errors[1..] {
        assert!(Arc::ptr_eq(&errors[0], err));
    }
    assert!(flight.is_finished());
}

#[test]
fn test_panic_does_not_strand_waiters() {
    let flight: Arc<SingleFlight<String, OriginDown>> = Arc::new(SingleFlight::new(|| {
        thread::sleep(Duration::from_millis(50));
        panic!("computation bug")
    }));

    for outcome in race(&flight, 3) {
        assert!(matches!(outcome, Err(CoalescingError::Panicked(_))));
    }
}

#[test]
fn test_coalescer_collapses_concurrent_callers_per_key() {
    let coalescer: RequestCoalescer<String, u64, OriginDown> =
        RequestCoalescer::new(&CoalescingConfig::default());
    let fetches = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(5));

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let coalescer = coalescer.clone();
            let fetches = Arc::clone(&fetches);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                coalescer.get("https://example.com/a".to_string(), move || {
                    thread::sleep(Duration::from_millis(50));
                    Ok(fetches.fetch_add(1, Ordering::SeqCst) as u64)
                })
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(*handle.join().unwrap().unwrap(), 0);
    }
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(coalescer.in_flight_count(), 0);
}

#[test]
fn test_coalescer_new_window_after_completion() {
    let coalescer: RequestCoalescer<&'static str, usize, OriginDown> = RequestCoalescer::default();
    let fetches = Arc::new(AtomicUsize::new(0));

    for expected in 0..3 {
        let fetches = Arc::clone(&fetches);
        let value = coalescer
            .get("key", move || Ok(fetches.fetch_add(1, Ordering::SeqCst)))
            .unwrap();
        assert_eq!(*value, expected);
    }
}
