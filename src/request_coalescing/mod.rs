// Request Coalescing Module
//
// Collapses concurrent revalidations/fetches for the same cache entry into a
// single execution:
// - First caller (executor): runs the computation on its own thread, publishes the result
// - Concurrent callers (waiters): block until the executor publishes, then share the result
// - Late callers: a finished coordinator refuses them with `TooLate`
//
// `RequestCoalescer` keeps one open coordinator per key and opens a new
// collapsing window once the previous one has finished.

mod error;

pub use error::CoalescingError;

use crate::config::CoalescingConfig;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

type Computation<T, E> = Box<dyn FnOnce() -> Result<T, E> + Send>;
type Outcome<T, E> = Result<Arc<T>, CoalescingError<E>>;

/// Lifecycle of a [`SingleFlight`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightState {
    /// Nobody has called `get()` yet
    NotStarted,
    /// The executor is running the computation
    Running,
    /// The one permitted execution completed (successfully or not). Terminal.
    Finished,
}

enum Slot<T, E> {
    NotStarted(Computation<T, E>),
    Running,
    Finished(Outcome<T, E>),
}

impl<T, E> Slot<T, E> {
    fn state(&self) -> FlightState {
        match self {
            Slot::NotStarted(_) => FlightState::NotStarted,
            Slot::Running => FlightState::Running,
            Slot::Finished(_) => FlightState::Finished,
        }
    }
}

/// One-shot, multi-waiter execution barrier around a computation.
///
/// The first `get()` runs the computation; callers arriving while it runs
/// block and receive the same `Arc<T>` (or the same error). Once finished,
/// every further `get()` fails with [`CoalescingError::TooLate`]; a caller that
/// needs another execution must create a new coordinator.
pub struct SingleFlight<T, E> {
    slot: Mutex<Slot<T, E>>,
    finished: Condvar,
}

impl<T, E> SingleFlight<T, E> {
    /// Wrap `computation`. Nothing runs until the first `get()`.
    pub fn new<F>(computation: F) -> Self
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        Self {
            slot: Mutex::new(Slot::NotStarted(Box::new(computation))),
            finished: Condvar::new(),
        }
    }

    /// Run the computation, or wait for the running one, and return its outcome.
    ///
    /// # Errors
    ///
    /// - [`CoalescingError::TooLate`] if the execution had already finished when called
    /// - [`CoalescingError::Failed`] if the computation returned an error
    /// - [`CoalescingError::Panicked`] if the computation panicked
    pub fn get(&self) -> Outcome<T, E> {
        let mut slot = self.slot.lock();
        let mut waited = false;

        let computation = loop {
            match &*slot {
                Slot::Finished(outcome) if waited => return outcome.clone(),
                Slot::Finished(_) => return Err(CoalescingError::TooLate),
                Slot::Running => {
                    waited = true;
                    self.finished.wait(&mut slot);
                }
                Slot::NotStarted(_) => match std::mem::replace(&mut *slot, Slot::Running) {
                    Slot::NotStarted(computation) => break computation,
                    other => *slot = other,
                },
            }
        };

        // Run without holding the lock so waiters can queue up on the condvar.
        drop(slot);
        tracing::debug!("Single-flight executor started");
        let outcome = Self::execute(computation);

        *self.slot.lock() = Slot::Finished(outcome.clone());
        self.finished.notify_all();
        tracing::debug!(success = outcome.is_ok(), "Single-flight execution finished");

        outcome
    }

    fn execute(computation: Computation<T, E>) -> Outcome<T, E> {
        match panic::catch_unwind(AssertUnwindSafe(computation)) {
            Ok(Ok(value)) => Ok(Arc::new(value)),
            Ok(Err(err)) => Err(CoalescingError::Failed(Arc::new(err))),
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::warn!(panic = %message, "Single-flight computation panicked");
                Err(CoalescingError::Panicked(message))
            }
        }
    }

    /// Whether the single execution has completed. Never blocks on the computation.
    pub fn is_finished(&self) -> bool {
        self.state() == FlightState::Finished
    }

    /// Current lifecycle state
    pub fn state(&self) -> FlightState {
        self.slot.lock().state()
    }
}

impl<T, E> fmt::Debug for SingleFlight<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlight")
            .field("state", &self.state())
            .finish()
    }
}

/// Keyed registry of collapsing windows.
///
/// Hands every caller for a key the same open [`SingleFlight`] and replaces
/// it with a new one after it finishes. With coalescing disabled, every
/// caller gets a private coordinator.
pub struct RequestCoalescer<K, T, E> {
    enabled: bool,
    in_flight: Arc<Mutex<HashMap<K, Arc<SingleFlight<T, E>>>>>,
}

impl<K, T, E> RequestCoalescer<K, T, E>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    pub fn new(config: &CoalescingConfig) -> Self {
        Self {
            enabled: config.enabled,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Coordinator for `key`: the open one if any, otherwise a new window
    /// running `computation`.
    pub fn flight<F>(&self, key: K, computation: F) -> Arc<SingleFlight<T, E>>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        if !self.enabled {
            return Arc::new(SingleFlight::new(computation));
        }

        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|_, flight| !flight.is_finished());

        if let Some(flight) = in_flight.get(&key) {
            tracing::debug!(key = ?key, "Joining in-flight request");
            return Arc::clone(flight);
        }

        tracing::debug!(key = ?key, "Opening new collapsing window");
        let flight = Arc::new(SingleFlight::new(computation));
        in_flight.insert(key, Arc::clone(&flight));
        flight
    }

    /// Join or start the window for `key` and return its outcome.
    ///
    /// A window that closes between lookup and join is retried with a new
    /// one, so this never returns [`CoalescingError::TooLate`].
    pub fn get<F>(&self, key: K, computation: F) -> Outcome<T, E>
    where
        F: FnOnce() -> Result<T, E> + Clone + Send + 'static,
    {
        loop {
            let flight = self.flight(key.clone(), computation.clone());
            match flight.get() {
                Err(err) if err.is_too_late() => {
                    tracing::warn!(key = ?key, "Collapsing window closed before join, retrying");
                }
                outcome => return outcome,
            }
        }
    }

    /// Number of windows that have not finished yet
    pub fn in_flight_count(&self) -> usize {
        self.in_flight
            .lock()
            .values()
            .filter(|flight| !flight.is_finished())
            .count()
    }
}

impl<K, T, E> Clone for RequestCoalescer<K, T, E> {
    fn clone(&self) -> Self {
        Self {
            enabled: self.enabled,
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<K, T, E> Default for RequestCoalescer<K, T, E>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn default() -> Self {
        Self::new(&CoalescingConfig::default())
    }
}

impl<K, T, E> fmt::Debug for RequestCoalescer<K, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCoalescer")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
