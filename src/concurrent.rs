use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Fixed-capacity counting semaphore that also records how many permits are
/// out at once. Every fan-out in the crate goes through one of these.
#[derive(Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// Held while a worker is inside the gate; released on drop.
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConcurrencyGate {
    /// Capacity is clamped into `1..=Semaphore::MAX_PERMITS`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn acquire(&self) -> GatePermit {
        // the semaphore is private to the gate and never closed
        let permit = self.semaphore.clone().acquire_owned().await.expect("gate semaphore closed");
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        GatePermit { _permit: permit, in_flight: self.in_flight.clone() }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of permits held at the same time since creation.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// What happened to one worker in a fan-out.
#[derive(Debug)]
pub enum TaskOutcome<T> {
    Completed { name: String, output: T },
    Failed { name: String, error: anyhow::Error },
    Panicked { name: String, message: String },
    /// Never started because the stage deadline passed first.
    Skipped { name: String },
}

impl<T> TaskOutcome<T> {
    pub fn name(&self) -> &str {
        match self {
            TaskOutcome::Completed { name, .. }
            | TaskOutcome::Failed { name, .. }
            | TaskOutcome::Panicked { name, .. }
            | TaskOutcome::Skipped { name } => name,
        }
    }
}

/// Run `fut` and turn an unwind into `Err(message)`.
pub async fn catch_panic<F, T>(fut: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(fut).catch_unwind().await.map_err(panic_message)
}

pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Keyed results shared between workers of one fan-out.
pub struct ResultCache<K, V> {
    cache: Arc<parking_lot::RwLock<ahash::AHashMap<K, V>>>,
}

impl<K: std::hash::Hash + Eq + Clone, V: Clone> ResultCache<K, V> {
    pub fn new() -> Self {
        Self { cache: Arc::new(parking_lot::RwLock::new(ahash::AHashMap::new())) }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.cache.read().get(key).cloned()
    }

    /// Insert unless the key is present; returns true when inserted.
    pub fn insert_if_absent(&self, key: K, value: V) -> bool {
        let mut guard = self.cache.write();
        if guard.contains_key(&key) {
            return false;
        }
        guard.insert(key, value);
        true
    }

    pub fn insert(&self, key: K, value: V) {
        self.cache.write().insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    pub fn snapshot(&self) -> Vec<(K, V)> {
        self.cache.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<K, V> Clone for ResultCache<K, V> {
    fn clone(&self) -> Self {
        Self { cache: self.cache.clone() }
    }
}

impl<K, V> Default for ResultCache<K, V>
where
    K: std::hash::Hash + Eq + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
