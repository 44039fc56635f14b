use super::{Config, Reconcile};
use crate::bus::EventBus;
use crate::error::{Error, Result};
use crate::sync::lock;
use log::{trace, warn};
use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

type ObserverFn = Arc<dyn Fn() + Send + Sync>;

/// Passes an observer may take in one run before it is considered runaway.
const MAX_OBSERVER_PASSES: usize = 100;

/// Dependency graph between signals and the effects that read them.
#[derive(Default)]
struct ReactiveGraph {
    current_observer: Option<usize>,
    // signal id -> observers that read it
    dependencies: HashMap<usize, BTreeSet<usize>>,
    // observer id -> signals it read on its last run
    observer_deps: HashMap<usize, BTreeSet<usize>>,
    observers: HashMap<usize, ObserverFn>,
    running: BTreeSet<usize>,
    // running observers that were notified again mid-run
    pending: BTreeSet<usize>,
}

impl ReactiveGraph {
    fn untrack(&mut self, observer_id: usize) {
        if let Some(old_deps) = self.observer_deps.remove(&observer_id) {
            for signal_id in old_deps {
                if let Some(deps) = self.dependencies.get_mut(&signal_id) {
                    deps.remove(&observer_id);
                    if deps.is_empty() {
                        self.dependencies.remove(&signal_id);
                    }
                }
            }
        }
    }
}

/// What a runtime remembers about one channel key.
struct KeyRecord {
    type_id: TypeId,
    type_name: &'static str,
    // live bindings holding the claim
    mounts: usize,
    last: Option<Arc<dyn Any + Send + Sync>>,
}

impl KeyRecord {
    fn new<T: Any>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            mounts: 0,
            last: None,
        }
    }
}

/// Marks an observer as running; clears the mark even if the observer panics.
struct RunningGuard<'a> {
    runtime: &'a Runtime,
    observer_id: usize,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        let mut graph = lock(&self.runtime.graph);
        graph.running.remove(&self.observer_id);
        graph.pending.remove(&self.observer_id);
    }
}

/// Restores the previous current observer, even on unwind.
struct ObserverScope<'a> {
    runtime: &'a Runtime,
    prev: Option<usize>,
}

impl Drop for ObserverScope<'_> {
    fn drop(&mut self) {
        lock(&self.runtime.graph).current_observer = self.prev;
    }
}

/// Execution context for shared-value channels.
///
/// A runtime owns the broadcast medium ([`EventBus`]) every binding listens
/// on, the reactive graph that re-runs effects when a binding changes, and a
/// record of which value type each key carries.
///
/// One ambient runtime exists per process and is used whenever no scoped
/// runtime is active. Scoped runtimes give tests and embedders full
/// isolation.
///
/// # Examples
///
/// ```
/// use partyline::runtime::Runtime;
/// use partyline::bind;
///
/// Runtime::scope(|| {
///     let (a, _) = bind("count", 0).unwrap();
///     let (_mounted, set_b) = bind("count", 0).unwrap();
///     set_b.set(3);
///     assert_eq!(a.get(), 3);
/// });
/// // The runtime, its bus and its key records are dropped here
/// ```
pub struct Runtime {
    next_id: AtomicUsize,
    config: Config,
    bus: Arc<EventBus>,
    graph: Mutex<ReactiveGraph>,
    keys: Mutex<HashMap<String, KeyRecord>>,
}

thread_local! {
    static RUNTIME_STACK: RefCell<Vec<Arc<Runtime>>> = const { RefCell::new(Vec::new()) };
}

impl Runtime {
    /// Create a new isolated runtime with the default configuration.
    pub fn new() -> Arc<Self> {
        Self::with_config(Config::default())
    }

    /// Create a new isolated runtime.
    pub fn with_config(config: Config) -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicUsize::new(0),
            config,
            bus: Arc::new(EventBus::new()),
            graph: Mutex::new(ReactiveGraph::default()),
            keys: Mutex::new(HashMap::new()),
        })
    }

    /// Run a function with a fresh isolated runtime as the current one.
    ///
    /// Everything created inside `f` binds to that runtime. The runtime is
    /// dropped once `f` returns and nothing else holds it.
    pub fn scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        Self::with_runtime(Self::new(), f)
    }

    /// Like [`scope`](Self::scope), with an explicit configuration.
    ///
    /// ```
    /// use partyline::runtime::{Config, Reconcile, Runtime};
    /// use partyline::bind;
    ///
    /// Runtime::scope_with(Config::new().reconcile(Reconcile::LatestBroadcast), || {
    ///     let (_mounted, set) = bind("volume", 5).unwrap();
    ///     set.set(9);
    ///     let (late, _) = bind("volume", 5).unwrap();
    ///     assert_eq!(late.get(), 9);
    /// });
    /// ```
    pub fn scope_with<F, R>(config: Config, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        Self::with_runtime(Self::with_config(config), f)
    }

    /// The process-wide ambient runtime.
    ///
    /// Created on first use and never torn down.
    pub fn global() -> Arc<Self> {
        static RUNTIME: OnceLock<Arc<Runtime>> = OnceLock::new();
        Arc::clone(RUNTIME.get_or_init(Self::new))
    }

    /// The innermost scoped runtime on this thread, or the global one.
    pub fn current() -> Arc<Self> {
        RUNTIME_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .cloned()
                .unwrap_or_else(Self::global)
        })
    }

    /// Run `f` with `runtime` as the current runtime on this thread.
    ///
    /// The runtime is popped again even if `f` panics.
    pub fn with_runtime<F, R>(runtime: Arc<Self>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().push(runtime);
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    /// Forget all effects, key type claims and last-broadcast records.
    ///
    /// Bus listeners belong to live bindings and are left alone; they go
    /// away when the bindings unmount. Ids are never reused.
    pub fn clear(&self) {
        *lock(&self.graph) = ReactiveGraph::default();
        lock(&self.keys).clear();
    }

    /// This runtime's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The broadcast medium owned by this runtime.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Generate the next unique id for a signal, effect or binding.
    pub fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a read of `signal_id` by the observer currently running, if any.
    pub(crate) fn track_read(&self, signal_id: usize) {
        let mut graph = lock(&self.graph);
        if let Some(observer) = graph.current_observer {
            graph
                .dependencies
                .entry(signal_id)
                .or_default()
                .insert(observer);
            graph
                .observer_deps
                .entry(observer)
                .or_default()
                .insert(signal_id);
        }
    }

    /// Re-run every observer that read `signal_id`, in creation order.
    pub(crate) fn notify_observers(&self, signal_id: usize) {
        let observers: Vec<usize> = lock(&self.graph)
            .dependencies
            .get(&signal_id)
            .map(|obs| obs.iter().copied().collect())
            .unwrap_or_default();

        for observer_id in observers {
            self.run_observer(observer_id);
        }
    }

    /// Store an observer function under `observer_id` without running it.
    pub(crate) fn register_observer(&self, observer_id: usize, f: ObserverFn) {
        lock(&self.graph).observers.insert(observer_id, f);
    }

    /// Run a registered observer, re-tracking its dependencies from scratch.
    ///
    /// An observer notified while it is already running (it wrote a signal it
    /// reads) is not re-entered; it runs another pass once the current one
    /// returns, until a pass ends without such a write.
    pub(crate) fn run_observer(&self, observer_id: usize) {
        {
            let mut graph = lock(&self.graph);
            if graph.running.contains(&observer_id) {
                trace!("observer {observer_id} notified while running, queueing another pass");
                graph.pending.insert(observer_id);
                return;
            }
            graph.running.insert(observer_id);
        }
        let _running = RunningGuard {
            runtime: self,
            observer_id,
        };

        for _ in 0..MAX_OBSERVER_PASSES {
            let observer = {
                let mut graph = lock(&self.graph);
                graph.pending.remove(&observer_id);
                let Some(observer) = graph.observers.get(&observer_id).cloned() else {
                    return;
                };
                graph.untrack(observer_id);
                observer
            };

            self.with_observer(observer_id, || observer());

            if !lock(&self.graph).pending.contains(&observer_id) {
                return;
            }
        }
        warn!(
            "observer {observer_id} kept invalidating itself, stopped after {MAX_OBSERVER_PASSES} passes"
        );
    }

    /// Run `f` with `observer_id` as the current observer.
    pub(crate) fn with_observer<F, R>(&self, observer_id: usize, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _scope = ObserverScope {
            runtime: self,
            prev: lock(&self.graph).current_observer.replace(observer_id),
        };
        f()
    }

    /// Drop an observer and all of its dependency edges.
    pub(crate) fn remove_observer(&self, observer_id: usize) {
        let mut graph = lock(&self.graph);
        graph.observers.remove(&observer_id);
        graph.untrack(observer_id);
    }

    /// Claim `key` for values of type `T` on behalf of one new binding.
    ///
    /// The first claim wins; later claims with another type are rejected
    /// while the key has live bindings (or, under
    /// [`Reconcile::LatestBroadcast`], a remembered value).
    pub(crate) fn claim_key<T: Any>(&self, key: &str) -> Result<()> {
        let mut keys = lock(&self.keys);
        let record = keys
            .entry(key.to_string())
            .or_insert_with(KeyRecord::new::<T>);
        if record.type_id != TypeId::of::<T>() {
            return Err(Error::TypeMismatch {
                key: key.to_string(),
                expected: record.type_name,
                found: type_name::<T>(),
            });
        }
        record.mounts += 1;
        Ok(())
    }

    /// Give back one binding's claim on `key`.
    ///
    /// The record is forgotten with its last binding unless it holds a value
    /// kept for [`Reconcile::LatestBroadcast`].
    pub(crate) fn release_key(&self, key: &str) {
        let mut keys = lock(&self.keys);
        let Some(record) = keys.get_mut(key) else {
            return;
        };
        record.mounts = record.mounts.saturating_sub(1);
        if record.mounts == 0 && record.last.is_none() {
            keys.remove(key);
        }
    }

    /// Remember `value` as the latest broadcast on `key`.
    ///
    /// Only kept under [`Reconcile::LatestBroadcast`]; nothing reads it otherwise.
    pub(crate) fn record_broadcast<T: Any + Send + Sync>(&self, key: &str, value: Arc<T>) {
        if self.config.reconcile != Reconcile::LatestBroadcast {
            return;
        }
        let mut keys = lock(&self.keys);
        let record = keys
            .entry(key.to_string())
            .or_insert_with(KeyRecord::new::<T>);
        if record.type_id == TypeId::of::<T>() {
            record.last = Some(value as Arc<dyn Any + Send + Sync>);
        }
    }

    /// The latest value broadcast on `key`, if any was and it is a `T`.
    pub(crate) fn last_broadcast<T: Any + Clone>(&self, key: &str) -> Option<T> {
        lock(&self.keys)
            .get(key)
            .and_then(|record| record.last.as_ref())
            .and_then(|last| last.downcast_ref::<T>())
            .cloned()
    }

    /// Number of keys this runtime keeps a record for.
    ///
    /// A key is recorded while it has live bindings, and under
    /// [`Reconcile::LatestBroadcast`] also while a written value is remembered.
    pub fn key_count(&self) -> usize {
        lock(&self.keys).len()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("bus", &self.bus)
            .field("keys", &lock(&self.keys).len())
            .finish_non_exhaustive()
    }
}
