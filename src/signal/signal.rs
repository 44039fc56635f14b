use crate::runtime::Runtime;
use crate::sync::{read, write};
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

/// A reactive value that re-runs the effects reading it when it changes.
///
/// A signal belongs to the runtime that was current when it was created.
/// Clones share the same value.
#[derive(Clone)]
pub struct Signal<T> {
    value: Arc<RwLock<T>>,
    id: usize,
    runtime: Weak<Runtime>,
}

impl<T: Clone + Send + Sync + 'static> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(initial: T) -> Self {
        Self::new_in(&Runtime::current(), initial)
    }

    /// Create a signal owned by `runtime` rather than the current one.
    pub(crate) fn new_in(runtime: &Arc<Runtime>, initial: T) -> Self {
        Self {
            value: Arc::new(RwLock::new(initial)),
            id: runtime.next_id(),
            runtime: Arc::downgrade(runtime),
        }
    }

    /// Get the current value of the signal.
    pub fn get(&self) -> T {
        self.track();
        read(&self.value).clone()
    }

    /// Read the value with a function without cloning.
    ///
    /// The value is read-locked while `f` runs, so `f` must not write to this
    /// signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        let value = read(&self.value);
        f(&*value)
    }

    /// Read the value without registering a dependency.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = read(&self.value);
        f(&*value)
    }

    /// Set a new value and re-run dependent effects.
    pub fn set(&self, new_value: T) {
        *write(&self.value) = new_value;
        self.notify();
    }

    /// Update the value in place and re-run dependent effects.
    ///
    /// The value is write-locked while `f` runs; `f` must not touch this
    /// signal.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        {
            let mut value = write(&self.value);
            f(&mut *value);
        }
        self.notify();
    }

    /// Get the signal's unique id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// A handle that does not keep the value alive.
    pub fn downgrade(&self) -> WeakSignal<T> {
        WeakSignal {
            value: Arc::downgrade(&self.value),
            id: self.id,
            runtime: self.runtime.clone(),
        }
    }

    fn track(&self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.track_read(self.id);
        }
    }

    fn notify(&self) {
        // The value lock is released before any effect runs.
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.notify_observers(self.id);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("value", &*read(&self.value))
            .finish()
    }
}

/// A non-owning [`Signal`] handle.
pub struct WeakSignal<T> {
    value: Weak<RwLock<T>>,
    id: usize,
    runtime: Weak<Runtime>,
}

impl<T> WeakSignal<T> {
    /// Recover the signal if its value is still alive.
    pub fn upgrade(&self) -> Option<Signal<T>> {
        self.value.upgrade().map(|value| Signal {
            value,
            id: self.id,
            runtime: self.runtime.clone(),
        })
    }
}

impl<T> Clone for WeakSignal<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            id: self.id,
            runtime: self.runtime.clone(),
        }
    }
}

impl<T> fmt::Debug for WeakSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakSignal").field("id", &self.id).finish()
    }
}

/// Read half of a signal created by [`create_signal`].
#[derive(Clone, Debug)]
pub struct ReadSignal<T>(Signal<T>);

impl<T: Clone + Send + Sync + 'static> ReadSignal<T> {
    /// Get the current value.
    pub fn get(&self) -> T {
        self.0.get()
    }

    /// Read the value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.0.with(f)
    }
}

/// Write half of a signal created by [`create_signal`].
#[derive(Clone, Debug)]
pub struct WriteSignal<T>(Signal<T>);

impl<T: Clone + Send + Sync + 'static> WriteSignal<T> {
    /// Set a new value.
    pub fn set(&self, new_value: T) {
        self.0.set(new_value);
    }

    /// Update the value in place.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.0.update(f);
    }
}

/// Create a signal split into read and write halves.
///
/// # Example
///
/// ```
/// use partyline::create_signal;
///
/// let (count, set_count) = create_signal(0);
/// set_count.update(|n| *n += 2);
/// assert_eq!(count.get(), 2);
/// ```
pub fn create_signal<T>(initial: T) -> (ReadSignal<T>, WriteSignal<T>)
where
    T: Clone + Send + Sync + 'static,
{
    let signal = Signal::new(initial);
    (ReadSignal(signal.clone()), WriteSignal(signal))
}
