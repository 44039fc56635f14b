use crate::runtime::Runtime;
use std::fmt;
use std::sync::{Arc, Weak};

/// A side effect that re-runs when the signals it reads change.
///
/// The effect runs immediately on creation to collect its dependencies and
/// re-collects them on every run. It stops when dropped. An effect is how a
/// component re-renders: read bindings inside it and it runs again whenever a
/// broadcast changes them.
///
/// # Examples
///
/// ```
/// use partyline::{Effect, Signal};
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
///
/// let count = Signal::new(0);
/// let runs = Arc::new(AtomicUsize::new(0));
/// let runs_clone = runs.clone();
///
/// let effect = Effect::new({
///     let count = count.clone();
///     move || {
///         let _ = count.get();
///         runs_clone.fetch_add(1, Ordering::SeqCst);
///     }
/// });
/// assert_eq!(runs.load(Ordering::SeqCst), 1);
///
/// count.set(1);
/// assert_eq!(runs.load(Ordering::SeqCst), 2);
///
/// drop(effect);
/// count.set(2);
/// assert_eq!(runs.load(Ordering::SeqCst), 2);
/// ```
pub struct Effect {
    id: usize,
    runtime: Weak<Runtime>,
}

impl Effect {
    /// Create an effect in the current runtime and run it once.
    pub fn new<F>(effect: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let runtime = Runtime::current();
        let id = runtime.next_id();

        runtime.register_observer(id, Arc::new(effect));
        runtime.run_observer(id);

        Self {
            id,
            runtime: Arc::downgrade(&runtime),
        }
    }

    /// Run the effect again now, re-collecting its dependencies.
    pub fn run(&self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.run_observer(self.id);
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect").field("id", &self.id).finish()
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.remove_observer(self.id);
        }
    }
}

/// Create a new effect that runs when dependencies change.
///
/// Keep the returned [`Effect`] alive for as long as it should react.
#[must_use = "the effect stops as soon as it is dropped"]
pub fn create_effect<F>(effect: F) -> Effect
where
    F: Fn() + Send + Sync + 'static,
{
    Effect::new(effect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Signal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn effect_runs_immediately() {
        Runtime::scope(|| {
            let counter = Arc::new(AtomicUsize::new(0));
            let counter_clone = counter.clone();

            let _effect = create_effect(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            });

            assert_eq!(counter.load(Ordering::SeqCst), 1);
        });
    }

    #[test]
    fn dependencies_are_recollected_each_run() {
        Runtime::scope(|| {
            let use_left = Signal::new(true);
            let left = Signal::new("left");
            let right = Signal::new("right");
            let seen = Arc::new(Mutex::new(Vec::new()));

            let _effect = Effect::new({
                let (use_left, left, right, seen) =
                    (use_left.clone(), left.clone(), right.clone(), seen.clone());
                move || {
                    let value = if use_left.get() { left.get() } else { right.get() };
                    seen.lock().unwrap().push(value);
                }
            });

            use_left.set(false);
            // No longer read, so no re-run.
            left.set("stale");
            right.set("fresh");

            assert_eq!(*seen.lock().unwrap(), vec!["left", "right", "fresh"]);
        });
    }

    #[test]
    fn effects_run_in_creation_order() {
        Runtime::scope(|| {
            let source = Signal::new(0);
            let order = Arc::new(Mutex::new(Vec::new()));

            let effects: Vec<Effect> = ["a", "b", "c"]
                .into_iter()
                .map(|tag| {
                    let (source, order) = (source.clone(), order.clone());
                    Effect::new(move || {
                        source.get();
                        order.lock().unwrap().push(tag);
                    })
                })
                .collect();

            order.lock().unwrap().clear();
            source.set(1);
            assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
            drop(effects);
        });
    }

    #[test]
    fn effect_writing_what_it_reads_settles() {
        Runtime::scope(|| {
            let count = Signal::new(0i32);
            let seen = Arc::new(Mutex::new(Vec::new()));

            let _clamp = Effect::new({
                let (count, seen) = (count.clone(), seen.clone());
                move || {
                    let value = count.get();
                    seen.lock().unwrap().push(value);
                    if value < 0 {
                        count.set(0);
                    }
                }
            });

            count.set(-5);
            assert_eq!(count.get(), 0);
            assert_eq!(*seen.lock().unwrap(), vec![0, -5, 0]);
        });
    }

    #[test]
    fn effect_recovers_after_a_panicking_run() {
        Runtime::scope(|| {
            let source = Signal::new(0);
            let unrelated = Signal::new(0);
            let runs = Arc::new(AtomicUsize::new(0));

            let _effect = Effect::new({
                let (source, runs) = (source.clone(), runs.clone());
                move || {
                    runs.fetch_add(1, Ordering::SeqCst);
                    if source.get() == 1 {
                        panic!("render failed");
                    }
                }
            });

            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| source.set(1)));
            assert!(result.is_err());

            // Reads outside the effect are no longer attributed to it.
            unrelated.get();
            unrelated.set(1);
            assert_eq!(runs.load(Ordering::SeqCst), 2);

            source.set(2);
            assert_eq!(runs.load(Ordering::SeqCst), 3);
        });
    }
}
