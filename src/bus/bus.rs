use super::Event;
use crate::sync::lock;
use log::trace;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

type Callback = dyn Fn(&Event) + Send + Sync;

/// Identifies a listener registered on an [`EventBus`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    name: Arc<str>,
    // Cleared on removal so an in-flight dispatch skips it.
    active: AtomicBool,
    callback: Box<Callback>,
}

/// Synchronous publish/subscribe medium for named events.
///
/// Listeners are invoked on the dispatching thread, during the
/// [`dispatch`](EventBus::dispatch) call, in the order they were registered.
/// No lock is held while a listener runs, so listeners may register, remove
/// or dispatch freely.
///
/// # Examples
///
/// ```
/// use partyline::bus::{Event, EventBus};
/// use std::sync::{Arc, Mutex};
///
/// let bus = EventBus::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// let seen_clone = seen.clone();
/// bus.add_listener("ping", move |event| {
///     seen_clone.lock().unwrap().push(*event.detail::<u32>().unwrap());
/// });
///
/// assert_eq!(bus.dispatch(&Event::new("ping", 1u32)), 1);
/// assert_eq!(bus.dispatch(&Event::new("pong", 2u32)), 0);
/// assert_eq!(*seen.lock().unwrap(), vec![1]);
/// ```
pub struct EventBus {
    next_id: AtomicU64,
    listeners: Mutex<Vec<Arc<Listener>>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Register `callback` for events named `name`.
    ///
    /// The listener stays registered until [`remove_listener`](Self::remove_listener)
    /// is called with the returned id.
    pub fn add_listener<F>(&self, name: impl Into<Arc<str>>, callback: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let listener = Arc::new(Listener {
            id,
            name: name.into(),
            active: AtomicBool::new(true),
            callback: Box::new(callback),
        });
        lock(&self.listeners).push(listener);
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    ///
    /// Removing a listener while a dispatch is in progress prevents it from
    /// being invoked for that dispatch if its turn has not come yet.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.listeners);
        match listeners.iter().position(|l| l.id == id) {
            Some(index) => {
                let listener = listeners.remove(index);
                listener.active.store(false, Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// Register `callback` and tie the registration to the returned guard.
    pub fn listen<F>(self: &Arc<Self>, name: impl Into<Arc<str>>, callback: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = self.add_listener(name, callback);
        Subscription {
            id,
            bus: Arc::downgrade(self),
        }
    }

    /// Deliver `event` to every listener registered for its name.
    ///
    /// The set of listeners is fixed when the call starts: listeners added by
    /// a callback wait for the next event. Returns the number of listeners
    /// invoked.
    pub fn dispatch(&self, event: &Event) -> usize {
        let targets: Vec<Arc<Listener>> = lock(&self.listeners)
            .iter()
            .filter(|l| *l.name == *event.name())
            .cloned()
            .collect();
        trace!(
            "dispatching `{}` to {} listener(s)",
            event.name(),
            targets.len()
        );

        let mut delivered = 0;
        for listener in targets {
            if !listener.active.load(Ordering::Acquire) {
                continue;
            }
            (listener.callback)(event);
            delivered += 1;
        }
        delivered
    }

    /// Number of listeners currently registered for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        lock(&self.listeners)
            .iter()
            .filter(|l| &*l.name == name)
            .count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &lock(&self.listeners).len())
            .finish_non_exhaustive()
    }
}

/// RAII guard for a bus listener.
///
/// Dropping the guard removes the listener. If the bus is already gone the
/// drop does nothing.
#[derive(Debug)]
pub struct Subscription {
    id: ListenerId,
    bus: Weak<EventBus>,
}

impl Subscription {
    /// Id of the guarded listener.
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove_listener(self.id);
        }
    }
}
