use super::ChannelKey;
use crate::bus::{Event, Subscription};
use crate::error::Result;
use crate::runtime::{Reconcile, Runtime};
use crate::signal::{Signal, WeakSignal};
use log::{debug, trace, warn};
use std::any::{type_name, Any};
use std::fmt;
use std::sync::{Arc, Weak};

/// Name of the bus event every shared-value write is published as.
pub const SHARED_STATE_CHANGED: &str = "partyline::shared-state-changed";

/// Identifies one mounted binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(usize);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload of a [`SHARED_STATE_CHANGED`] event.
#[derive(Clone)]
pub struct Broadcast {
    key: ChannelKey,
    value: Arc<dyn Any + Send + Sync>,
    origin: Option<SubscriberId>,
}

impl Broadcast {
    /// Key the value was written to.
    pub fn key(&self) -> &ChannelKey {
        &self.key
    }

    /// The written value, if it is a `T`.
    pub fn value<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// The binding that wrote the value, unless it had already unmounted.
    pub fn origin(&self) -> Option<SubscriberId> {
        self.origin
    }
}

impl fmt::Debug for Broadcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcast")
            .field("key", &self.key)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Keeps a binding registered on the bus and its key claimed. Dropping it
/// unmounts the binding.
struct Mount {
    id: SubscriberId,
    key: ChannelKey,
    runtime: Weak<Runtime>,
    _subscription: Subscription,
}

impl Drop for Mount {
    fn drop(&mut self) {
        debug!("unmounting subscriber {} from `{}`", self.id, self.key);
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.release_key(self.key.as_str());
        }
    }
}

/// The read side of a mounted binding.
///
/// Clones share one mount; the binding unmounts when the last clone is
/// dropped. Reads inside an [`Effect`](crate::Effect) make the effect re-run
/// whenever the value changes.
#[derive(Clone)]
pub struct SharedState<T> {
    local: Signal<T>,
    mount: Arc<Mount>,
}

impl<T: Clone + Send + Sync + 'static> SharedState<T> {
    /// The latest value this binding has seen.
    pub fn get(&self) -> T {
        self.local.get()
    }

    /// Read the value with a function without cloning.
    ///
    /// The value stays locked while `f` runs: `f` must not write to this
    /// binding, directly or through a peer on the same key.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.local.with(f)
    }

    /// Key this binding is mounted on.
    pub fn key(&self) -> &ChannelKey {
        &self.mount.key
    }

    /// Id other bindings see as the origin of this binding's writes.
    pub fn id(&self) -> SubscriberId {
        self.mount.id
    }

    /// Drop this handle. The binding unmounts if no other clone is alive.
    pub fn unmount(self) {}
}

impl<T: fmt::Debug> fmt::Debug for SharedState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedState")
            .field("key", &self.mount.key)
            .field("id", &self.mount.id)
            .field("local", &self.local)
            .finish()
    }
}

/// The write side of a binding.
///
/// Every write updates the binding's own value first, then broadcasts the new
/// value to every other binding on the same key. Writes never fail.
#[derive(Clone)]
pub struct SetShared<T> {
    key: ChannelKey,
    id: SubscriberId,
    local: WeakSignal<T>,
    runtime: Weak<Runtime>,
}

impl<T: Clone + Send + Sync + 'static> SetShared<T> {
    /// Replace the value.
    ///
    /// After the binding has unmounted the value is still broadcast to the
    /// other bindings of the key.
    pub fn set(&self, value: T) {
        let origin = self.local.upgrade().map(|local| {
            local.set(value.clone());
            self.id
        });
        self.publish(value, origin);
    }

    /// Compute the next value from this binding's own current value.
    ///
    /// The computed value is what gets broadcast. Once the binding has
    /// unmounted there is no current value to start from, and the call does
    /// nothing. `f` runs on a copy of the value, so it may read or write this
    /// binding; its own writes are then overwritten by the result.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let Some(local) = self.local.upgrade() else {
            debug!(
                "subscriber {} on `{}` is unmounted, dropping update",
                self.id, self.key
            );
            return;
        };
        let prev = local.with_untracked(T::clone);
        let next = f(&prev);
        local.set(next.clone());
        self.publish(next, Some(self.id));
    }

    /// Key this handle writes to.
    pub fn key(&self) -> &ChannelKey {
        &self.key
    }

    fn publish(&self, value: T, origin: Option<SubscriberId>) {
        let Some(runtime) = self.runtime.upgrade() else {
            return;
        };
        let value = Arc::new(value);
        runtime.record_broadcast(self.key.as_str(), Arc::clone(&value));

        let broadcast = Broadcast {
            key: self.key.clone(),
            value,
            origin,
        };
        let delivered = runtime
            .bus()
            .dispatch(&Event::new(SHARED_STATE_CHANGED, broadcast));
        trace!("broadcast on `{}` reached {delivered} listener(s)", self.key);
    }
}

impl<T> fmt::Debug for SetShared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetShared")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Bind to the shared value named `key`.
///
/// Returns this call site's read handle and its write handle. `initial` is
/// shown until the first broadcast on `key` reaches this binding (see
/// [`Reconcile`] for the alternative). The binding stays subscribed until the
/// [`SharedState`] and all its clones are dropped, so bind the read handle to
/// a name even at call sites that only write.
///
/// # Errors
///
/// [`Error::EmptyKey`](crate::Error::EmptyKey) for an empty key,
/// [`Error::TypeMismatch`](crate::Error::TypeMismatch) if the key was already
/// bound with another value type in the current runtime.
///
/// # Examples
///
/// ```
/// use partyline::bind;
/// use partyline::runtime::Runtime;
///
/// Runtime::scope(|| {
///     let (header, _) = bind("user", String::from("guest")).unwrap();
///     let (_mounted, set_user) = bind("user", String::new()).unwrap();
///
///     assert_eq!(header.get(), "guest");
///     set_user.set("ada".to_string());
///     assert_eq!(header.get(), "ada");
/// });
/// ```
pub fn bind<T>(key: &str, initial: T) -> Result<(SharedState<T>, SetShared<T>)>
where
    T: Clone + Send + Sync + 'static,
{
    let key = ChannelKey::new(key)?;
    mount(&Runtime::current(), key, initial)
}

pub(crate) fn mount<T>(
    runtime: &Arc<Runtime>,
    key: ChannelKey,
    initial: T,
) -> Result<(SharedState<T>, SetShared<T>)>
where
    T: Clone + Send + Sync + 'static,
{
    runtime.claim_key::<T>(key.as_str())?;

    let start = match runtime.config().reconcile {
        Reconcile::KeepInitial => initial,
        Reconcile::LatestBroadcast => runtime
            .last_broadcast::<T>(key.as_str())
            .unwrap_or(initial),
    };
    let local = Signal::new_in(runtime, start);
    let id = SubscriberId(runtime.next_id());

    let subscription = runtime.bus().listen(SHARED_STATE_CHANGED, {
        let key = key.clone();
        let local = local.downgrade();
        move |event| {
            let Some(broadcast) = event.detail::<Broadcast>() else {
                return;
            };
            // Own writes are applied locally before they are published.
            if broadcast.key != key || broadcast.origin == Some(id) {
                return;
            }
            let Some(local) = local.upgrade() else {
                return;
            };
            match broadcast.value::<T>() {
                Some(value) => {
                    trace!("subscriber {id} on `{key}` received a broadcast");
                    local.set(value.clone());
                }
                None => warn!(
                    "subscriber {id} on `{key}` ignored a broadcast that is not a `{}`",
                    type_name::<T>()
                ),
            }
        }
    });
    debug!("mounted subscriber {id} on `{key}`");

    let writer = SetShared {
        key: key.clone(),
        id,
        local: local.downgrade(),
        runtime: Arc::downgrade(runtime),
    };
    let reader = SharedState {
        local,
        mount: Arc::new(Mount {
            id,
            key,
            runtime: Arc::downgrade(runtime),
            _subscription: subscription,
        }),
    };
    Ok((reader, writer))
}
