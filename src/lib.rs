//! # Partyline
//!
//! Shared state for independent UI components, without a central store,
//! prop drilling or a context provider tree.
//!
//! Any number of call sites bind to a value by key. Each binding keeps its own
//! local copy; a write updates the writer's copy immediately and is broadcast
//! synchronously over an event bus to every other binding of the same key.
//!
//! ## Channels
//!
//! - [`bind`] - bind to a shared value by key, returning a read and a write handle
//! - [`Channel`] - a typed handle created once and bound from many call sites
//! - [`SetShared::set`] / [`SetShared::update`] - write a value, or derive it
//!   from the writer's current value
//!
//! ## Building blocks
//!
//! - [`bus::EventBus`] - the synchronous publish/subscribe medium
//! - [`Signal`] / [`Effect`] - reactive local state; an effect reading a
//!   binding re-runs when a broadcast changes it
//! - [`runtime::Runtime`] - the context owning a bus and a reactive graph, with
//!   a process-wide default and isolated scopes for tests
//!
//! ```
//! use partyline::{bind, Effect};
//! use partyline::runtime::Runtime;
//! use std::sync::{Arc, Mutex};
//!
//! Runtime::scope(|| {
//!     let (cart, _) = bind("cart-items", 0u32).unwrap();
//!     let (_editor, set_cart) = bind("cart-items", 0u32).unwrap();
//!
//!     let rendered = Arc::new(Mutex::new(Vec::new()));
//!     let _badge = Effect::new({
//!         let rendered = rendered.clone();
//!         move || rendered.lock().unwrap().push(cart.get())
//!     });
//!
//!     set_cart.update(|n| n + 1);
//!     set_cart.update(|n| n + 1);
//!     assert_eq!(*rendered.lock().unwrap(), vec![0, 1, 2]);
//! });
//! ```

pub mod bus;
pub mod channel;
mod error;
pub mod runtime;
pub mod signal;
mod sync;

// Re-export main types for convenience
pub use channel::{bind, create_channel, Channel, ChannelKey, SetShared, SharedState};
pub use error::{Error, Result};
pub use signal::{create_effect, create_signal, Effect, Signal};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;

    #[test]
    fn it_works() {
        Runtime::scope(|| {
            let (value, set_value) = bind("smoke", 0).unwrap();
            assert_eq!(value.get(), 0);
            set_value.set(42);
            assert_eq!(value.get(), 42);
        });
    }
}
